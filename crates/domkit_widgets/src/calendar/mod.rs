//! Calendar date picker
//!
//! A popup month grid anchored below a host element. Every host has at most
//! one widget instance; [`Calendars`] owns the side table mapping hosts to
//! their [`CalendarHandle`].
//!
//! Popup structure:
//!
//! ```text
//! div.calendar[data-calendar-host]
//! ├── div.calendar-header
//! │   ├── select.year   > option*
//! │   └── select.month  > option*
//! └── table.days
//!     ├── thead > tr > th*7
//!     └── tbody > tr*6 > td*7     (td.prev | td.day | td.next)
//! ```
//!
//! All listeners are bound through the shared [`Registry`], so removing the
//! popup (or the host) from an observed tree reclaims them.
//!
//! # Example
//!
//! ```rust
//! use domkit_core::{Document, Event};
//! use domkit_events::{Observer, Registry};
//! use domkit_widgets::calendar::{CalendarDate, CalendarOptions, Calendars, FixedClock};
//!
//! let mut doc = Document::new();
//! let registry = Registry::new();
//! let root = doc.root();
//! let _observer = Observer::install(&mut doc, &registry, root);
//!
//! let today = CalendarDate::new(2024, 2, 14).unwrap();
//! let calendars = Calendars::new(registry, CalendarOptions::default())
//!     .with_clock(FixedClock(today));
//!
//! let input = doc.create_element("input");
//! doc.set_attribute(input, "data-calendar", "").unwrap();
//! doc.append_child(doc.body(), input).unwrap();
//! calendars.install(&mut doc, root);
//!
//! doc.dispatch_event(input, Event::new("click"));
//! assert!(calendars.get(input).unwrap().is_open());
//! ```

pub mod date;
pub mod grid;
pub mod options;

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use domkit_core::factory::{create, Attributes};
use domkit_core::query::{closest, Selector};
use domkit_core::style::set_styles;
use domkit_core::{fire, Document, Event, Handler, NodeId};
use domkit_events::Registry;

pub use date::{
    column_of, days_in_month, is_leap_year, CalendarDate, Clock, FixedClock, SystemClock, Weekday,
};
pub use grid::{month_grid, CellKind, GridCell, CELLS, COLUMNS, ROWS};
pub use options::{CalendarOptions, OptionsError};

/// Marks an element as a calendar host for [`Calendars::install`]
pub const HOST_ATTRIBUTE: &str = "data-calendar";

/// Links a popup back to its host
pub const POPUP_HOST_ATTRIBUTE: &str = "data-calendar-host";

/// Carries the day's timestamp on interactive cells
pub const TIMESTAMP_ATTRIBUTE: &str = "data-timestamp";

/// Custom event fired on the host after [`Calendars::select_into_host`] picks a date
pub const SELECT_EVENT: &str = "calendar:select";

type HandleTable = RefCell<FxHashMap<NodeId, CalendarHandle>>;

// =============================================================================
// Shared context
// =============================================================================

#[derive(Clone)]
struct CalendarContext {
    registry: Registry,
    options: Rc<CalendarOptions>,
    /// Weekday labels in column order
    header_labels: Rc<[String]>,
    clock: Rc<dyn Clock>,
    on_select: Handler,
}

// =============================================================================
// Calendars
// =============================================================================

/// Owner of every calendar instance, keyed by host node
#[derive(Clone)]
pub struct Calendars {
    table: Rc<HandleTable>,
    ctx: Rc<CalendarContext>,
}

impl Calendars {
    /// Create an empty side table
    ///
    /// Day cells use [`Calendars::select_into_host`] until another selection
    /// handler is set with [`Calendars::with_on_select`].
    pub fn new(registry: Registry, options: CalendarOptions) -> Self {
        if let Err(err) = options.validate() {
            warn!("calendar options: {err}");
        }
        let table: Rc<HandleTable> = Rc::default();
        let on_select = select_into_host_handler(Rc::downgrade(&table));
        let header_labels = options.header_labels().into();
        Self {
            table,
            ctx: Rc::new(CalendarContext {
                registry,
                options: Rc::new(options),
                header_labels,
                clock: Rc::new(SystemClock),
                on_select,
            }),
        }
    }

    /// Use another source for today's date
    ///
    /// Handles created before this call keep the previous clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        let mut ctx = (*self.ctx).clone();
        ctx.clock = Rc::new(clock);
        self.ctx = Rc::new(ctx);
        self
    }

    /// Use another handler for clicks on day cells
    ///
    /// The cell is the event's current target; [`Calendars::handle_for_cell`]
    /// finds its widget. Handles created before this call keep the previous
    /// handler.
    pub fn with_on_select(mut self, handler: Handler) -> Self {
        let mut ctx = (*self.ctx).clone();
        ctx.on_select = handler;
        self.ctx = Rc::new(ctx);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.ctx.registry
    }

    pub fn options(&self) -> &CalendarOptions {
        &self.ctx.options
    }

    /// The widget of `host`, created on first request
    ///
    /// Repeated requests return the same handle. Returns `None` when `host`
    /// is not a live node. A new widget starts at the date in the host's
    /// `value` attribute, or today.
    pub fn attach(&self, doc: &Document, host: NodeId) -> Option<CalendarHandle> {
        if !doc.contains(host) {
            trace!(?host, "attach skipped: absent host");
            return None;
        }
        if let Some(existing) = self.get(host) {
            return Some(existing);
        }

        let initial = doc
            .attribute(host, "value")
            .and_then(CalendarDate::parse_iso)
            .unwrap_or_else(|| self.ctx.clock.today());
        let handle = CalendarHandle {
            state: Rc::new(RefCell::new(CalendarState {
                host,
                reference: initial,
                selected: initial,
                popup: None,
                destroyed: false,
            })),
            ctx: Rc::clone(&self.ctx),
            table: Rc::downgrade(&self.table),
        };
        self.table.borrow_mut().insert(host, handle.clone());
        debug!(?host, %initial, "calendar attached");
        Some(handle)
    }

    /// The existing widget of `host`, if any
    pub fn get(&self, host: NodeId) -> Option<CalendarHandle> {
        self.table.borrow().get(&host).cloned()
    }

    /// Number of live widgets
    pub fn len(&self) -> usize {
        self.table.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.borrow().is_empty()
    }

    /// Widgets whose popup is currently shown
    pub fn open(&self) -> Vec<CalendarHandle> {
        self.table
            .borrow()
            .values()
            .filter(|h| h.is_open())
            .cloned()
            .collect()
    }

    /// Hide every open popup
    pub fn hide_all(&self, doc: &mut Document) {
        for handle in self.open() {
            handle.hide(doc);
        }
    }

    /// Open the widget of any clicked element carrying [`HOST_ATTRIBUTE`]
    ///
    /// Binds a bubble-phase click listener on `root`, so listeners on the host
    /// and its ancestors see the click first. Widgets are created on the first
    /// click of their host, and opening one hides the others. Returns the
    /// delegated handler.
    pub fn install(&self, doc: &mut Document, root: NodeId) -> Handler {
        let calendars = self.downgrade();
        let selector = Selector::parse(&format!("[{HOST_ATTRIBUTE}]"));
        let handler = Handler::new(move |doc: &mut Document, event: &mut Event| {
            let Some(calendars) = calendars.upgrade() else {
                return;
            };
            let Some(target) = event.target() else {
                return;
            };
            let Some(host) = closest(doc, target, selector.as_ref()) else {
                return;
            };
            for other in calendars.open() {
                if other.host() != host {
                    other.hide(doc);
                }
            }
            if let Some(handle) = calendars.attach(doc, host) {
                handle.show(doc, Some(event));
            }
        });
        self.ctx
            .registry
            .bind(doc, root, "click", handler.clone(), false);
        debug!(?root, "calendar delegation installed");
        handler
    }

    /// The widget owning a day cell (or any node inside its popup)
    pub fn handle_for_cell(&self, doc: &Document, cell: NodeId) -> Option<CalendarHandle> {
        lookup_popup_owner(doc, &self.table, cell)
    }

    /// A selection handler that writes the picked date into the host
    ///
    /// On click of a day cell: hides the popup, selects the date, stores it
    /// as ISO `YYYY-MM-DD` in the host's `value` attribute and fires
    /// [`SELECT_EVENT`] on the host with the same text as detail.
    pub fn select_into_host(&self) -> Handler {
        select_into_host_handler(Rc::downgrade(&self.table))
    }

    fn downgrade(&self) -> WeakCalendars {
        WeakCalendars {
            table: Rc::downgrade(&self.table),
            ctx: Rc::downgrade(&self.ctx),
        }
    }
}

impl std::fmt::Debug for Calendars {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calendars")
            .field("instances", &self.len())
            .finish_non_exhaustive()
    }
}

struct WeakCalendars {
    table: Weak<HandleTable>,
    ctx: Weak<CalendarContext>,
}

impl WeakCalendars {
    fn upgrade(&self) -> Option<Calendars> {
        Some(Calendars {
            table: self.table.upgrade()?,
            ctx: self.ctx.upgrade()?,
        })
    }
}

fn lookup_popup_owner(doc: &Document, table: &HandleTable, node: NodeId) -> Option<CalendarHandle> {
    let host = std::iter::once(node)
        .chain(doc.ancestors(node))
        .find_map(|n| doc.attribute(n, POPUP_HOST_ATTRIBUTE))
        .and_then(|raw| raw.parse::<u64>().ok())
        .map(NodeId::from_raw)?;
    table.borrow().get(&host).cloned()
}

fn cell_date(doc: &Document, cell: NodeId) -> Option<CalendarDate> {
    doc.attribute(cell, TIMESTAMP_ATTRIBUTE)?
        .parse::<i64>()
        .ok()
        .and_then(CalendarDate::from_timestamp_ms)
}

fn select_into_host_handler(table: Weak<HandleTable>) -> Handler {
    Handler::new(move |doc: &mut Document, event: &mut Event| {
        let Some(table) = table.upgrade() else {
            return;
        };
        let Some(cell) = event.current_target() else {
            return;
        };
        let Some(handle) = lookup_popup_owner(doc, &table, cell) else {
            return;
        };
        let Some(date) = cell_date(doc, cell) else {
            warn!(?cell, "day cell without a timestamp");
            return;
        };
        // The popup is about to go away with its own stop-propagation listener
        event.stop_propagation();

        handle.hide(doc);
        handle.select(doc, date);
        let host = handle.host();
        let iso = date.to_string();
        if let Err(err) = doc.set_attribute(host, "value", iso.as_str()) {
            warn!("calendar host: {err}");
            return;
        }
        fire(doc, host, SELECT_EVENT, iso);
    })
}

// =============================================================================
// CalendarHandle
// =============================================================================

struct Popup {
    container: NodeId,
    header: NodeId,
    year_select: NodeId,
    month_select: NodeId,
    grid: NodeId,
    outside_click: Handler,
}

struct CalendarState {
    host: NodeId,
    reference: CalendarDate,
    selected: CalendarDate,
    popup: Option<Popup>,
    destroyed: bool,
}

/// A calendar instance bound to one host
///
/// Clones share the same instance.
#[derive(Clone)]
pub struct CalendarHandle {
    state: Rc<RefCell<CalendarState>>,
    ctx: Rc<CalendarContext>,
    table: Weak<HandleTable>,
}

impl CalendarHandle {
    /// Whether two handles refer to the same instance
    pub fn ptr_eq(&self, other: &CalendarHandle) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub fn host(&self) -> NodeId {
        self.state.borrow().host
    }

    pub fn is_open(&self) -> bool {
        self.state.borrow().popup.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }

    /// Month and year shown by the grid
    pub fn reference_date(&self) -> CalendarDate {
        self.state.borrow().reference
    }

    pub fn selected_date(&self) -> CalendarDate {
        self.state.borrow().selected
    }

    /// Popup root, while open
    pub fn container(&self) -> Option<NodeId> {
        self.state.borrow().popup.as_ref().map(|p| p.container)
    }

    /// Day grid table, while open
    pub fn grid(&self) -> Option<NodeId> {
        self.state.borrow().popup.as_ref().map(|p| p.grid)
    }

    pub fn year_select(&self) -> Option<NodeId> {
        self.state.borrow().popup.as_ref().map(|p| p.year_select)
    }

    pub fn month_select(&self) -> Option<NodeId> {
        self.state.borrow().popup.as_ref().map(|p| p.month_select)
    }

    /// Open the popup below the host
    ///
    /// Stops propagation of the triggering event so the click that opens
    /// the popup does not also count as an outside click. No-op when already
    /// open, destroyed, or when the host is gone.
    pub fn show(&self, doc: &mut Document, event: Option<&mut Event>) {
        if let Some(event) = event {
            event.stop_propagation();
        }
        let host = {
            let state = self.state.borrow();
            if state.destroyed || state.popup.is_some() {
                return;
            }
            state.host
        };
        if !doc.is_connected(host) {
            trace!(?host, "show skipped: host not in document");
            return;
        }
        let registry = &self.ctx.registry;

        let weak = self.downgrade();
        let outside_click = Handler::new(move |doc: &mut Document, _: &mut Event| {
            if let Some(handle) = weak.upgrade() {
                handle.hide(doc);
            }
        });
        let root = doc.root();
        registry.bind(doc, root, "click", outside_click.clone(), false);

        let anchor = doc.bounding_rect(host);
        let top = format!("{}px", anchor.bottom());
        let left = format!("{}px", anchor.left());
        let container = create(
            doc,
            "div",
            Attributes::new()
                .class("calendar")
                .attr(POPUP_HOST_ATTRIBUTE, host.to_raw().to_string()),
        );
        let placement = [("position", "absolute"), ("top", top.as_str()), ("left", left.as_str())];
        if let Err(err) = set_styles(doc, container, placement) {
            warn!("calendar popup style: {err}");
        }
        registry.on(doc, container, "click", |_, event| event.stop_propagation());

        let (header, year_select, month_select) = self.build_header(doc);
        let grid = self.build_grid(doc);
        let attached = doc
            .replace_children(container, &[header, grid])
            .and_then(|_| doc.append_child(doc.body(), container));
        if let Err(err) = attached {
            warn!(?host, "calendar popup not attached: {err}");
            registry.unbind(doc, root, Some("click"), Some(&outside_click));
            for node in [container, header, grid] {
                if doc.contains(node) {
                    let _ = doc.release(node);
                }
            }
            registry.prune(doc);
            return;
        }

        self.state.borrow_mut().popup = Some(Popup {
            container,
            header,
            year_select,
            month_select,
            grid,
            outside_click,
        });
        debug!(?host, "calendar shown");
    }

    /// Close the popup, keeping the selected and reference dates
    pub fn hide(&self, doc: &mut Document) {
        let Some(popup) = self.state.borrow_mut().popup.take() else {
            return;
        };
        let registry = &self.ctx.registry;
        let root = doc.root();
        registry.unbind(doc, root, Some("click"), Some(&popup.outside_click));

        for node in [popup.grid, popup.container] {
            if doc.contains(node) {
                let _ = doc.remove(node);
                let _ = doc.release(node);
            }
        }
        // Without an observer the released cells leave records behind
        registry.prune(doc);
        debug!(host = ?self.host(), "calendar hidden");
    }

    /// Tear the widget down
    ///
    /// Hides the popup, unbinds every listener of the host and forgets the
    /// instance, so the next [`Calendars::attach`] creates a fresh one.
    pub fn destroy(&self, doc: &mut Document) {
        self.hide(doc);
        let host = {
            let mut state = self.state.borrow_mut();
            if state.destroyed {
                return;
            }
            state.destroyed = true;
            state.host
        };
        self.ctx.registry.unbind_all(doc, host);
        if let Some(table) = self.table.upgrade() {
            let mut table = table.borrow_mut();
            if table.get(&host).map_or(false, |h| h.ptr_eq(self)) {
                table.remove(&host);
            }
        }
        debug!(?host, "calendar destroyed");
    }

    /// Select a date and show its month
    pub fn select(&self, doc: &mut Document, date: CalendarDate) {
        {
            let mut state = self.state.borrow_mut();
            state.selected = date;
            state.reference = date;
        }
        trace!(%date, "calendar select");
        self.render(doc);
    }

    /// Show another month, keeping the day (clamped) and the selection
    ///
    /// `month` is 1-12. Only the day grid is rebuilt.
    pub fn navigate(&self, doc: &mut Document, year: i32, month: u8) {
        let next = self.reference_date().with_year_month(year, month);
        let Some(next) = next else {
            warn!(year, month, "calendar navigate: invalid month");
            return;
        };
        self.state.borrow_mut().reference = next;
        self.render_grid(doc);
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Rebuild the header and grid of an open popup
    fn render(&self, doc: &mut Document) {
        let Some(container) = self.container() else {
            return;
        };
        let (header, year_select, month_select) = self.build_header(doc);
        let grid = self.build_grid(doc);
        let old = {
            let mut state = self.state.borrow_mut();
            let Some(popup) = state.popup.as_mut() else {
                return;
            };
            let old = [popup.header, popup.grid];
            popup.header = header;
            popup.year_select = year_select;
            popup.month_select = month_select;
            popup.grid = grid;
            old
        };
        if let Err(err) = doc.replace_children(container, &[header, grid]) {
            warn!("calendar render: {err}");
        }
        for node in old {
            let _ = doc.release(node);
        }
        self.ctx.registry.prune(doc);
    }

    /// Rebuild the day grid of an open popup
    fn render_grid(&self, doc: &mut Document) {
        let Some(container) = self.container() else {
            return;
        };
        let grid = self.build_grid(doc);
        let old = {
            let mut state = self.state.borrow_mut();
            let Some(popup) = state.popup.as_mut() else {
                return;
            };
            std::mem::replace(&mut popup.grid, grid)
        };
        let placed = doc
            .insert_before(container, grid, Some(old))
            .or_else(|_| doc.append_child(container, grid));
        if let Err(err) = placed {
            warn!("calendar grid: {err}");
        }
        let _ = doc.remove(old);
        let _ = doc.release(old);
        self.ctx.registry.prune(doc);
    }

    fn build_header(&self, doc: &mut Document) -> (NodeId, NodeId, NodeId) {
        let header = create(doc, "div", Attributes::new().class("calendar-header"));
        let year_select = self.build_year_select(doc);
        let month_select = self.build_month_select(doc);
        if let Err(err) = doc.replace_children(header, &[year_select, month_select]) {
            warn!("calendar header: {err}");
        }
        (header, year_select, month_select)
    }

    fn build_year_select(&self, doc: &mut Document) -> NodeId {
        let selected = self.selected_date().year();
        let last = self.ctx.clock.today().year();
        let select = create(
            doc,
            "select",
            Attributes::new().class("year").attr("value", selected.to_string()),
        );
        for year in self.ctx.options.epoch_year..=last {
            let option = option(doc, &year.to_string(), &year.to_string(), year == selected);
            let _ = doc.append_child(select, option);
        }

        let weak = self.downgrade();
        self.ctx.registry.on(doc, select, "change", move |doc, event| {
            let Some(handle) = weak.upgrade() else {
                return;
            };
            let Some(select) = event.current_target() else {
                return;
            };
            match doc.attribute(select, "value").map(str::parse::<i32>) {
                Some(Ok(year)) => {
                    let month = handle.reference_date().month();
                    handle.navigate(doc, year, month);
                }
                _ => warn!(?select, "year selector without a numeric value"),
            }
        });
        select
    }

    fn build_month_select(&self, doc: &mut Document) -> NodeId {
        let selected = self.selected_date().month0();
        let select = create(
            doc,
            "select",
            Attributes::new().class("month").attr("value", selected.to_string()),
        );
        for month0 in 0..12u8 {
            let name = self.ctx.options.month_name(month0).to_string();
            let option = option(doc, &month0.to_string(), &name, month0 == selected);
            let _ = doc.append_child(select, option);
        }

        let weak = self.downgrade();
        self.ctx.registry.on(doc, select, "change", move |doc, event| {
            let Some(handle) = weak.upgrade() else {
                return;
            };
            let Some(select) = event.current_target() else {
                return;
            };
            match doc.attribute(select, "value").map(str::parse::<u8>) {
                Some(Ok(month0)) if month0 < 12 => {
                    let year = handle.reference_date().year();
                    handle.navigate(doc, year, month0 + 1);
                }
                _ => warn!(?select, "month selector without a month index"),
            }
        });
        select
    }

    fn build_grid(&self, doc: &mut Document) -> NodeId {
        let (reference, selected) = {
            let state = self.state.borrow();
            (state.reference, state.selected)
        };
        let today = self.ctx.clock.today();
        let cells = month_grid(reference, selected, today, self.ctx.options.first_day_of_week);

        let table = create(doc, "table", Attributes::new().class("days"));
        let thead = doc.create_element("thead");
        let head_row = doc.create_element("tr");
        for label in self.ctx.header_labels.iter() {
            let th = create(doc, "th", Attributes::new().text(label.as_str()));
            let _ = doc.append_child(head_row, th);
        }
        let _ = doc.append_child(thead, head_row);

        let tbody = doc.create_element("tbody");
        for row in cells.chunks(COLUMNS) {
            let tr = doc.create_element("tr");
            for cell in row {
                let td = self.build_cell(doc, cell);
                let _ = doc.append_child(tr, td);
            }
            let _ = doc.append_child(tbody, tr);
        }
        let _ = doc.replace_children(table, &[thead, tbody]);
        table
    }

    fn build_cell(&self, doc: &mut Document, cell: &GridCell) -> NodeId {
        let mut attributes = Attributes::new()
            .class(cell.kind.class())
            .text(cell.day.to_string());
        if cell.today {
            attributes = attributes.class("today");
        }
        if cell.current {
            attributes = attributes.class("current");
        }
        if let Some(date) = cell.date {
            attributes = attributes.attr(TIMESTAMP_ATTRIBUTE, date.timestamp_ms().to_string());
        }
        let td = create(doc, "td", attributes);
        if cell.is_interactive() {
            self.ctx
                .registry
                .bind(doc, td, "click", self.ctx.on_select.clone(), false);
        }
        td
    }

    fn downgrade(&self) -> WeakCalendarHandle {
        WeakCalendarHandle {
            state: Rc::downgrade(&self.state),
            ctx: Rc::downgrade(&self.ctx),
            table: self.table.clone(),
        }
    }
}

impl std::fmt::Debug for CalendarHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("CalendarHandle")
            .field("host", &state.host)
            .field("reference", &state.reference)
            .field("selected", &state.selected)
            .field("open", &state.popup.is_some())
            .finish()
    }
}

/// Handle reference held by the widget's own listeners
struct WeakCalendarHandle {
    state: Weak<RefCell<CalendarState>>,
    ctx: Weak<CalendarContext>,
    table: Weak<HandleTable>,
}

impl WeakCalendarHandle {
    fn upgrade(&self) -> Option<CalendarHandle> {
        Some(CalendarHandle {
            state: self.state.upgrade()?,
            ctx: self.ctx.upgrade()?,
            table: self.table.clone(),
        })
    }
}

fn option(doc: &mut Document, value: &str, label: &str, selected: bool) -> NodeId {
    let mut attributes = Attributes::new().attr("value", value).text(label);
    if selected {
        attributes = attributes.class("current").attr("selected", "selected");
    }
    create(doc, "option", attributes)
}
