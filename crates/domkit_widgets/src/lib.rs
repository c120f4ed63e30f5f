//! domkit Widgets
//!
//! Widgets built on the domkit binding registry:
//!
//! - [`calendar`] - popup date picker with month and year selectors
//! - [`drag`] - drag-to-move for absolutely positioned elements
//!
//! Every listener a widget installs goes through a
//! [`Registry`](domkit_events::Registry), so an
//! [`Observer`](domkit_events::Observer) on the document reclaims them when
//! the widget's nodes are removed.

pub mod calendar;
pub mod drag;

pub use calendar::{
    CalendarDate, CalendarHandle, CalendarOptions, Calendars, Clock, FixedClock, SystemClock,
    Weekday,
};
pub use drag::Draggable;
