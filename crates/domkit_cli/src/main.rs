//! domkit CLI
//!
//! Render and inspect domkit widgets from the terminal.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use domkit_core::Document;
use domkit_events::{Observer, Registry};
use domkit_widgets::{CalendarDate, Calendars, Clock, FixedClock, SystemClock};

mod config;
mod render;

use config::{DomkitConfig, CONFIG_FILE};

#[derive(Parser)]
#[command(name = "domkit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "domkit widget toolkit CLI", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./domkit.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a month as rendered by the calendar widget
    Calendar {
        /// Year to display (defaults to the selected date's year)
        #[arg(short, long)]
        year: Option<i32>,

        /// Month to display, 1-12 (defaults to the selected date's month)
        #[arg(short, long)]
        month: Option<u8>,

        /// Selected date, YYYY-MM-DD (defaults to today)
        #[arg(short, long)]
        selected: Option<String>,

        /// Date to treat as today, YYYY-MM-DD
        #[arg(long)]
        today: Option<String>,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Calendar {
            year,
            month,
            selected,
            today,
        } => cmd_calendar(&config, year, month, selected.as_deref(), today.as_deref()),
        Commands::Config => cmd_config(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<DomkitConfig> {
    match path {
        Some(path) => {
            info!("Using configuration {}", path.display());
            DomkitConfig::load(path)
        }
        None => {
            debug!("Looking for {} in the current directory", CONFIG_FILE);
            DomkitConfig::load_from_dir(Path::new("."))
        }
    }
}

fn parse_date(flag: &str, value: &str) -> Result<CalendarDate> {
    CalendarDate::parse_iso(value)
        .with_context(|| format!("Invalid --{flag} '{value}', expected YYYY-MM-DD"))
}

fn cmd_calendar(
    config: &DomkitConfig,
    year: Option<i32>,
    month: Option<u8>,
    selected: Option<&str>,
    today: Option<&str>,
) -> Result<()> {
    if let Some(month) = month {
        if !(1..=12).contains(&month) {
            anyhow::bail!("Invalid --month {}. Expected 1-12", month);
        }
    }
    let today = match today {
        Some(value) => parse_date("today", value)?,
        None => SystemClock.today(),
    };
    let selected = match selected {
        Some(value) => parse_date("selected", value)?,
        None => today,
    };

    let mut doc = Document::new();
    let registry = Registry::new();
    let root = doc.root();
    let observer = Observer::install(&mut doc, &registry, root);

    let calendars =
        Calendars::new(registry.clone(), config.calendar.clone()).with_clock(FixedClock(today));
    let host = doc.create_element("input");
    doc.set_attribute(host, "value", selected.to_string())?;
    doc.append_child(doc.body(), host)?;

    let handle = calendars
        .attach(&doc, host)
        .context("Calendar host was not created")?;
    handle.show(&mut doc, None);
    if year.is_some() || month.is_some() {
        let reference = handle.reference_date();
        handle.navigate(
            &mut doc,
            year.unwrap_or(reference.year()),
            month.unwrap_or(reference.month()),
        );
    }

    let text = render::render_popup(&doc, &handle, &config.calendar.month_names)
        .context("Calendar popup did not open")?;
    print!("{text}");
    debug!(bindings = registry.len(), nodes = doc.len(), "calendar rendered");

    handle.destroy(&mut doc);
    observer.disconnect(&mut doc);
    debug!(bindings = registry.len(), "calendar destroyed");
    Ok(())
}

fn cmd_config(config: &DomkitConfig) -> Result<()> {
    print!("{}", config.to_toml()?);
    Ok(())
}
