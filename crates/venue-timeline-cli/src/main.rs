//! `venue-timeline` CLI: build operational timelines from the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Build the timeline for one venue (JSON on stdout)
//! venue-timeline build --rules rules.json --events anchors.json --venue ice_rink
//!
//! # Drop late-night work dated after the last day of the voyage
//! venue-timeline build --rules rules.json --events anchors.json \
//!     --venue ice_rink --voyage-end 2026-03-07 -o timeline.json
//!
//! # Validate a rule book and list rule counts per venue
//! venue-timeline check --rules rules.json
//! ```

mod logging;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use venue_timeline::{build_timeline, Event, PipelineOptions, RuleBook, RuleKind};

#[derive(Parser)]
#[command(
    name = "venue-timeline",
    version,
    about = "Derive and resolve operational events around venue schedules"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log pipeline decisions to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the operational timeline for one venue
    Build {
        /// Rule book JSON file
        #[arg(long)]
        rules: String,
        /// Anchor events JSON file (an array of events)
        #[arg(long)]
        events: String,
        /// Venue code to look up in the rule book
        #[arg(long)]
        venue: String,
        /// Last date of the voyage (YYYY-MM-DD)
        #[arg(long)]
        voyage_end: Option<NaiveDate>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Validate a rule book and print a per-venue summary
    Check {
        /// Rule book JSON file
        #[arg(long)]
        rules: String,
    },
}

#[derive(Serialize)]
struct VenueSummary {
    rules: BTreeMap<RuleKind, usize>,
    resource_states: bool,
    late_night: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Build {
            rules,
            events,
            venue,
            voyage_end,
            output,
        } => {
            let book = load_rule_book(&rules)?;
            let set = book
                .venue(&venue)
                .with_context(|| format!("Rule book {} has no venue '{}'", rules, venue))?;
            let anchors = load_events(&events, &venue)?;

            let options = PipelineOptions { voyage_end };
            let timeline = build_timeline(&anchors, set, &options)
                .with_context(|| format!("Failed to build timeline for venue '{}'", venue))?;

            let json = serde_json::to_string_pretty(&timeline)?;
            write_output(output.as_deref(), &json)?;
        }
        Commands::Check { rules } => {
            let book = load_rule_book(&rules)?;
            let summary: BTreeMap<&str, VenueSummary> = book
                .venues()
                .map(|set| {
                    let counts = RuleKind::ALL
                        .iter()
                        .map(|&kind| (kind, set.rules_for(kind).len()))
                        .filter(|&(_, n)| n > 0)
                        .collect();
                    (
                        set.venue.as_str(),
                        VenueSummary {
                            rules: counts,
                            resource_states: set.transition.is_some(),
                            late_night: set.late_night.is_some(),
                        },
                    )
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn load_rule_book(path: &str) -> Result<RuleBook> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))?;
    RuleBook::from_json(&json).with_context(|| format!("Invalid rule book: {}", path))
}

/// Read anchors for `venue`. Events without a venue are taken to belong to
/// it; events from any other venue only block time.
fn load_events(path: &str, venue: &str) -> Result<Vec<Event>> {
    let json =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))?;
    let mut events: Vec<Event> = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse events from {}", path))?;
    for event in &mut events {
        if event.venue.is_empty() {
            event.venue = venue.to_string();
        } else if event.venue != venue {
            event.is_cross_venue = true;
        }
    }
    debug!(path, count = events.len(), "loaded events");
    Ok(events)
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
