//! End-to-end timeline construction for one venue-day block.
//!
//! anchors → derived events → resource transitions → merge → resolve →
//! late-night pass → sorted timeline. Each stage takes its inputs by
//! reference and returns a new collection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{RuleBook, VenueRuleSet};
use crate::error::{Result, TimelineError};
use crate::event::{sort_chronologically, Event};
use crate::generator::generate;
use crate::late_night::reschedule_late_night;
use crate::merge::merge_overlapping;
use crate::resolve::{resolve_overlaps, DroppedEvent};
use crate::resource::generate_transitions;
use crate::rule::RuleKind;

/// Per-run options that are not part of a venue's rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipelineOptions {
    /// Last calendar date of the voyage. Late-night events dated after it
    /// are dropped instead of rescheduled.
    pub voyage_end: Option<NaiveDate>,
}

/// Final timeline plus everything that had to be omitted along the way.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Timeline {
    pub events: Vec<Event>,
    pub dropped: Vec<DroppedEvent>,
}

/// One independent unit of work for [`build_timelines`].
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub venue: String,
    pub events: Vec<Event>,
    pub options: PipelineOptions,
}

/// Build the operational timeline for a set of anchors.
///
/// # Errors
/// Returns `TimelineError::Config` if `rules` fails validation and
/// `TimelineError::InvalidEvent` if an input event ends before it starts.
/// Placement failures are not errors; they are reported in
/// [`Timeline::dropped`].
pub fn build_timeline(
    anchors: &[Event],
    rules: &VenueRuleSet,
    options: &PipelineOptions,
) -> Result<Timeline> {
    rules.validate()?;
    for event in anchors {
        if event.end < event.start {
            return Err(TimelineError::InvalidEvent {
                title: event.title.clone(),
                message: format!("ends at {} before it starts at {}", event.end, event.start),
            });
        }
    }

    let thresholds = &rules.thresholds;
    let mut all: Vec<Event> = anchors.to_vec();

    for kind in RuleKind::ALL {
        let derived = generate(anchors, rules.rules_for(kind));
        debug!(kind = kind.as_str(), count = derived.len(), "generated derived events");
        all.extend(derived);
    }

    if let Some(transition) = &rules.transition {
        let classifier = rules.classifier();
        let transitions = generate_transitions(anchors, classifier.as_ref(), transition, thresholds);
        debug!(count = transitions.len(), "generated resource transitions");
        all.extend(transitions);
    }

    let merged = merge_overlapping(&all, thresholds.merge_floor_minutes);
    let resolved = resolve_overlaps(&merged, thresholds);
    let mut dropped = resolved.dropped;
    let mut events = resolved.events;

    if let Some(late_night) = &rules.late_night {
        let pass = reschedule_late_night(
            &events,
            late_night,
            options.voyage_end,
            thresholds,
        );
        events = pass.events;
        dropped.extend(pass.dropped);
    }

    sort_chronologically(&mut events);
    info!(
        venue = %rules.venue,
        anchors = anchors.len(),
        events = events.len(),
        dropped = dropped.len(),
        "timeline built"
    );
    Ok(Timeline { events, dropped })
}

/// Build timelines for independent batches against one rule book.
///
/// Batches share nothing but the read-only rule book, so callers may also
/// fan them out across threads.
pub fn build_timelines(book: &RuleBook, batches: &[Batch]) -> Result<Vec<Timeline>> {
    batches
        .iter()
        .map(|batch| build_timeline(&batch.events, book.venue(&batch.venue)?, &batch.options))
        .collect()
}
