//! Move derived events out of the dead overnight window.

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use tracing::{debug, warn};

use crate::event::{sort_chronologically, Event};
use crate::resolve::{settle, DropReason, DroppedEvent, Resolution};
use crate::rule::{LateNightConfig, Thresholds};

/// Relocate derived events that start after midnight and before
/// `config.end_hour` to `config.reschedule_hour` on the same date.
///
/// Events dated after `voyage_end` are dropped, as are events whose new slot
/// would overlap an anchor. Floor transitions keep their own timing.
/// Rescheduled operational events that land on each other are merged, and
/// identical copies of other events collapse into one.
pub fn reschedule_late_night(
    events: &[Event],
    config: &LateNightConfig,
    voyage_end: Option<NaiveDate>,
    thresholds: &Thresholds,
) -> Resolution {
    let anchors: Vec<Event> = events.iter().filter(|e| e.is_anchor()).cloned().collect();
    let target = NaiveTime::from_hms_opt(config.reschedule_hour, 0, 0).unwrap_or(NaiveTime::MIN);

    let mut kept = Vec::with_capacity(events.len());
    let mut dropped = Vec::new();
    let mut moved_any = false;

    for event in events {
        if !is_candidate(event, config) {
            kept.push(event.clone());
            continue;
        }
        let date = event.date();
        if voyage_end.is_some_and(|end| date > end) {
            warn!(title = %event.title, %date, "late-night event after voyage end dropped");
            dropped.push(DroppedEvent {
                event: event.clone(),
                reason: DropReason::AfterVoyageEnd,
            });
            continue;
        }

        let start = date.and_time(target);
        let end = start + Duration::minutes(event.duration_minutes());
        if anchors.iter().any(|a| a.overlaps_window(start, end)) {
            warn!(title = %event.title, %start, "rescheduled slot overlaps an anchor, dropped");
            dropped.push(DroppedEvent {
                event: event.clone(),
                reason: DropReason::RescheduleConflict,
            });
            continue;
        }

        debug!(title = %event.title, from = %event.start, to = %start, "rescheduled late-night event");
        let mut moved = event.clone();
        moved.start = start;
        moved.end = end;
        kept.push(moved);
        moved_any = true;
    }

    if !moved_any {
        sort_chronologically(&mut kept);
        return Resolution {
            events: kept,
            dropped,
        };
    }

    let (ops, mut rest): (Vec<Event>, Vec<Event>) =
        kept.into_iter().partition(|e| e.is_operational());
    let settled = settle(&anchors, ops, thresholds);
    dropped.extend(settled.dropped);

    sort_chronologically(&mut rest);
    rest.dedup_by(|b, a| {
        let same = a.is_derived
            && b.is_derived
            && a.title == b.title
            && a.start == b.start
            && a.end == b.end
            && a.category == b.category;
        if same {
            debug!(title = %b.title, start = %b.start, "collapsed duplicate rescheduled event");
        }
        same
    });
    rest.extend(settled.events);
    sort_chronologically(&mut rest);
    Resolution {
        events: rest,
        dropped,
    }
}

fn is_candidate(event: &Event, config: &LateNightConfig) -> bool {
    if event.is_anchor() || event.is_floor_transition {
        return false;
    }
    let time = event.start.time();
    time > NaiveTime::MIN && time.hour() < config.end_hour
}
