//! Keep operational events off anchors.
//!
//! Every operational event that overlaps an anchor is moved out of the way:
//! pulled earlier if it started before the anchor it hits, pushed later
//! otherwise, shrinking to fit the free gap. If no gap is long enough the
//! event is dropped and recorded. When a trailing operation of one anchor and
//! a leading operation of the next were both dropped, a single Reset event
//! fills the gap between them.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::event::{sort_chronologically, Category, Event};
use crate::merge::merge_overlapping;
use crate::rule::Thresholds;

/// Why an event is missing from the final timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// No free gap next to the anchor it collided with.
    NoPlacement,
    /// Dropped together with the neighbouring anchor's operation; a Reset
    /// may cover the gap instead.
    MutualOverlap,
    /// Late-night event on a date after the voyage ended.
    AfterVoyageEnd,
    /// Late-night event whose rescheduled slot hits an anchor.
    RescheduleConflict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroppedEvent {
    pub event: Event,
    pub reason: DropReason,
}

/// Output of a stage that may omit events.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Resolution {
    pub events: Vec<Event>,
    pub dropped: Vec<DroppedEvent>,
}

/// Resolve operational/anchor overlaps, synthesize Reset fillers and re-merge.
pub fn resolve_overlaps(events: &[Event], thresholds: &Thresholds) -> Resolution {
    let mut anchors: Vec<Event> = events.iter().filter(|e| e.is_anchor()).cloned().collect();
    sort_chronologically(&mut anchors);
    let mut ops: Vec<Event> = events.iter().filter(|e| e.is_operational()).cloned().collect();
    sort_chronologically(&mut ops);
    let passthrough: Vec<Event> = events
        .iter()
        .filter(|e| !e.is_anchor() && !e.is_operational())
        .cloned()
        .collect();

    let (mut placed, omitted) = place(&anchors, ops, thresholds);

    let (resets, mutual) = synthesize_resets(&anchors, &omitted, thresholds);
    let mut dropped = Vec::with_capacity(omitted.len());
    for (i, event) in omitted.into_iter().enumerate() {
        let reason = if mutual.contains(&i) {
            DropReason::MutualOverlap
        } else {
            DropReason::NoPlacement
        };
        warn!(title = %event.title, start = %event.start, ?reason, "operational event omitted");
        dropped.push(DroppedEvent { event, reason });
    }
    placed.extend(resets);

    let settled = settle(&anchors, placed, thresholds);
    dropped.extend(settled.dropped);

    let mut all = passthrough;
    all.extend(anchors);
    all.extend(settled.events);
    sort_chronologically(&mut all);
    Resolution {
        events: all,
        dropped,
    }
}

/// Merge placed operational events and push any block that grew into an
/// anchor back out, until nothing changes. Blocks that no longer fit are
/// dropped with [`DropReason::NoPlacement`].
///
/// `anchors` are the events the blocks must stay clear of; `ops` must all be
/// operational. Each round either merges at least two events or leaves the
/// set free of anchor overlaps, so the loop ends.
pub(crate) fn settle(
    anchors: &[Event],
    mut ops: Vec<Event>,
    thresholds: &Thresholds,
) -> Resolution {
    let mut dropped = Vec::new();
    loop {
        let merged = merge_overlapping(&ops, thresholds.merge_floor_minutes);
        if !merged
            .iter()
            .any(|op| anchors.iter().any(|a| a.overlaps(op)))
        {
            return Resolution {
                events: merged,
                dropped,
            };
        }
        let (placed, omitted) = place(anchors, merged, thresholds);
        for event in omitted {
            warn!(title = %event.title, start = %event.start, "merged block no longer fits, omitted");
            dropped.push(DroppedEvent {
                event,
                reason: DropReason::NoPlacement,
            });
        }
        ops = placed;
    }
}

/// Keep operations that are clear of anchors, bump the rest, and return
/// `(placed, omitted)`.
fn place(
    anchors: &[Event],
    ops: Vec<Event>,
    thresholds: &Thresholds,
) -> (Vec<Event>, Vec<Event>) {
    let mut placed: Vec<Event> = Vec::new();
    let mut omitted: Vec<Event> = Vec::new();
    for op in ops {
        if !anchors.iter().any(|a| a.overlaps(&op)) {
            placed.push(op);
            continue;
        }
        match bump(&op, anchors, &placed, thresholds) {
            Some(moved) => {
                debug!(
                    title = %op.title,
                    from = %op.start,
                    to = %moved.start,
                    minutes = moved.duration_minutes(),
                    "bumped operational event off anchor"
                );
                placed.push(moved);
            }
            None => omitted.push(op),
        }
    }
    (placed, omitted)
}

/// Try to move `op` clear of the first anchor it overlaps.
fn bump(
    op: &Event,
    anchors: &[Event],
    placed: &[Event],
    thresholds: &Thresholds,
) -> Option<Event> {
    let blocker = anchors.iter().find(|a| a.overlaps(op))?;
    let duration = op.duration_minutes();
    let needed = duration.min(thresholds.min_placement_minutes);

    let (start, end) = if op.start < blocker.start {
        let end = free_end_before(blocker.start, anchors, placed)?;
        let floor = latest_end_before(end, anchors, placed);
        let mut start = end - Duration::minutes(duration);
        if let Some(floor) = floor {
            start = start.max(floor);
        }
        (start, end)
    } else {
        let start = free_start_after(blocker.end, anchors, placed)?;
        let ceiling = earliest_start_after(start, anchors, placed);
        let mut end = start + Duration::minutes(duration);
        if let Some(ceiling) = ceiling {
            end = end.min(ceiling);
        }
        (start, end)
    };

    if (end - start).num_minutes() < needed {
        return None;
    }
    let mut moved = op.clone();
    moved.start = start;
    moved.end = end;
    Some(moved)
}

/// Walk back from `point` past placed operations that touch it. Fails if
/// the time just before is taken by an anchor.
fn free_end_before(
    mut point: NaiveDateTime,
    anchors: &[Event],
    placed: &[Event],
) -> Option<NaiveDateTime> {
    loop {
        if anchors.iter().any(|a| a.start < point && a.end >= point) {
            return None;
        }
        match placed.iter().find(|p| p.start < point && p.end >= point) {
            Some(p) => point = p.start,
            None => return Some(point),
        }
    }
}

/// Walk forward from `point` past placed operations that cover it. Fails if
/// an anchor is running at that moment.
fn free_start_after(
    mut point: NaiveDateTime,
    anchors: &[Event],
    placed: &[Event],
) -> Option<NaiveDateTime> {
    loop {
        if anchors.iter().any(|a| a.start <= point && a.end > point) {
            return None;
        }
        match placed.iter().find(|p| p.start <= point && p.end > point) {
            Some(p) => point = p.end,
            None => return Some(point),
        }
    }
}

fn latest_end_before(
    point: NaiveDateTime,
    anchors: &[Event],
    placed: &[Event],
) -> Option<NaiveDateTime> {
    anchors
        .iter()
        .chain(placed)
        .map(|e| e.end)
        .filter(|&end| end <= point)
        .max()
}

fn earliest_start_after(
    point: NaiveDateTime,
    anchors: &[Event],
    placed: &[Event],
) -> Option<NaiveDateTime> {
    anchors
        .iter()
        .chain(placed)
        .map(|e| e.start)
        .filter(|&start| start >= point)
        .min()
}

/// Reset fillers for consecutive anchors whose trailing and leading
/// operations were both omitted. Returns the fillers and the indices of the
/// omitted events they account for.
fn synthesize_resets(
    anchors: &[Event],
    omitted: &[Event],
    thresholds: &Thresholds,
) -> (Vec<Event>, Vec<usize>) {
    let real: Vec<&Event> = anchors.iter().filter(|a| a.is_real()).collect();
    let mut resets = Vec::new();
    let mut mutual = Vec::new();

    for pair in real.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b.start < a.end {
            continue;
        }
        let trailing: Vec<usize> = (0..omitted.len())
            .filter(|&i| {
                let o = &omitted[i];
                o.has_parent(&a.title)
                    && o.start >= a.start
                    && o.start < b.start
            })
            .collect();
        let leading: Vec<usize> = (0..omitted.len())
            .filter(|&i| {
                let o = &omitted[i];
                o.has_parent(&b.title)
                    && o.start < b.start
                    && o.end > a.start
            })
            .collect();
        if trailing.is_empty() || leading.is_empty() {
            continue;
        }
        mutual.extend(trailing.iter().chain(&leading).copied());

        let gap = (b.start - a.end).num_minutes();
        if gap < thresholds.reset_min_gap_minutes {
            debug!(after = %a.title, before = %b.title, gap, "gap too short for a reset");
            continue;
        }
        let start = a.end;
        let end = start + Duration::minutes(gap.min(thresholds.reset_max_minutes));
        if anchors.iter().any(|x| x.overlaps_window(start, end)) {
            continue;
        }
        let title = if gap <= thresholds.reset_short_gap_minutes {
            format!("Reset for {}", b.title)
        } else {
            format!("Strike {} & Set Up {}", a.title, b.title)
        };
        debug!(title = %title, start = %start, end = %end, "synthesized reset");
        resets.push(Event::derived(title, start, end, Category::Reset, b));
    }

    mutual.sort_unstable();
    mutual.dedup();
    (resets, mutual)
}
