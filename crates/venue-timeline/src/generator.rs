//! Derived event generation for one rule kind.
//!
//! Rules are tried in declaration order and the first rule to fire for an
//! anchor claims it: later rules of the same kind, including category
//! catch-alls, skip claimed anchors. Cardinality modifiers are evaluated
//! against the anchors that match the rule, walked chronologically.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::event::{Event, EventKey};
use crate::matcher::matches;
use crate::rule::{AnchorPoint, DerivationRule};

/// Anchors that already carry a derived event of the current kind.
#[derive(Debug, Default, Clone)]
pub struct ClaimSet {
    claimed: HashSet<EventKey>,
}

impl ClaimSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_claimed(&self, event: &Event) -> bool {
        self.claimed.contains(&event.key())
    }

    /// Returns `false` if the event was already claimed.
    pub fn claim(&mut self, event: &Event) -> bool {
        self.claimed.insert(event.key())
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}

/// Generate derived events for `rules` (all of one kind) with a fresh claim set.
pub fn generate(anchors: &[Event], rules: &[DerivationRule]) -> Vec<Event> {
    let mut claims = ClaimSet::new();
    generate_with_claims(anchors, rules, &mut claims)
}

/// Generate derived events, honouring and extending an existing claim set.
///
/// Only real anchors (not derived, not imported from another venue) are
/// considered. Output is in rule order, then anchor order.
pub fn generate_with_claims(
    anchors: &[Event],
    rules: &[DerivationRule],
    claims: &mut ClaimSet,
) -> Vec<Event> {
    let mut timeline: Vec<&Event> = anchors.iter().filter(|e| e.is_real()).collect();
    timeline.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.end.cmp(&b.end))
            .then_with(|| a.title.cmp(&b.title))
    });

    let mut derived = Vec::new();
    for rule in rules {
        let matching: Vec<usize> = (0..timeline.len())
            .filter(|&i| matches(timeline[i], rule))
            .collect();
        let mut fired_dates: HashSet<NaiveDate> = HashSet::new();

        for (pos, &idx) in matching.iter().enumerate() {
            let anchor = timeline[idx];
            if claims.is_claimed(anchor) {
                continue;
            }
            let date = anchor.date();
            let later = &matching[pos + 1..];

            if let Some(min) = rule.min_per_day {
                let on_day = matching
                    .iter()
                    .filter(|&&i| timeline[i].date() == date)
                    .count();
                if on_day < min as usize {
                    continue;
                }
            }
            if rule.first_per_day && fired_dates.contains(&date) {
                continue;
            }
            if rule.last_per_day
                && later.iter().any(|&i| {
                    timeline[i].date() == date && timeline[i].title == anchor.title
                })
            {
                continue;
            }
            if rule.skip_last_per_day && !later.iter().any(|&i| timeline[i].date() == date) {
                continue;
            }
            if let Some(min_gap) = rule.min_gap_minutes {
                if let Some(gap) = neighbour_gap(&timeline, &matching, pos, rule) {
                    if gap < min_gap {
                        debug!(
                            anchor = %anchor.title,
                            gap,
                            min_gap,
                            "gap below threshold, rule skipped"
                        );
                        continue;
                    }
                }
            }
            if rule.skip_if_next_matches {
                if let Some(next) = timeline.get(idx + 1) {
                    if matches(next, rule) {
                        debug!(
                            anchor = %anchor.title,
                            next = %next.title,
                            "next event continues the session, strike omitted"
                        );
                        continue;
                    }
                }
            }

            let event = derive(anchor, rule);
            debug!(
                kind = rule.kind.as_str(),
                anchor = %anchor.title,
                title = %event.title,
                start = %event.start,
                "derived event"
            );
            derived.push(event);
            claims.claim(anchor);
            fired_dates.insert(date);
        }
    }
    derived
}

/// Minutes between the anchor and its nearest qualifying neighbour: the
/// previous one for start-anchored rules, the next one for end-anchored
/// rules. `None` when there is no neighbour on that side.
fn neighbour_gap(
    timeline: &[&Event],
    matching: &[usize],
    pos: usize,
    rule: &DerivationRule,
) -> Option<i64> {
    let idx = matching[pos];
    let anchor = timeline[idx];
    let candidates: Vec<&Event> = if rule.check_all_events {
        match rule.anchor {
            AnchorPoint::Start => timeline[..idx].to_vec(),
            AnchorPoint::End => timeline[idx + 1..].to_vec(),
        }
    } else {
        let range = match rule.anchor {
            AnchorPoint::Start => &matching[..pos],
            AnchorPoint::End => &matching[pos + 1..],
        };
        range.iter().map(|&i| timeline[i]).collect()
    };

    match rule.anchor {
        AnchorPoint::Start => candidates
            .iter()
            .map(|e| e.end)
            .max()
            .map(|prev_end| (anchor.start - prev_end).num_minutes()),
        AnchorPoint::End => candidates
            .iter()
            .map(|e| e.start)
            .min()
            .map(|next_start| (next_start - anchor.end).num_minutes()),
    }
}

fn anchor_time(anchor: &Event, point: AnchorPoint) -> NaiveDateTime {
    match point {
        AnchorPoint::Start => anchor.start,
        AnchorPoint::End => anchor.end,
    }
}

fn derive(anchor: &Event, rule: &DerivationRule) -> Event {
    let start = anchor_time(anchor, rule.anchor) + Duration::minutes(rule.offset_minutes);
    let end = start + Duration::minutes(rule.duration_minutes);
    Event::derived(
        rule.render_title(&anchor.title),
        start,
        end,
        rule.kind.category(),
        anchor,
    )
}
