//! Resource-state classification and transition synthesis.
//!
//! Some venues switch between physical configurations (an ice surface or a
//! covered floor). Each anchor may require one of the two states or be
//! indifferent. Whenever consecutive state-caring anchors disagree, a
//! transition event is placed after the earlier one.

use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::{sort_chronologically, Event};
use crate::rule::{FloorRequirement, Thresholds, TransitionRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceState {
    Ice,
    Floor,
}

/// Per-venue capability deciding which state an anchor requires.
pub trait ResourceClassifier {
    /// `None` means the anchor works in either state.
    fn classify(&self, event: &Event) -> Option<ResourceState>;
}

/// Venues with a single configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResourceState;

impl ResourceClassifier for NoResourceState {
    fn classify(&self, _event: &Event) -> Option<ResourceState> {
        None
    }
}

/// Case-insensitive title substring classifier. Ice titles are checked first.
#[derive(Debug, Clone)]
pub struct TitleClassifier {
    ice: Vec<String>,
    floor: Vec<String>,
}

impl TitleClassifier {
    pub fn new(requirement: &FloorRequirement) -> Self {
        Self {
            ice: requirement.ice_titles.iter().map(|s| s.to_lowercase()).collect(),
            floor: requirement
                .floor_titles
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
        }
    }
}

impl ResourceClassifier for TitleClassifier {
    fn classify(&self, event: &Event) -> Option<ResourceState> {
        let title = event.title.to_lowercase();
        if self.ice.iter().any(|t| title.contains(t.as_str())) {
            Some(ResourceState::Ice)
        } else if self.floor.iter().any(|t| title.contains(t.as_str())) {
            Some(ResourceState::Floor)
        } else {
            None
        }
    }
}

/// Walk real anchors chronologically and emit a transition wherever the
/// required state changes.
pub fn generate_transitions(
    anchors: &[Event],
    classifier: &dyn ResourceClassifier,
    rule: &TransitionRule,
    thresholds: &Thresholds,
) -> Vec<Event> {
    let mut timeline: Vec<Event> = anchors.iter().filter(|e| e.is_real()).cloned().collect();
    sort_chronologically(&mut timeline);

    let mut transitions = Vec::new();
    let mut current: Option<(ResourceState, &Event)> = None;

    for anchor in &timeline {
        let Some(state) = classifier.classify(anchor) else {
            continue;
        };
        if let Some((prev_state, prev)) = current {
            if prev_state != state {
                let start = transition_start(prev, anchor, rule, thresholds);
                let title = match state {
                    ResourceState::Ice => &rule.to_ice_title,
                    ResourceState::Floor => &rule.to_floor_title,
                };
                let mut event = Event::derived(
                    title.clone(),
                    start,
                    start + Duration::minutes(rule.duration_minutes),
                    rule.category.clone(),
                    anchor,
                );
                event.is_floor_transition = true;
                debug!(
                    from = ?prev_state,
                    to = ?state,
                    after = %prev.title,
                    before = %anchor.title,
                    start = %start,
                    "resource transition"
                );
                transitions.push(event);
            }
        }
        current = Some((state, anchor));
    }
    transitions
}

/// Transitions normally start when the previous state-caring anchor ends.
/// If that is in the early hours, nobody is on shift: use the slot right
/// before the next anchor when it starts before the cutoff hour, otherwise
/// the default morning hour.
fn transition_start(
    prev: &Event,
    next: &Event,
    rule: &TransitionRule,
    thresholds: &Thresholds,
) -> NaiveDateTime {
    let end_time = prev.end.time();
    let overnight =
        end_time > NaiveTime::MIN && end_time.hour() < thresholds.transition_default_hour;
    if !overnight {
        return prev.end;
    }

    let day = prev.end.date();
    if next.start.date() == day && next.start.hour() < thresholds.transition_cutoff_hour {
        let before_next = next.start - Duration::minutes(rule.duration_minutes);
        return before_next.max(prev.end);
    }

    let morning = day.and_time(
        NaiveTime::from_hms_opt(thresholds.transition_default_hour, 0, 0)
            .unwrap_or(NaiveTime::MIN),
    );
    debug!(
        after = %prev.title,
        default = %morning,
        "no anchor forces an overnight transition slot, using default hour"
    );
    morning
}
