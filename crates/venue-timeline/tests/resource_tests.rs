//! Tests for resource-state classification and transition synthesis.

use chrono::{NaiveDate, NaiveDateTime};
use venue_timeline::{
    generate_transitions, Event, FloorRequirement, NoResourceState, ResourceClassifier,
    ResourceState, Thresholds, TitleClassifier, TransitionRule,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, day)
        .unwrap()
        .and_hms_opt(hour, min, 0)
        .unwrap()
}

fn anchor(title: &str, start: NaiveDateTime, end: NaiveDateTime) -> Event {
    Event::anchor(title, start, end, "show", "studio_b")
}

fn classifier() -> TitleClassifier {
    TitleClassifier::new(&FloorRequirement {
        ice_titles: vec!["ice".to_string(), "skate".to_string()],
        floor_titles: vec!["party".to_string(), "shush".to_string()],
    })
}

fn rule() -> TransitionRule {
    TransitionRule {
        duration_minutes: 60,
        ..TransitionRule::default()
    }
}

// ── Classification ──────────────────────────────────────────────────────────

#[test]
fn title_classifier_assigns_states() {
    let c = classifier();
    assert_eq!(
        c.classify(&anchor("Ice Show", at(1, 19, 0), at(1, 20, 0))),
        Some(ResourceState::Ice)
    );
    assert_eq!(
        c.classify(&anchor("Glow PARTY", at(1, 22, 0), at(1, 23, 0))),
        Some(ResourceState::Floor)
    );
    assert_eq!(
        c.classify(&anchor("Trivia", at(1, 15, 0), at(1, 16, 0))),
        None
    );
}

#[test]
fn no_resource_state_is_always_indifferent() {
    assert_eq!(
        NoResourceState.classify(&anchor("Ice Show", at(1, 19, 0), at(1, 20, 0))),
        None
    );
}

// ── Transitions ─────────────────────────────────────────────────────────────

#[test]
fn state_change_places_transition_after_previous_anchor() {
    let anchors = vec![
        anchor("Ice Show", at(1, 19, 0), at(1, 20, 0)),
        anchor("Trivia", at(1, 20, 30), at(1, 21, 0)),
        anchor("Glow Party", at(1, 22, 30), at(1, 23, 30)),
    ];

    let t = generate_transitions(&anchors, &classifier(), &rule(), &Thresholds::default());

    assert_eq!(t.len(), 1);
    assert_eq!(t[0].title, "Set Floor");
    assert_eq!(t[0].start, at(1, 20, 0), "anchored to the end of Ice Show");
    assert_eq!(t[0].end, at(1, 21, 0));
    assert!(t[0].is_floor_transition);
    assert_eq!(t[0].parent_title.as_deref(), Some("Glow Party"));
}

#[test]
fn same_state_needs_no_transition() {
    let anchors = vec![
        anchor("Ice Show", at(1, 15, 0), at(1, 16, 0)),
        anchor("Ice Skating", at(1, 18, 0), at(1, 20, 0)),
    ];
    let t = generate_transitions(&anchors, &classifier(), &rule(), &Thresholds::default());
    assert!(t.is_empty());
}

#[test]
fn every_direction_change_gets_a_transition() {
    let anchors = vec![
        anchor("Ice Show", at(1, 13, 0), at(1, 14, 0)),
        anchor("Family SHUSH!", at(1, 16, 0), at(1, 17, 0)),
        anchor("Ice Skating", at(1, 19, 0), at(1, 20, 0)),
    ];
    let t = generate_transitions(&anchors, &classifier(), &rule(), &Thresholds::default());
    let titles: Vec<_> = t.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["Set Floor", "Set Ice"]);
    assert_eq!(t[1].start, at(1, 17, 0));
}

#[test]
fn after_midnight_defaults_to_morning_hour() {
    let anchors = vec![
        anchor("Glow Party", at(1, 23, 0), at(2, 1, 0)),
        anchor("Ice Show", at(2, 19, 0), at(2, 20, 0)),
    ];
    let t = generate_transitions(&anchors, &classifier(), &rule(), &Thresholds::default());
    assert_eq!(t.len(), 1);
    assert_eq!(t[0].title, "Set Ice");
    assert_eq!(t[0].start, at(2, 9, 0));
}

#[test]
fn after_midnight_prefers_early_next_anchor() {
    let anchors = vec![
        anchor("Glow Party", at(1, 23, 0), at(2, 1, 0)),
        anchor("Ice Skating", at(2, 8, 0), at(2, 10, 0)),
    ];
    let t = generate_transitions(&anchors, &classifier(), &rule(), &Thresholds::default());
    assert_eq!(t.len(), 1);
    assert_eq!(t[0].start, at(2, 7, 0), "finishes as the next anchor starts");
    assert_eq!(t[0].end, at(2, 8, 0));
}

#[test]
fn ending_exactly_at_midnight_is_not_deferred() {
    let anchors = vec![
        anchor("Glow Party", at(1, 22, 0), at(2, 0, 0)),
        anchor("Ice Show", at(2, 19, 0), at(2, 20, 0)),
    ];
    let t = generate_transitions(&anchors, &classifier(), &rule(), &Thresholds::default());
    assert_eq!(t[0].start, at(2, 0, 0));
}

#[test]
fn cross_venue_anchors_do_not_drive_state() {
    let mut imported = anchor("Imported Party", at(1, 16, 0), at(1, 17, 0));
    imported.is_cross_venue = true;
    let anchors = vec![
        anchor("Ice Show", at(1, 13, 0), at(1, 14, 0)),
        imported,
        anchor("Ice Skating", at(1, 19, 0), at(1, 20, 0)),
    ];
    let t = generate_transitions(&anchors, &classifier(), &rule(), &Thresholds::default());
    assert!(t.is_empty());
}
