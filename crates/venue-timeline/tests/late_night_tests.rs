//! Tests for the overnight dead-window pass.

use chrono::{NaiveDate, NaiveDateTime};
use venue_timeline::{
    reschedule_late_night, Category, DropReason, Event, LateNightConfig, Thresholds,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
}

fn at(day: u32, hour: u32, min: u32) -> NaiveDateTime {
    date(day).and_hms_opt(hour, min, 0).unwrap()
}

fn party() -> Event {
    Event::anchor("Glow Party", at(1, 22, 0), at(2, 0, 15), "party", "v")
}

fn strike(title: &str, start: NaiveDateTime, end: NaiveDateTime) -> Event {
    Event::derived(title, start, end, Category::Strike, &party())
}

fn config() -> LateNightConfig {
    LateNightConfig {
        end_hour: 6,
        reschedule_hour: 9,
    }
}

// ── Rescheduling ────────────────────────────────────────────────────────────

#[test]
fn after_midnight_strike_moves_to_morning() {
    let events = vec![party(), strike("Strike Glow Party", at(2, 0, 30), at(2, 1, 0))];

    let r = reschedule_late_night(&events, &config(), Some(date(2)), &Thresholds::default());

    assert!(r.dropped.is_empty());
    let moved = r.events.iter().find(|e| e.is_derived).unwrap();
    assert_eq!(moved.start, at(2, 9, 0));
    assert_eq!(moved.end, at(2, 9, 30), "duration preserved");
}

#[test]
fn morning_anchor_conflict_drops_instead() {
    let events = vec![
        party(),
        strike("Strike Glow Party", at(2, 0, 30), at(2, 1, 0)),
        Event::anchor("Breakfast Skate", at(2, 9, 0), at(2, 10, 0), "activity", "v"),
    ];

    let r = reschedule_late_night(&events, &config(), Some(date(2)), &Thresholds::default());

    assert_eq!(r.dropped.len(), 1);
    assert_eq!(r.dropped[0].reason, DropReason::RescheduleConflict);
    assert!(r.events.iter().all(|e| e.is_anchor()));
}

#[test]
fn after_voyage_end_is_dropped() {
    let events = vec![party(), strike("Strike Glow Party", at(2, 0, 30), at(2, 1, 0))];

    let r = reschedule_late_night(&events, &config(), Some(date(1)), &Thresholds::default());

    assert_eq!(r.dropped.len(), 1);
    assert_eq!(r.dropped[0].reason, DropReason::AfterVoyageEnd);
}

#[test]
fn without_voyage_end_everything_is_rescheduled() {
    let events = vec![party(), strike("Strike Glow Party", at(2, 0, 30), at(2, 1, 0))];
    let r = reschedule_late_night(&events, &config(), None, &Thresholds::default());
    assert!(r.dropped.is_empty());
}

// ── Exemptions ──────────────────────────────────────────────────────────────

#[test]
fn exactly_midnight_and_daytime_are_untouched() {
    let events = vec![
        party(),
        strike("At Midnight", at(2, 0, 0), at(2, 0, 30)),
        strike("After Window", at(2, 6, 0), at(2, 6, 30)),
    ];

    let r = reschedule_late_night(&events, &config(), Some(date(2)), &Thresholds::default());

    assert_eq!(r.events.len(), 3);
    assert!(r.events.iter().any(|e| e.start == at(2, 0, 0)));
    assert!(r.events.iter().any(|e| e.start == at(2, 6, 0)));
}

#[test]
fn floor_transitions_and_anchors_are_exempt() {
    let mut transition = Event::derived("Set Ice", at(2, 1, 0), at(2, 3, 0), Category::Transition, &party());
    transition.is_floor_transition = true;
    let late_anchor = Event::anchor("Silent Disco", at(2, 1, 0), at(2, 2, 0), "party", "v");
    let events = vec![party(), transition.clone(), late_anchor.clone()];

    let r = reschedule_late_night(&events, &config(), Some(date(1)), &Thresholds::default());

    assert!(r.dropped.is_empty());
    assert!(r.events.contains(&transition));
    assert!(r.events.contains(&late_anchor));
}

#[test]
fn events_landing_on_same_slot_are_merged() {
    let events = vec![
        party(),
        strike("Strike Glow Party", at(2, 0, 30), at(2, 1, 0)),
        strike("Strike Foam Party", at(2, 2, 0), at(2, 2, 30)),
    ];

    let r = reschedule_late_night(&events, &config(), Some(date(2)), &Thresholds::default());

    let ops: Vec<_> = r.events.iter().filter(|e| e.is_operational()).collect();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].start, at(2, 9, 0));
    assert_eq!(ops[0].end, at(2, 10, 0));
    assert_eq!(ops[0].title, "Strike Foam Party & Strike Glow Party");
}

#[test]
fn identical_doors_landing_on_same_slot_collapse() {
    let events = vec![
        party(),
        Event::derived("Doors", at(2, 1, 0), at(2, 1, 15), Category::Doors, &party()),
        Event::derived("Doors", at(2, 2, 0), at(2, 2, 15), Category::Doors, &party()),
    ];

    let r = reschedule_late_night(&events, &config(), Some(date(2)), &Thresholds::default());

    let doors: Vec<_> = r.events.iter().filter(|e| e.title == "Doors").collect();
    assert_eq!(doors.len(), 1);
    assert_eq!(doors[0].start, at(2, 9, 0));
    assert!(r.dropped.is_empty());
}

#[test]
fn merged_morning_block_stays_off_anchors() {
    // Both strikes fit at 09:00 on their own, but the merged one-hour block
    // would run into the 09:45 anchor, so it is pulled earlier.
    let events = vec![
        party(),
        strike("Strike Glow Party", at(2, 0, 30), at(2, 1, 0)),
        strike("Strike Foam Party", at(2, 2, 0), at(2, 2, 30)),
        Event::anchor("Breakfast Skate", at(2, 9, 45), at(2, 11, 0), "activity", "v"),
    ];

    let r = reschedule_late_night(&events, &config(), Some(date(2)), &Thresholds::default());

    for op in r.events.iter().filter(|e| e.is_operational()) {
        for a in r.events.iter().filter(|e| e.is_anchor()) {
            assert!(!op.overlaps(a), "{} overlaps {}", op.title, a.title);
        }
    }
    let ops: Vec<_> = r.events.iter().filter(|e| e.is_operational()).collect();
    assert_eq!(ops.len(), 1);
    assert_eq!(ops[0].start, at(2, 8, 45));
    assert_eq!(ops[0].end, at(2, 9, 45));
    assert!(r.dropped.is_empty());
}
