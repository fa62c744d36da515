//! Property-based tests for the pipeline invariants using proptest.
//!
//! These hold for *any* anchor list, not just the hand-built scenarios in the
//! other test files.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use std::collections::HashMap;
use venue_timeline::{
    build_timeline, generate, merge_overlapping, AnchorPoint, Category, DerivationRule, Event,
    FloorRequirement, LateNightConfig, PipelineOptions, RuleKind, TransitionRule, VenueRuleSet,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

const TITLES: [&str; 6] = [
    "Ice Show",
    "Family SHUSH!",
    "Glow Party",
    "Hockey",
    "Trivia",
    "Battle of the Sexes",
];
const CATEGORIES: [&str; 4] = ["show", "game", "party", "activity"];

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, 1)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

/// Anchors spread over two days, in 5-minute steps, each with a unique title.
fn arb_anchors() -> impl Strategy<Value = Vec<Event>> {
    prop::collection::vec((0i64..576, 3i64..36, 0usize..6, 0usize..4), 0..12).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (slot, len, title, category))| {
                let start = base() + Duration::minutes(slot * 5);
                Event::anchor(
                    format!("{} {}", TITLES[title], i),
                    start,
                    start + Duration::minutes(len * 5),
                    CATEGORIES[category],
                    "ice_rink",
                )
            })
            .collect()
    })
}

fn arb_ops() -> impl Strategy<Value = Vec<Event>> {
    let parent = Event::anchor("Parent", base(), base(), "show", "ice_rink");
    prop::collection::vec((0i64..96, 1i64..30, 0usize..3), 0..10).prop_map(move |raw| {
        raw.into_iter()
            .map(|(slot, len, kind)| {
                let (title, category) = match kind {
                    0 => ("Strike Parent", Category::Strike),
                    1 => ("Set Up Parent", Category::Setup),
                    _ => ("Set Floor", Category::Transition),
                };
                let start = base() + Duration::minutes(slot * 5);
                Event::derived(
                    title,
                    start,
                    start + Duration::minutes(len * 5),
                    category,
                    &parent,
                )
            })
            .collect()
    })
}

fn rules() -> VenueRuleSet {
    VenueRuleSet::new("ice_rink")
        .with_rule(
            DerivationRule::new(RuleKind::Doors, AnchorPoint::Start, -45, 15, "Doors")
                .with_categories(["show"]),
        )
        .with_rule(
            DerivationRule::new(
                RuleKind::Setup,
                AnchorPoint::Start,
                -60,
                60,
                "Set Up {parent_title}",
            )
            .with_categories(["show", "game", "party"]),
        )
        .with_rule(
            DerivationRule::new(
                RuleKind::Strike,
                AnchorPoint::End,
                0,
                45,
                "Strike Ice for {parent_title}",
            )
            .with_titles(["ice show"]),
        )
        .with_rule(
            DerivationRule::new(
                RuleKind::Strike,
                AnchorPoint::End,
                0,
                30,
                "Strike {parent_title}",
            )
            .with_categories(["show", "game", "party"]),
        )
        .with_rule(
            DerivationRule::new(
                RuleKind::Preset,
                AnchorPoint::Start,
                -20,
                20,
                "Preset {parent_title}",
            )
            .with_titles(["hockey"]),
        )
        .with_resource_states(
            FloorRequirement {
                ice_titles: vec!["ice show".into(), "hockey".into()],
                floor_titles: vec!["party".into(), "shush".into()],
            },
            TransitionRule {
                duration_minutes: 90,
                ..TransitionRule::default()
            },
        )
        .with_late_night(LateNightConfig::default())
}

fn options() -> PipelineOptions {
    PipelineOptions {
        voyage_end: NaiveDate::from_ymd_opt(2026, 3, 2),
    }
}

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Property 1: No operational event overlaps an anchor
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn no_operational_event_overlaps_an_anchor(anchors in arb_anchors()) {
        let timeline = build_timeline(&anchors, &rules(), &options()).unwrap();
        for op in timeline.events.iter().filter(|e| e.is_operational()) {
            for a in timeline.events.iter().filter(|e| e.is_anchor()) {
                prop_assert!(
                    !op.overlaps(a),
                    "{} [{} - {}] overlaps {} [{} - {}]",
                    op.title, op.start, op.end, a.title, a.start, a.end
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 2: Anchors pass through untouched
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn anchors_are_preserved(anchors in arb_anchors()) {
        let timeline = build_timeline(&anchors, &rules(), &options()).unwrap();
        for a in &anchors {
            prop_assert!(timeline.events.contains(a), "anchor {} missing or moved", a.title);
        }
        let anchor_count = timeline.events.iter().filter(|e| e.is_anchor()).count();
        prop_assert_eq!(anchor_count, anchors.len());
    }
}

// ---------------------------------------------------------------------------
// Property 3: Output is deterministic and independent of input order
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn output_is_deterministic(anchors in arb_anchors()) {
        let mut reversed = anchors.clone();
        reversed.reverse();
        let a = build_timeline(&anchors, &rules(), &options()).unwrap();
        let b = build_timeline(&anchors, &rules(), &options()).unwrap();
        let c = build_timeline(&reversed, &rules(), &options()).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(&a, &c);
    }
}

// ---------------------------------------------------------------------------
// Property 4: At most one derived event per anchor per rule kind
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn single_claim_per_kind(anchors in arb_anchors()) {
        let set = rules();
        for kind in RuleKind::ALL {
            let derived = generate(&anchors, set.rules_for(kind));
            let mut per_parent: HashMap<String, usize> = HashMap::new();
            for e in &derived {
                *per_parent.entry(e.parent_title.clone().unwrap()).or_default() += 1;
            }
            for (parent, count) in per_parent {
                prop_assert!(count <= 1, "{} has {} {:?} events", parent, count, kind);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Property 5: Merging is idempotent and leaves no overlaps
// ---------------------------------------------------------------------------
proptest! {
    #![proptest_config(config())]

    #[test]
    fn merge_is_idempotent(ops in arb_ops()) {
        let once = merge_overlapping(&ops, 60);
        let twice = merge_overlapping(&once, 60);
        prop_assert_eq!(&once, &twice);
        for w in once.windows(2) {
            prop_assert!(!w[0].overlaps(&w[1]));
        }
    }
}
