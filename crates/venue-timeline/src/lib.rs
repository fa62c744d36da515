//! # venue-timeline
//!
//! Rule-driven operational timeline generation for venue schedules.
//!
//! Given the anchor events of a venue (shows, games, parties) and a declarative
//! rule set, the engine derives the operational events around them (doors,
//! set-ups, strikes, warm-ups, presets, ice-makes, tech runs and resource
//! transitions), then merges and resolves them so that nothing operational
//! ever overlaps an anchor. Anchor times are never changed.
//!
//! ## Modules
//!
//! - [`event`]: The `Event` record and `Category`
//! - [`rule`]: Typed derivation, transition and threshold rules
//! - [`config`]: JSON rule book loading and validation
//! - [`matcher`]: Rule match criteria
//! - [`generator`]: Per-kind derived event generation with first-match claims
//! - [`resource`]: Resource-state classifiers and transition synthesis
//! - [`merge`]: Overlapping operational event merging
//! - [`resolve`]: Anchor overlap resolution and Reset synthesis
//! - [`late_night`]: Overnight dead-window rescheduling
//! - [`pipeline`]: The full pipeline
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod event;
pub mod generator;
pub mod late_night;
pub mod matcher;
pub mod merge;
pub mod pipeline;
pub mod resolve;
pub mod resource;
pub mod rule;

pub use config::{ClassifierKind, RuleBook, VenueRuleSet};
pub use error::TimelineError;
pub use event::{Category, Event, EventKey, MergedPart};
pub use generator::{generate, generate_with_claims, ClaimSet};
pub use late_night::reschedule_late_night;
pub use matcher::matches;
pub use merge::merge_overlapping;
pub use pipeline::{build_timeline, build_timelines, Batch, PipelineOptions, Timeline};
pub use resolve::{resolve_overlaps, DropReason, DroppedEvent, Resolution};
pub use resource::{
    generate_transitions, NoResourceState, ResourceClassifier, ResourceState, TitleClassifier,
};
pub use rule::{
    AnchorPoint, DerivationRule, FloorRequirement, LateNightConfig, RuleKind, Thresholds,
    TransitionRule,
};
