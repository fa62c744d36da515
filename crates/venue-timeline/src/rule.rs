//! Validated, strongly typed rule definitions.
//!
//! These are produced from the raw JSON shapes in [`crate::config`]; every
//! field that the generator relies on is guaranteed present.

use serde::{Deserialize, Serialize};

use crate::event::Category;

/// The kinds of derived event a venue can declare rules for, in the order
/// the pipeline generates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Doors,
    Setup,
    Strike,
    WarmUp,
    Preset,
    IceMake,
    TechRun,
}

impl RuleKind {
    pub const ALL: [RuleKind; 7] = [
        RuleKind::Doors,
        RuleKind::Setup,
        RuleKind::Strike,
        RuleKind::WarmUp,
        RuleKind::Preset,
        RuleKind::IceMake,
        RuleKind::TechRun,
    ];

    pub fn category(self) -> Category {
        match self {
            RuleKind::Doors => Category::Doors,
            RuleKind::Setup => Category::Setup,
            RuleKind::Strike => Category::Strike,
            RuleKind::WarmUp => Category::WarmUp,
            RuleKind::Preset => Category::Preset,
            RuleKind::IceMake => Category::IceMake,
            RuleKind::TechRun => Category::TechRun,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuleKind::Doors => "doors",
            RuleKind::Setup => "setup",
            RuleKind::Strike => "strike",
            RuleKind::WarmUp => "warm_up",
            RuleKind::Preset => "preset",
            RuleKind::IceMake => "ice_make",
            RuleKind::TechRun => "tech_run",
        }
    }
}

/// Which edge of the anchor the offset is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorPoint {
    Start,
    End,
}

/// A declarative rule producing at most one derived event per anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivationRule {
    pub kind: RuleKind,
    /// Category names, compared exactly against the anchor's category.
    pub match_categories: Vec<Category>,
    /// Lowercased title substrings. Non-empty title criteria take precedence
    /// over categories.
    pub match_titles: Vec<String>,
    /// Lowercased title substrings that veto a match outright.
    pub exclude_titles: Vec<String>,
    pub anchor: AnchorPoint,
    pub offset_minutes: i64,
    pub duration_minutes: i64,
    /// Title with an optional `{parent_title}` placeholder.
    pub title_template: String,
    pub first_per_day: bool,
    pub last_per_day: bool,
    pub skip_last_per_day: bool,
    pub min_per_day: Option<u32>,
    pub min_gap_minutes: Option<i64>,
    pub check_all_events: bool,
    pub skip_if_next_matches: bool,
}

impl DerivationRule {
    /// A rule with no modifiers. Mostly useful for building rule sets in code.
    pub fn new(
        kind: RuleKind,
        anchor: AnchorPoint,
        offset_minutes: i64,
        duration_minutes: i64,
        title_template: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            match_categories: Vec::new(),
            match_titles: Vec::new(),
            exclude_titles: Vec::new(),
            anchor,
            offset_minutes,
            duration_minutes,
            title_template: title_template.into(),
            first_per_day: false,
            last_per_day: false,
            skip_last_per_day: false,
            min_per_day: None,
            min_gap_minutes: None,
            check_all_events: false,
            skip_if_next_matches: false,
        }
    }

    pub fn with_categories<I, C>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Category>,
    {
        self.match_categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_titles<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.match_titles = titles
            .into_iter()
            .map(|t| t.as_ref().to_lowercase())
            .collect();
        self
    }

    pub fn with_exclusions<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_titles = titles
            .into_iter()
            .map(|t| t.as_ref().to_lowercase())
            .collect();
        self
    }

    /// Expand the title template for a given parent title.
    pub fn render_title(&self, parent_title: &str) -> String {
        self.title_template.replace("{parent_title}", parent_title)
    }
}

/// Title substrings that put an anchor into one of the two resource states.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FloorRequirement {
    pub ice_titles: Vec<String>,
    pub floor_titles: Vec<String>,
}

/// How a change of resource state is materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRule {
    pub duration_minutes: i64,
    pub to_ice_title: String,
    pub to_floor_title: String,
    pub category: Category,
}

impl Default for TransitionRule {
    fn default() -> Self {
        Self {
            duration_minutes: 120,
            to_ice_title: "Set Ice".to_string(),
            to_floor_title: "Set Floor".to_string(),
            category: Category::Transition,
        }
    }
}

/// Dead overnight window handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LateNightConfig {
    /// Events starting after midnight and before this hour are candidates.
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,
    /// Hour of the same calendar date that candidates move to.
    #[serde(default = "default_reschedule_hour")]
    pub reschedule_hour: u32,
}

fn default_end_hour() -> u32 {
    6
}

fn default_reschedule_hour() -> u32 {
    9
}

impl Default for LateNightConfig {
    fn default() -> Self {
        Self {
            end_hour: default_end_hour(),
            reschedule_hour: default_reschedule_hour(),
        }
    }
}

/// Numeric constants for the merge and resolve stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Thresholds {
    /// Smallest gap that gets a Reset filler.
    pub reset_min_gap_minutes: i64,
    /// Gaps up to this long get "Reset for ..." titles.
    pub reset_short_gap_minutes: i64,
    /// Longest Reset filler.
    pub reset_max_minutes: i64,
    /// Minimum length of a merged operational block.
    pub merge_floor_minutes: i64,
    /// A bumped event may shrink, but not below this (or its own duration).
    pub min_placement_minutes: i64,
    /// Overnight transitions use the next anchor's start if it is before this hour.
    pub transition_cutoff_hour: u32,
    /// Otherwise they default to this hour.
    pub transition_default_hour: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            reset_min_gap_minutes: 15,
            reset_short_gap_minutes: 30,
            reset_max_minutes: 60,
            merge_floor_minutes: 60,
            min_placement_minutes: 30,
            transition_cutoff_hour: 10,
            transition_default_hour: 9,
        }
    }
}
