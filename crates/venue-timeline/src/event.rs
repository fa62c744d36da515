//! The event record that flows through every pipeline stage.
//!
//! Timestamps are venue-local wall-clock times (`NaiveDateTime`): "after
//! midnight" and "09:00" always mean local time at the venue, so no timezone
//! conversion happens inside the engine.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Event category. Known categories get their own variant; anything else the
/// upstream extraction produces is carried verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Show,
    Game,
    Activity,
    Party,
    Doors,
    Setup,
    Strike,
    Preset,
    WarmUp,
    IceMake,
    TechRun,
    Reset,
    Transition,
    Other(String),
}

impl Category {
    pub fn as_str(&self) -> &str {
        match self {
            Category::Show => "show",
            Category::Game => "game",
            Category::Activity => "activity",
            Category::Party => "party",
            Category::Doors => "doors",
            Category::Setup => "setup",
            Category::Strike => "strike",
            Category::Preset => "preset",
            Category::WarmUp => "warm_up",
            Category::IceMake => "ice_make",
            Category::TechRun => "tech_run",
            Category::Reset => "reset",
            Category::Transition => "transition",
            Category::Other(s) => s,
        }
    }

    /// Categories that physically reconfigure the venue. These are merged,
    /// bumped and omitted by the overlap stages; all others pass through.
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            Category::Setup
                | Category::Strike
                | Category::Preset
                | Category::Reset
                | Category::Transition
        )
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        let name = s.trim().to_lowercase();
        let known = match name.as_str() {
            "show" => Some(Category::Show),
            "game" => Some(Category::Game),
            "activity" => Some(Category::Activity),
            "party" => Some(Category::Party),
            "doors" => Some(Category::Doors),
            "setup" => Some(Category::Setup),
            "strike" => Some(Category::Strike),
            "preset" => Some(Category::Preset),
            "warm_up" | "warmup" => Some(Category::WarmUp),
            "ice_make" => Some(Category::IceMake),
            "tech_run" => Some(Category::TechRun),
            "reset" => Some(Category::Reset),
            "transition" | "floor_transition" => Some(Category::Transition),
            _ => None,
        };
        known.unwrap_or(Category::Other(name))
    }
}

impl From<&str> for Category {
    fn from(s: &str) -> Self {
        Category::from(s.to_string())
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scheduled item: either an anchor supplied by the caller or an
/// operational event synthesized by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub category: Category,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub is_derived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_title: Option<String>,
    /// Constituents of a merged block, in title order. Empty otherwise.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merged_from: Vec<MergedPart>,
    /// Imported from another venue. Blocks time here but never drives rules.
    #[serde(default)]
    pub is_cross_venue: bool,
    #[serde(default)]
    pub is_floor_transition: bool,
}

/// One original operational event folded into a merged block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedPart {
    pub title: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_title: Option<String>,
    #[serde(default)]
    pub is_floor_transition: bool,
}

/// Stable identity for an event within one run. Events are values, so claims
/// are tracked by title and start rather than by reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    pub title: String,
    pub start: NaiveDateTime,
}

impl Event {
    /// Create an anchor event.
    pub fn anchor(
        title: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        category: impl Into<Category>,
        venue: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            start,
            end,
            category: category.into(),
            venue: venue.into(),
            is_derived: false,
            parent_title: None,
            merged_from: Vec::new(),
            is_cross_venue: false,
            is_floor_transition: false,
        }
    }

    /// Create an engine-generated event attached to `parent`.
    pub fn derived(
        title: impl Into<String>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        category: Category,
        parent: &Event,
    ) -> Self {
        Self {
            title: title.into(),
            start,
            end,
            category,
            venue: parent.venue.clone(),
            is_derived: true,
            parent_title: Some(parent.title.clone()),
            merged_from: Vec::new(),
            is_cross_venue: false,
            is_floor_transition: false,
        }
    }

    /// Anchors are authoritative: the pipeline never moves them.
    pub fn is_anchor(&self) -> bool {
        !self.is_derived && !self.is_floor_transition
    }

    /// Anchors that belong to this venue's own programme and drive rules.
    pub fn is_real(&self) -> bool {
        self.is_anchor() && !self.is_cross_venue
    }

    /// Derived events that occupy the venue floor: merge and resolve targets.
    pub fn is_operational(&self) -> bool {
        !self.is_anchor() && (self.is_floor_transition || self.category.is_operational())
    }

    /// Whether `title` is this event's parent or, for merged blocks, the
    /// parent of one of its constituents.
    pub fn has_parent(&self, title: &str) -> bool {
        self.parent_title.as_deref() == Some(title)
            || self
                .merged_from
                .iter()
                .any(|p| p.parent_title.as_deref() == Some(title))
    }

    pub fn key(&self) -> EventKey {
        EventKey {
            title: self.title.clone(),
            start: self.start,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Half-open interval overlap. Adjacent events (one ends exactly when the
    /// other starts) do not overlap.
    pub fn overlaps(&self, other: &Event) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Same as [`Event::overlaps`] against a raw interval.
    pub fn overlaps_window(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start < end && start < self.end
    }
}

/// Chronological order with a full tie-break so output ordering is
/// deterministic for identical input.
pub fn sort_chronologically(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.end.cmp(&b.end))
            .then_with(|| a.is_derived.cmp(&b.is_derived))
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.parent_title.cmp(&b.parent_title))
    });
}
