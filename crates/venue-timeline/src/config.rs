//! Rule book loading and validation.
//!
//! A rule book is JSON keyed by venue code. Every field is optional in the
//! raw form so that missing values are reported as configuration errors
//! naming the venue and rule, instead of opaque deserialization failures.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{Result, TimelineError};
use crate::event::Category;
use crate::resource::{NoResourceState, ResourceClassifier, TitleClassifier};
use crate::rule::{
    AnchorPoint, DerivationRule, FloorRequirement, LateNightConfig, RuleKind, Thresholds,
    TransitionRule,
};

/// Longest offset, duration or threshold a rule book may use: one week.
const MAX_SPAN_MINUTES: i64 = 7 * 24 * 60;

// ---------------------------------------------------------------------------
// Raw JSON shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRuleBook {
    #[serde(default)]
    venues: BTreeMap<String, RawVenueRuleSet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVenueRuleSet {
    #[serde(default)]
    rules: BTreeMap<RuleKind, Vec<RawDerivationRule>>,
    #[serde(default)]
    resource: Option<RawResource>,
    #[serde(default)]
    transition: Option<RawTransition>,
    #[serde(default)]
    late_night: Option<LateNightConfig>,
    #[serde(default)]
    thresholds: Thresholds,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDerivationRule {
    #[serde(default)]
    match_categories: Vec<String>,
    #[serde(default)]
    match_titles: Vec<String>,
    #[serde(default)]
    exclude_titles: Vec<String>,
    anchor: Option<AnchorPoint>,
    offset_minutes: Option<i64>,
    duration_minutes: Option<i64>,
    title_template: Option<String>,
    #[serde(default)]
    first_per_day: bool,
    #[serde(default)]
    last_per_day: bool,
    #[serde(default)]
    skip_last_per_day: bool,
    min_per_day: Option<u32>,
    min_gap_minutes: Option<i64>,
    #[serde(default)]
    check_all_events: bool,
    #[serde(default)]
    skip_if_next_matches: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawResource {
    #[serde(default = "default_classifier")]
    classifier: String,
    #[serde(default)]
    ice_titles: Vec<String>,
    #[serde(default)]
    floor_titles: Vec<String>,
}

fn default_classifier() -> String {
    "title_match".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTransition {
    duration_minutes: Option<i64>,
    to_ice_title: Option<String>,
    to_floor_title: Option<String>,
    category: Option<String>,
}

// ---------------------------------------------------------------------------
// Validated configuration
// ---------------------------------------------------------------------------

/// How a venue decides which resource state an anchor needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ClassifierKind {
    /// The venue has a single configuration; no transitions are derived.
    #[default]
    None,
    /// Substring match of anchor titles against two title sets.
    TitleMatch(FloorRequirement),
}

/// Everything the pipeline needs to process one venue.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VenueRuleSet {
    pub venue: String,
    pub rules: BTreeMap<RuleKind, Vec<DerivationRule>>,
    pub classifier: ClassifierKind,
    pub transition: Option<TransitionRule>,
    pub late_night: Option<LateNightConfig>,
    pub thresholds: Thresholds,
}

impl VenueRuleSet {
    pub fn new(venue: impl Into<String>) -> Self {
        Self {
            venue: venue.into(),
            ..Self::default()
        }
    }

    /// Append a rule to its kind's list. Declaration order is preserved and
    /// is the order rules are tried in.
    pub fn with_rule(mut self, rule: DerivationRule) -> Self {
        self.rules.entry(rule.kind).or_default().push(rule);
        self
    }

    pub fn with_resource_states(
        mut self,
        requirement: FloorRequirement,
        transition: TransitionRule,
    ) -> Self {
        self.classifier = ClassifierKind::TitleMatch(requirement);
        self.transition = Some(transition);
        self
    }

    pub fn with_late_night(mut self, late_night: LateNightConfig) -> Self {
        self.late_night = Some(late_night);
        self
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn rules_for(&self, kind: RuleKind) -> &[DerivationRule] {
        self.rules.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The resource classifier selected for this venue.
    pub fn classifier(&self) -> Box<dyn ResourceClassifier> {
        match &self.classifier {
            ClassifierKind::None => Box::new(NoResourceState),
            ClassifierKind::TitleMatch(req) => Box::new(TitleClassifier::new(req)),
        }
    }

    /// Check invariants that the typed builders cannot enforce on their own.
    pub fn validate(&self) -> Result<()> {
        for (kind, rules) in &self.rules {
            for (index, rule) in rules.iter().enumerate() {
                validate_rule(&self.venue, *kind, index, rule)?;
            }
        }
        if matches!(self.classifier, ClassifierKind::TitleMatch(_)) {
            match &self.transition {
                None => {
                    return Err(TimelineError::config(
                        &self.venue,
                        "resource states are configured but no transition rule is given",
                    ))
                }
                Some(t) if t.duration_minutes <= 0 => {
                    return Err(TimelineError::config(
                        &self.venue,
                        "transition duration_minutes must be positive",
                    ))
                }
                Some(t) => check_span(
                    &self.venue,
                    "transition.duration_minutes",
                    t.duration_minutes,
                )?,
            }
        }
        if let Some(ln) = &self.late_night {
            check_hour(&self.venue, "late_night.end_hour", ln.end_hour)?;
            check_hour(&self.venue, "late_night.reschedule_hour", ln.reschedule_hour)?;
        }
        let t = &self.thresholds;
        check_hour(&self.venue, "thresholds.transition_cutoff_hour", t.transition_cutoff_hour)?;
        check_hour(&self.venue, "thresholds.transition_default_hour", t.transition_default_hour)?;
        if t.merge_floor_minutes < 0
            || t.reset_min_gap_minutes < 0
            || t.reset_max_minutes < 0
            || t.min_placement_minutes < 0
        {
            return Err(TimelineError::config(
                &self.venue,
                "thresholds must not be negative",
            ));
        }
        for (field, minutes) in [
            ("thresholds.reset_min_gap_minutes", t.reset_min_gap_minutes),
            ("thresholds.reset_short_gap_minutes", t.reset_short_gap_minutes),
            ("thresholds.reset_max_minutes", t.reset_max_minutes),
            ("thresholds.merge_floor_minutes", t.merge_floor_minutes),
            ("thresholds.min_placement_minutes", t.min_placement_minutes),
        ] {
            check_span(&self.venue, field, minutes)?;
        }
        Ok(())
    }
}

fn check_span(venue: &str, field: &str, minutes: i64) -> Result<()> {
    if minutes > MAX_SPAN_MINUTES {
        return Err(TimelineError::config(
            venue,
            format!(
                "{} must be at most {} minutes, got {}",
                field, MAX_SPAN_MINUTES, minutes
            ),
        ));
    }
    Ok(())
}

fn check_hour(venue: &str, field: &str, hour: u32) -> Result<()> {
    if hour > 23 {
        return Err(TimelineError::config(
            venue,
            format!("{} must be between 0 and 23, got {}", field, hour),
        ));
    }
    Ok(())
}

fn validate_rule(venue: &str, kind: RuleKind, index: usize, rule: &DerivationRule) -> Result<()> {
    let at = format!("{} rule #{}", kind.as_str(), index);
    if rule.kind != kind {
        return Err(TimelineError::config(
            venue,
            format!("{}: declared as {} rule", at, rule.kind.as_str()),
        ));
    }
    if rule.match_titles.is_empty() && rule.match_categories.is_empty() {
        return Err(TimelineError::config(
            venue,
            format!("{}: needs match_titles or match_categories", at),
        ));
    }
    if rule.duration_minutes < 0 {
        return Err(TimelineError::config(
            venue,
            format!("{}: duration_minutes must not be negative", at),
        ));
    }
    check_span(venue, &format!("{}: duration_minutes", at), rule.duration_minutes)?;
    let offset = rule.offset_minutes.checked_abs().unwrap_or(i64::MAX);
    check_span(venue, &format!("{}: offset_minutes", at), offset)?;
    if rule.skip_if_next_matches && kind != RuleKind::Strike {
        return Err(TimelineError::config(
            venue,
            format!("{}: skip_if_next_matches only applies to strike rules", at),
        ));
    }
    if let Some(gap) = rule.min_gap_minutes {
        if gap < 0 {
            return Err(TimelineError::config(
                venue,
                format!("{}: min_gap_minutes must not be negative", at),
            ));
        }
        check_span(venue, &format!("{}: min_gap_minutes", at), gap)?;
    }
    Ok(())
}

/// All venue rule sets known to a deployment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RuleBook {
    venues: BTreeMap<String, VenueRuleSet>,
}

impl RuleBook {
    /// Parse and validate a JSON rule book.
    ///
    /// # Errors
    /// Returns `TimelineError::Json` for malformed JSON and
    /// `TimelineError::Config` for the first rule that fails validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawRuleBook = serde_json::from_str(json)?;
        let mut venues = BTreeMap::new();
        for (code, raw_set) in raw.venues {
            let set = build_venue(&code, raw_set)?;
            set.validate()?;
            venues.insert(code, set);
        }
        Ok(Self { venues })
    }

    pub fn insert(&mut self, set: VenueRuleSet) {
        self.venues.insert(set.venue.clone(), set);
    }

    pub fn venue(&self, code: &str) -> Result<&VenueRuleSet> {
        self.venues
            .get(code)
            .ok_or_else(|| TimelineError::UnknownVenue(code.to_string()))
    }

    pub fn venues(&self) -> impl Iterator<Item = &VenueRuleSet> {
        self.venues.values()
    }
}

fn build_venue(code: &str, raw: RawVenueRuleSet) -> Result<VenueRuleSet> {
    let mut rules = BTreeMap::new();
    for (kind, raw_rules) in raw.rules {
        let built = raw_rules
            .into_iter()
            .enumerate()
            .map(|(index, r)| build_rule(code, kind, index, r))
            .collect::<Result<Vec<_>>>()?;
        rules.insert(kind, built);
    }

    let classifier = match raw.resource {
        None => ClassifierKind::None,
        Some(res) => match res.classifier.as_str() {
            "none" => ClassifierKind::None,
            "title_match" => ClassifierKind::TitleMatch(FloorRequirement {
                ice_titles: lowercase_all(res.ice_titles),
                floor_titles: lowercase_all(res.floor_titles),
            }),
            other => {
                return Err(TimelineError::config(
                    code,
                    format!(
                        "unknown resource classifier '{}'. Available: title_match, none",
                        other
                    ),
                ))
            }
        },
    };

    let transition = match raw.transition {
        None => None,
        Some(t) => {
            let defaults = TransitionRule::default();
            let duration_minutes = t.duration_minutes.ok_or_else(|| {
                TimelineError::config(code, "transition: missing duration_minutes")
            })?;
            Some(TransitionRule {
                duration_minutes,
                to_ice_title: t.to_ice_title.unwrap_or(defaults.to_ice_title),
                to_floor_title: t.to_floor_title.unwrap_or(defaults.to_floor_title),
                category: t.category.map(Category::from).unwrap_or(defaults.category),
            })
        }
    };

    Ok(VenueRuleSet {
        venue: code.to_string(),
        rules,
        classifier,
        transition,
        late_night: raw.late_night,
        thresholds: raw.thresholds,
    })
}

fn build_rule(
    venue: &str,
    kind: RuleKind,
    index: usize,
    raw: RawDerivationRule,
) -> Result<DerivationRule> {
    let missing = |field: &str| {
        TimelineError::config(
            venue,
            format!("{} rule #{}: missing {}", kind.as_str(), index, field),
        )
    };
    let offset_minutes = raw.offset_minutes.ok_or_else(|| missing("offset_minutes"))?;
    let duration_minutes = raw
        .duration_minutes
        .ok_or_else(|| missing("duration_minutes"))?;
    let anchor = raw.anchor.ok_or_else(|| missing("anchor"))?;
    let title_template = raw
        .title_template
        .unwrap_or_else(|| default_template(kind).to_string());

    Ok(DerivationRule {
        kind,
        match_categories: raw.match_categories.into_iter().map(Category::from).collect(),
        match_titles: lowercase_all(raw.match_titles),
        exclude_titles: lowercase_all(raw.exclude_titles),
        anchor,
        offset_minutes,
        duration_minutes,
        title_template,
        first_per_day: raw.first_per_day,
        last_per_day: raw.last_per_day,
        skip_last_per_day: raw.skip_last_per_day,
        min_per_day: raw.min_per_day,
        min_gap_minutes: raw.min_gap_minutes,
        check_all_events: raw.check_all_events,
        skip_if_next_matches: raw.skip_if_next_matches,
    })
}

fn default_template(kind: RuleKind) -> &'static str {
    match kind {
        RuleKind::Doors => "Doors",
        RuleKind::Setup => "Set Up {parent_title}",
        RuleKind::Strike => "Strike {parent_title}",
        RuleKind::WarmUp => "Warm Up {parent_title}",
        RuleKind::Preset => "Preset {parent_title}",
        RuleKind::IceMake => "Ice Make",
        RuleKind::TechRun => "Tech Run {parent_title}",
    }
}

fn lowercase_all(items: Vec<String>) -> Vec<String> {
    items
        .into_iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
