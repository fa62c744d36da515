//! Decide whether an anchor satisfies a rule's match criteria.

use crate::event::Event;
use crate::rule::DerivationRule;

/// Exclusions veto first. Then title criteria win over category criteria.
/// A rule with neither matches nothing.
pub fn matches(event: &Event, rule: &DerivationRule) -> bool {
    let title = event.title.to_lowercase();
    if rule.exclude_titles.iter().any(|t| title.contains(t.as_str())) {
        return false;
    }
    if !rule.match_titles.is_empty() {
        return rule.match_titles.iter().any(|t| title.contains(t.as_str()));
    }
    if !rule.match_categories.is_empty() {
        return rule.match_categories.contains(&event.category);
    }
    false
}
