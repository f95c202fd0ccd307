//! Merging and deduplication of links from both extractors
//!
//! Links are grouped by [`LinkKey`]. Within a group the link with the
//! highest precedence supplies the scalar fields and every other link only
//! contributes fact-pattern tags. Precedence is a total order over the whole
//! link, so the result does not depend on input order.

use lexlink_domain::{ExtractedLink, LinkKey};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Result of merging two link sequences
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    /// One link per key, sorted by key
    pub links: Vec<ExtractedLink>,

    /// Keys that appeared more than once
    pub duplicates: usize,

    /// Keys whose sources disagreed on interpretation or authority
    pub conflicts: usize,
}

/// Merge rule-based and model-derived links into one deduplicated set
pub fn merge_links(
    rule_links: impl IntoIterator<Item = ExtractedLink>,
    llm_links: impl IntoIterator<Item = ExtractedLink>,
) -> MergeOutcome {
    let mut groups: BTreeMap<LinkKey, Vec<ExtractedLink>> = BTreeMap::new();
    for link in rule_links.into_iter().chain(llm_links) {
        groups.entry(link.key()).or_default().push(link);
    }

    let mut outcome = MergeOutcome::default();
    for (key, mut group) in groups {
        if group.len() > 1 {
            outcome.duplicates += 1;
        }
        group.sort_by(precedence);

        let mut members = group.into_iter();
        let Some(primary) = members.next() else {
            continue;
        };

        let mut merged = primary;
        for other in members {
            if disagrees(&merged, &other) {
                outcome.conflicts += 1;
                warn!(
                    key = %key,
                    kept_method = %merged.method(),
                    kept_type = %merged.interpretation_type(),
                    kept_authority = %merged.authority(),
                    dropped_method = %other.method(),
                    dropped_type = %other.interpretation_type(),
                    dropped_authority = %other.authority(),
                    "Conflicting links for the same key; keeping the higher-precedence fields"
                );
            }
            merged = merged.merged_with(&other);
        }
        debug!(key = %key, method = %merged.method(), "Merged link group");
        outcome.links.push(merged);
    }
    outcome
}

/// Highest precedence first: method priority, then confidence, then the
/// remaining fields so that equal-looking links still have a fixed order
fn precedence(a: &ExtractedLink, b: &ExtractedLink) -> Ordering {
    b.method()
        .priority()
        .cmp(&a.method().priority())
        .then_with(|| b.confidence().total_cmp(&a.confidence()))
        .then_with(|| b.boost_factor().total_cmp(&a.boost_factor()))
        .then_with(|| a.method().cmp(&b.method()))
        .then_with(|| a.interpretation_type().cmp(&b.interpretation_type()))
        .then_with(|| a.authority().cmp(&b.authority()))
        .then_with(|| a.holding().cmp(&b.holding()))
        .then_with(|| a.fact_pattern_tags().cmp(b.fact_pattern_tags()))
}

fn disagrees(kept: &ExtractedLink, other: &ExtractedLink) -> bool {
    kept.interpretation_type() != other.interpretation_type() || kept.authority() != other.authority()
}
