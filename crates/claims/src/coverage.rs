//! Coverage recommendation.
//!
//! Rules, in priority order:
//! - an exact (case-insensitive) category match beats a containment match
//! - among matches, a `sub-limit` line beats a `main` line
//! - remaining ties go to the lowest limit, then to declaration order
//! - no match falls back to the policy's first `main` line
//! - no `main` line at all leaves the item without coverage

use serde::{Deserialize, Serialize};

use crate::policy::{CoverageEntry, CoverageKind, ParsedPolicy};

/// Outcome of [`select_coverage`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "entry", rename_all = "camelCase")]
pub enum CoverageSelection {
    /// A line whose category matches the item's.
    Matched(CoverageEntry),
    /// No category matched; the main personal-property line applies.
    Fallback(CoverageEntry),
    /// Nothing matched and the policy has no main line.
    Unavailable,
}

impl CoverageSelection {
    pub fn entry(&self) -> Option<&CoverageEntry> {
        match self {
            CoverageSelection::Matched(e) | CoverageSelection::Fallback(e) => Some(e),
            CoverageSelection::Unavailable => None,
        }
    }

    pub fn into_entry(self) -> Option<CoverageEntry> {
        match self {
            CoverageSelection::Matched(e) | CoverageSelection::Fallback(e) => Some(e),
            CoverageSelection::Unavailable => None,
        }
    }

    /// User-facing explanation of the recommendation.
    pub fn notice(&self, category: &str) -> String {
        match self {
            CoverageSelection::Matched(e) => format!(
                "Recommended {} coverage '{}' (limit ${:.2}) for category '{}'",
                e.kind.as_str(),
                e.category,
                e.limit,
                category
            ),
            CoverageSelection::Fallback(e) => format!(
                "No specific coverage for category '{}'; using main coverage '{}' (limit ${:.2})",
                category, e.category, e.limit
            ),
            CoverageSelection::Unavailable => format!(
                "No applicable coverage found for category '{category}': the policy has no main coverage line"
            ),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum MatchStrength {
    Exact,
    Contains,
}

fn match_strength(item_category: &str, coverage_category: &str) -> Option<MatchStrength> {
    let item = item_category.trim().to_lowercase();
    let cov = coverage_category.trim().to_lowercase();
    if item.is_empty() || cov.is_empty() {
        return None;
    }
    if item == cov {
        Some(MatchStrength::Exact)
    } else if item.contains(&cov) || cov.contains(&item) {
        Some(MatchStrength::Contains)
    } else {
        None
    }
}

fn kind_rank(kind: CoverageKind) -> u8 {
    match kind {
        CoverageKind::SubLimit => 0,
        CoverageKind::Main => 1,
    }
}

/// Pick the coverage line that applies to an item of `category`.
///
/// Deterministic: the same inputs always produce the same selection.
pub fn select_coverage(category: &str, policy: &ParsedPolicy) -> CoverageSelection {
    let best = policy
        .coverage
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            match_strength(category, &entry.category).map(|strength| (strength, idx, entry))
        })
        .min_by(|(sa, ia, a), (sb, ib, b)| {
            sa.cmp(sb)
                .then_with(|| kind_rank(a.kind).cmp(&kind_rank(b.kind)))
                .then_with(|| a.limit.total_cmp(&b.limit))
                .then_with(|| ia.cmp(ib))
        });

    if let Some((_, _, entry)) = best {
        return CoverageSelection::Matched(entry.clone());
    }

    match policy.main_coverage() {
        Some(main) => CoverageSelection::Fallback(main.clone()),
        None => CoverageSelection::Unavailable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn policy(coverage: Vec<CoverageEntry>) -> ParsedPolicy {
        ParsedPolicy::new("P-1", "Acme", coverage, 500.0, vec![], 90.0)
    }

    #[test]
    fn exact_match_beats_containment() {
        let p = policy(vec![
            CoverageEntry::main("Personal Property", 100_000.0),
            CoverageEntry::sub_limit("Consumer Electronics", 3_000.0),
            CoverageEntry::sub_limit("Electronics", 5_000.0),
        ]);
        let selection = select_coverage("electronics", &p);
        assert_eq!(selection, CoverageSelection::Matched(CoverageEntry::sub_limit("Electronics", 5_000.0)));
    }

    #[test]
    fn sub_limit_beats_main_among_matches() {
        let p = policy(vec![
            CoverageEntry::main("Jewelry", 50_000.0),
            CoverageEntry::sub_limit("Jewelry", 1_000.0),
        ]);
        assert_eq!(
            select_coverage("Jewelry", &p).entry().map(|e| e.kind),
            Some(CoverageKind::SubLimit)
        );
    }

    #[test]
    fn ties_break_on_lowest_limit_then_order() {
        let p = policy(vec![
            CoverageEntry::sub_limit("Art", 2_000.0),
            CoverageEntry::sub_limit("Art", 1_500.0),
            CoverageEntry::sub_limit("art", 1_500.0),
        ]);
        let selection = select_coverage("Art", &p);
        assert_eq!(selection.entry().map(|e| e.category.as_str()), Some("Art"));
        assert_eq!(selection.entry().map(|e| e.limit), Some(1_500.0));
    }

    #[test]
    fn no_match_falls_back_to_first_main() {
        let p = policy(vec![
            CoverageEntry::sub_limit("Firearms", 2_500.0),
            CoverageEntry::main("Personal Property", 100_000.0),
            CoverageEntry::main("Other Structures", 20_000.0),
        ]);
        let selection = select_coverage("Kitchenware", &p);
        assert_eq!(selection, CoverageSelection::Fallback(CoverageEntry::main("Personal Property", 100_000.0)));
        assert!(selection.notice("Kitchenware").contains("main coverage"));
    }

    #[test]
    fn no_main_line_is_unavailable() {
        let p = policy(vec![CoverageEntry::sub_limit("Firearms", 2_500.0)]);
        let selection = select_coverage("Kitchenware", &p);
        assert_eq!(selection, CoverageSelection::Unavailable);
        assert!(selection.entry().is_none());
        assert!(selection.notice("Kitchenware").contains("No applicable coverage"));
    }

    #[test]
    fn empty_category_only_gets_the_fallback() {
        let p = policy(vec![
            CoverageEntry::main("Personal Property", 100_000.0),
            CoverageEntry::sub_limit("Jewelry", 1_000.0),
        ]);
        assert!(matches!(select_coverage("", &p), CoverageSelection::Fallback(_)));
    }

    fn arb_entry() -> impl Strategy<Value = CoverageEntry> {
        (
            prop::sample::select(vec!["Jewelry", "Electronics", "Art", "Personal Property", "Tools"]),
            1u32..100_000u32,
            any::<bool>(),
        )
            .prop_map(|(cat, limit, main)| {
                if main {
                    CoverageEntry::main(cat, limit as f64)
                } else {
                    CoverageEntry::sub_limit(cat, limit as f64)
                }
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn selection_is_deterministic_and_drawn_from_policy(
            coverage in prop::collection::vec(arb_entry(), 0..8),
            category in prop::sample::select(vec!["jewelry", "Electronics", "Kitchen", "ART", ""]),
        ) {
            let p = policy(coverage);
            let first = select_coverage(category, &p);
            let second = select_coverage(category, &p);
            prop_assert_eq!(&first, &second);

            if let Some(entry) = first.entry() {
                prop_assert!(p.coverage.contains(entry));
            } else {
                prop_assert!(p.main_coverage().is_none());
            }
        }
    }
}
