use crate::schema::{Issue, IssueCategory, Selector};
use std::collections::BTreeMap;

/// Issues in `category` whose title or description contains `search`,
/// ignoring case. Source order is kept; an empty search matches everything.
pub fn filter_issues<'a>(
    issues: &'a [Issue],
    category: &Selector<IssueCategory>,
    search: &str,
) -> Vec<&'a Issue> {
    let needle = search.to_lowercase();
    issues
        .iter()
        .filter(|issue| category.matches(&issue.category) && matches_search(issue, &needle))
        .collect()
}

fn matches_search(issue: &Issue, needle: &str) -> bool {
    issue.title.to_lowercase().contains(needle) || issue.description.to_lowercase().contains(needle)
}

/// Number of issues per category, every category present (zero included).
pub fn issues_by_category(issues: &[Issue]) -> BTreeMap<IssueCategory, usize> {
    let mut counts: BTreeMap<IssueCategory, usize> =
        IssueCategory::ALL.iter().map(|category| (*category, 0)).collect();
    for issue in issues {
        *counts.entry(issue.category).or_insert(0) += 1;
    }
    counts
}
