use civic_core::filter::filter_issues;
use civic_core::news::filter_news;
use civic_core::ranking::{department_summary, rank_departments};
use civic_core::schema::{
    ContactInfo, Department, DepartmentType, Issue, IssueCategory, IssuePriority, IssueStatus,
    Location, NewsItem, NewsType, Performance, Selector,
};
use proptest::prelude::*;
use time::OffsetDateTime;

fn category_strategy() -> impl Strategy<Value = IssueCategory> {
    prop::sample::select(IssueCategory::ALL.to_vec())
}

fn issue_strategy() -> impl Strategy<Value = Issue> {
    (
        "[a-zA-Z ]{0,12}",
        "[a-zA-Z ]{0,24}",
        category_strategy(),
        0u32..100,
    )
        .prop_map(|(title, description, category, upvotes)| Issue {
            id: String::new(),
            title,
            description,
            category,
            priority: IssuePriority::Medium,
            status: IssueStatus::Reported,
            location: Location::unspecified(),
            images: Vec::new(),
            is_anonymous: false,
            reported_by: "citizen".to_string(),
            reported_at: OffsetDateTime::UNIX_EPOCH,
            upvotes,
            assigned_to: None,
            department_id: None,
            estimated_resolution: None,
            actual_resolution: None,
        })
}

fn issues_strategy() -> impl Strategy<Value = Vec<Issue>> {
    prop::collection::vec(issue_strategy(), 0..20).prop_map(|mut issues| {
        for (index, issue) in issues.iter_mut().enumerate() {
            issue.id = index.to_string();
        }
        issues
    })
}

fn selector_strategy() -> impl Strategy<Value = Selector<IssueCategory>> {
    prop_oneof![
        Just(Selector::All),
        category_strategy().prop_map(Selector::Only),
    ]
}

fn department_strategy() -> impl Strategy<Value = Department> {
    let counts = prop_oneof![Just((0u32, 0u32)), (0u32..500, 0u32..500)];
    (counts, 0.0f64..72.0, 0.0f64..=5.0).prop_map(
        |((total, resolved), response, rating)| Department {
            id: format!("d-{total}-{resolved}"),
            name: "Department".to_string(),
            kind: DepartmentType::Ngo,
            contact_info: ContactInfo {
                email: "dept@city.gov".to_string(),
                phone: "000".to_string(),
            },
            performance: Performance {
                total_assigned: total.max(resolved),
                resolved,
                avg_response_time: response,
                rating,
            },
            color: "#FFFFFF".to_string(),
        },
    )
}

fn predicate(issue: &Issue, category: &Selector<IssueCategory>, search: &str) -> bool {
    let needle = search.to_lowercase();
    category.matches(&issue.category)
        && (issue.title.to_lowercase().contains(&needle)
            || issue.description.to_lowercase().contains(&needle))
}

proptest! {
    #[test]
    fn filtered_issues_are_sound_and_complete(
        issues in issues_strategy(),
        category in selector_strategy(),
        search in "[a-zA-Z]{0,3}",
    ) {
        let result = filter_issues(&issues, &category, &search);
        for issue in &result {
            prop_assert!(predicate(issue, &category, &search));
        }
        for issue in &issues {
            let kept = result.iter().any(|candidate| candidate.id == issue.id);
            prop_assert_eq!(kept, predicate(issue, &category, &search));
        }
        let positions: Vec<usize> = result
            .iter()
            .map(|issue| issue.id.parse::<usize>().unwrap())
            .collect();
        prop_assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn all_with_empty_search_is_identity(issues in issues_strategy()) {
        let result: Vec<Issue> = filter_issues(&issues, &Selector::All, "")
            .into_iter()
            .cloned()
            .collect();
        prop_assert_eq!(result, issues);
    }

    #[test]
    fn ranking_is_descending_and_finite(
        departments in prop::collection::vec(department_strategy(), 0..12),
    ) {
        let ranked = rank_departments(&departments);
        prop_assert_eq!(ranked.len(), departments.len());
        for entry in &ranked {
            prop_assert!(entry.resolution_rate.is_finite());
            if entry.department.performance.total_assigned == 0 {
                prop_assert_eq!(entry.resolution_rate, 0.0);
                prop_assert_eq!(entry.resolution_percent, 0);
            }
        }
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].resolution_rate >= pair[1].resolution_rate);
        }

        let summary = department_summary(&departments);
        let expected: u64 = departments
            .iter()
            .map(|department| u64::from(department.performance.resolved))
            .sum();
        prop_assert_eq!(summary.total_resolved, expected);
        prop_assert!(summary.mean_resolution_percent.is_finite());
        prop_assert!(summary.mean_response_hours.is_finite());
    }

    #[test]
    fn news_filter_keeps_only_selected_type(
        kinds in prop::collection::vec(
            prop::sample::select(vec![
                NewsType::Resolution,
                NewsType::Announcement,
                NewsType::Appreciation,
            ]),
            0..15,
        ),
        wanted in prop::sample::select(vec![
            NewsType::Resolution,
            NewsType::Announcement,
            NewsType::Appreciation,
        ]),
    ) {
        let news: Vec<NewsItem> = kinds
            .iter()
            .enumerate()
            .map(|(index, kind)| NewsItem {
                id: index.to_string(),
                title: "t".to_string(),
                content: "c".to_string(),
                kind: *kind,
                published_at: OffsetDateTime::UNIX_EPOCH,
                department_id: None,
                related_issue_id: None,
                image: None,
            })
            .collect();

        let result = filter_news(&news, &Selector::Only(wanted));
        prop_assert_eq!(
            result.len(),
            kinds.iter().filter(|kind| **kind == wanted).count()
        );
        prop_assert!(result.iter().all(|item| item.kind == wanted));
        prop_assert_eq!(filter_news(&news, &Selector::All).len(), news.len());
    }
}
