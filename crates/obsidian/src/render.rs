use civic_core::ranking::{
    self, Achievements, DepartmentSummary, Medal, RankedDepartment, MAX_STARS,
};
use civic_core::schema::{
    Department, Issue, IssueCategory, IssuePriority, NewsItem, NewsType, Selector,
};
use time::OffsetDateTime;
use time::macros::format_description;

pub fn display_date(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

pub fn stars(rating: f64) -> String {
    let filled = ranking::star_rating(rating);
    let mut out = "★".repeat(filled as usize);
    out.push_str(&"☆".repeat((MAX_STARS - filled) as usize));
    out
}

fn medal_label(medal: Option<Medal>, rank: usize) -> String {
    match medal {
        Some(Medal::Gold) => "🥇".to_string(),
        Some(Medal::Silver) => "🥈".to_string(),
        Some(Medal::Bronze) => "🥉".to_string(),
        None => rank.to_string(),
    }
}

fn news_icon(kind: NewsType) -> &'static str {
    match kind {
        NewsType::Resolution => "✅",
        NewsType::Announcement => "📢",
        NewsType::Appreciation => "👏",
    }
}

/// The issue list shown next to the map.
pub fn render_issue_list(
    issues: &[&Issue],
    category: &Selector<IssueCategory>,
    search: &str,
) -> String {
    let mut md = String::new();
    md.push_str("# Issue Map Dashboard\n\n");
    md.push_str(&format!(
        "_{} active issues_ (category: `{}`",
        issues.len(),
        category
    ));
    if !search.is_empty() {
        md.push_str(&format!(", search: \"{search}\""));
    }
    md.push_str(")\n\n");

    if issues.is_empty() {
        md.push_str("_No issues match the current filters._\n");
        return md;
    }

    for issue in issues {
        md.push_str(&format!("## {}\n", issue.title));
        md.push_str(&format!(
            "- Category: `{}` | Priority: `{}` | Status: `{}`\n",
            issue.category, issue.priority, issue.status
        ));
        md.push_str(&format!("- Location: {}\n", issue.location.address));
        md.push_str(&format!(
            "- {} upvotes, reported {}\n",
            issue.upvotes,
            display_date(issue.reported_at)
        ));
        md.push_str(&format!("\n{}\n\n", issue.description));
    }
    md
}

pub fn render_summary(summary: &DepartmentSummary) -> String {
    let mut md = String::new();
    md.push_str("| Departments | Issues resolved | Avg resolution | Avg response |\n");
    md.push_str("|---|---|---|---|\n");
    md.push_str(&format!(
        "| {} | {} | {}% | {}h |\n",
        summary.department_count,
        summary.total_resolved,
        summary.mean_resolution_percent.round(),
        summary.mean_response_hours.round()
    ));
    md
}

pub fn render_ranking_table(ranked: &[RankedDepartment<'_>]) -> String {
    let mut md = String::new();
    md.push_str("| Rank | Department | Resolved | Resolution | Tier | Avg response | Rating |\n");
    md.push_str("|---|---|---|---|---|---|---|\n");
    for entry in ranked {
        let performance = &entry.department.performance;
        md.push_str(&format!(
            "| {} | [[Departments/{}|{}]] | {}/{} | {}% | {} | {}h | {} {:.1} |\n",
            medal_label(entry.medal, entry.rank),
            entry.department.id,
            entry.department.name,
            performance.resolved,
            performance.total_assigned,
            entry.resolution_percent,
            entry.tier.as_str(),
            performance.avg_response_time,
            stars(performance.rating),
            performance.rating
        ));
    }
    md
}

pub fn render_achievements(picks: &Achievements<'_>) -> String {
    let name = |department: Option<&Department>| {
        department
            .map(|department| department.name.clone())
            .unwrap_or_else(|| "n/a".to_string())
    };
    let mut md = String::new();
    md.push_str(&format!("- Fastest response: {}\n", name(picks.fastest_response)));
    md.push_str(&format!("- Most resolved: {}\n", name(picks.most_resolved)));
    md.push_str(&format!("- Highest rated: {}\n", name(picks.best_rated)));
    md
}

/// Summary cards, ranking table and achievements for every department.
pub fn render_leaderboard(departments: &[Department]) -> String {
    let ranked = ranking::rank_departments(departments);
    let summary = ranking::department_summary(departments);

    let mut md = String::new();
    md.push_str("# Department Leaderboard\n\n");
    md.push_str(&render_summary(&summary));
    md.push('\n');

    if ranked.is_empty() {
        md.push_str("_No departments to rank._\n");
        return md;
    }

    md.push_str("## Rankings\n\n");
    md.push_str(&render_ranking_table(&ranked));
    md.push_str("\n## Achievements\n\n");
    md.push_str(&render_achievements(&ranking::achievements(&ranked)));
    md
}

pub fn render_news_feed(
    news: &[&NewsItem],
    departments: &[Department],
    kind: &Selector<NewsType>,
) -> String {
    let mut md = String::new();
    md.push_str("# Community News\n\n");
    md.push_str(&format!("_type: `{kind}`_\n\n"));

    if news.is_empty() {
        md.push_str("_No news items found for this type._\n");
        return md;
    }

    for item in news {
        md.push_str(&format!("## {} {}\n", news_icon(item.kind), item.title));
        let mut meta = vec![item.kind.to_string(), display_date(item.published_at)];
        if let Some(department) = item
            .department_id
            .as_deref()
            .and_then(|id| departments.iter().find(|department| department.id == id))
        {
            meta.push(department.name.clone());
        }
        if let Some(issue_id) = &item.related_issue_id {
            meta.push(format!("issue #{issue_id}"));
        }
        md.push_str(&format!("_{}_\n\n{}\n\n", meta.join(" | "), item.content));
    }
    md
}

/// Field guide for submitting a report.
pub fn render_report_form() -> String {
    let options = |tags: Vec<&str>| tags.join(", ");
    let mut md = String::new();
    md.push_str("# Report an Issue\n\n");
    md.push_str("| Field | Required | Accepted values |\n");
    md.push_str("|---|---|---|\n");
    md.push_str("| title | yes | non-empty text |\n");
    md.push_str("| description | yes | non-empty text |\n");
    md.push_str(&format!(
        "| category | yes | {} |\n",
        options(IssueCategory::ALL.iter().map(|c| c.as_str()).collect())
    ));
    md.push_str(&format!(
        "| priority | yes | {} |\n",
        options(IssuePriority::ALL.iter().map(|p| p.as_str()).collect())
    ));
    md.push_str("| location | no | address with latitude and longitude |\n");
    md.push_str("| images | no | image URLs |\n");
    md.push_str("| anonymous | no | hides the reporter |\n");
    md
}
