use crate::render;
use anyhow::{Result, ensure};
use civic_core::filter::issues_by_category;
use civic_core::news::news_for_department;
use civic_core::ranking;
use civic_core::schema::{Department, Issue, NewsItem};
use civic_core::{DataSource, Dataset};
use std::fs;
use std::path::{Path, PathBuf};

pub struct VaultPaths {
    pub root: PathBuf,
    pub index_dir: PathBuf,
    pub issues_dir: PathBuf,
    pub departments_dir: PathBuf,
    pub news_dir: PathBuf,
}

impl VaultPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            index_dir: root.join("00_Index"),
            issues_dir: root.join("Issues"),
            departments_dir: root.join("Departments"),
            news_dir: root.join("News"),
            root,
        }
    }

    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.index_dir)?;
        fs::create_dir_all(&self.issues_dir)?;
        fs::create_dir_all(&self.departments_dir)?;
        fs::create_dir_all(&self.news_dir)?;
        Ok(())
    }
}

const GENERATED_NOTICE: &str = "This index is generated. Do not edit manually.";

pub fn build_vault(source: &impl DataSource, vault_root: &Path) -> Result<()> {
    let paths = VaultPaths::new(vault_root);
    paths.ensure()?;
    let data = source.snapshot()?;

    // 1) Issue notes and the issue MOC
    let mut issue_lines = index_header("MOC - Issues");
    for issue in &data.issues {
        write_issue_note(&paths, issue, &data)?;
        issue_lines.push(format!("- [[Issues/{}|{}]]", issue.id, issue.title));
    }

    issue_lines.push(String::new());
    issue_lines.push("## Categories".to_string());
    issue_lines.push(String::new());

    let mut counts: Vec<(String, usize)> = issues_by_category(&data.issues)
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(category, count)| (category.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if counts.is_empty() {
        issue_lines.push("_No issues reported._".to_string());
    } else {
        for (category, count) in counts {
            issue_lines.push(format!("- {category} ({count})"));
        }
    }
    fs::write(paths.index_dir.join("MOC - Issues.md"), issue_lines.join("\n"))?;

    // 2) Department notes and the leaderboard MOC
    for department in &data.departments {
        write_department_note(&paths, department, &data)?;
    }
    let mut leaderboard_lines = index_header("MOC - Leaderboard");
    leaderboard_lines.push(render::render_leaderboard(&data.departments));
    fs::write(
        paths.index_dir.join("MOC - Leaderboard.md"),
        leaderboard_lines.join("\n"),
    )?;

    // 3) News notes and the news MOC
    let mut news_lines = index_header("MOC - News");
    for item in &data.news {
        write_news_note(&paths, item)?;
        news_lines.push(format!(
            "- [[News/{}|{}]] ({})",
            item.id,
            item.title,
            render::display_date(item.published_at)
        ));
    }
    fs::write(paths.index_dir.join("MOC - News.md"), news_lines.join("\n"))?;

    Ok(())
}

/// Note ids become file names, so they must stay a single plain path component.
fn note_file(dir: &Path, id: &str) -> Result<PathBuf> {
    ensure!(
        !id.is_empty()
            && id != "."
            && id != ".."
            && !id.contains(['/', '\\', ':'])
            && !id.chars().any(char::is_control),
        "id '{id}' cannot be used as a note file name"
    );
    Ok(dir.join(format!("{id}.md")))
}

fn index_header(title: &str) -> Vec<String> {
    vec![
        format!("# {title}"),
        String::new(),
        GENERATED_NOTICE.to_string(),
        String::new(),
    ]
}

fn write_issue_note(paths: &VaultPaths, issue: &Issue, data: &Dataset) -> Result<()> {
    let note_path = note_file(&paths.issues_dir, &issue.id)?;
    let images_json = serde_json::to_string(&issue.images)?;

    let mut md = String::new();
    md.push_str("---\n");
    md.push_str(&format!("id: \"{}\"\n", issue.id));
    md.push_str(&format!("category: {}\n", issue.category));
    md.push_str(&format!("priority: {}\n", issue.priority));
    md.push_str(&format!("status: {}\n", issue.status));
    md.push_str(&format!("reported_at: {}\n", render::display_date(issue.reported_at)));
    md.push_str(&format!("upvotes: {}\n", issue.upvotes));
    if let Some(department_id) = &issue.department_id {
        md.push_str(&format!("department_id: \"{}\"\n", department_id));
    }
    md.push_str("images_json: |\n");
    md.push_str(&indent_yaml_block(&images_json));
    md.push_str("---\n\n");

    md.push_str(&format!("# {}\n\n", issue.title));

    md.push_str("## Location\n");
    md.push_str(&format!("- Address: {}\n", issue.location.address));
    md.push_str(&format!(
        "- Coordinates: `{:.4}, {:.4}`\n\n",
        issue.location.lat, issue.location.lng
    ));

    md.push_str("## Assignment\n");
    match issue
        .department_id
        .as_deref()
        .and_then(|id| data.department(id))
    {
        Some(department) => md.push_str(&format!(
            "- Department: [[Departments/{}|{}]]\n",
            department.id, department.name
        )),
        None => md.push_str("- Department: _unassigned_\n"),
    }
    if let Some(eta) = issue.estimated_resolution {
        md.push_str(&format!("- Estimated resolution: `{}`\n", render::display_date(eta)));
    }
    if let Some(done) = issue.actual_resolution {
        md.push_str(&format!("- Resolved: `{}`\n", render::display_date(done)));
    }
    md.push('\n');

    md.push_str("## Description\n");
    md.push_str(&issue.description);
    md.push('\n');

    fs::write(note_path, md)?;
    Ok(())
}

fn write_department_note(
    paths: &VaultPaths,
    department: &Department,
    data: &Dataset,
) -> Result<()> {
    let note_path = note_file(&paths.departments_dir, &department.id)?;
    let performance = &department.performance;
    let percent = ranking::resolution_percent(performance);

    let mut md = String::new();
    md.push_str("---\n");
    md.push_str(&format!("id: \"{}\"\n", department.id));
    md.push_str(&format!("type: {}\n", department.kind));
    md.push_str(&format!("resolution_percent: {}\n", percent));
    md.push_str("---\n\n");

    md.push_str(&format!("# {}\n\n", department.name));

    md.push_str("## Contact\n");
    md.push_str(&format!("- Email: {}\n", department.contact_info.email));
    md.push_str(&format!("- Phone: {}\n\n", department.contact_info.phone));

    md.push_str("## Performance\n");
    md.push_str(&format!(
        "- Resolved: {}/{} ({}%)\n",
        performance.resolved, performance.total_assigned, percent
    ));
    md.push_str(&format!("- Avg response: {}h\n", performance.avg_response_time));
    md.push_str(&format!(
        "- Rating: {} {:.1}\n\n",
        render::stars(performance.rating),
        performance.rating
    ));

    md.push_str("## News\n");
    let related = news_for_department(&data.news, &department.id);
    if related.is_empty() {
        md.push_str("_No news for this department._\n");
    } else {
        for item in related {
            md.push_str(&format!("- [[News/{}|{}]]\n", item.id, item.title));
        }
    }

    fs::write(note_path, md)?;
    Ok(())
}

fn write_news_note(paths: &VaultPaths, item: &NewsItem) -> Result<()> {
    let note_path = note_file(&paths.news_dir, &item.id)?;

    let mut md = String::new();
    md.push_str("---\n");
    md.push_str(&format!("id: \"{}\"\n", item.id));
    md.push_str(&format!("type: {}\n", item.kind));
    md.push_str(&format!("published_at: {}\n", render::display_date(item.published_at)));
    md.push_str("---\n\n");

    md.push_str(&format!("# {}\n\n", item.title));
    if let Some(department_id) = &item.department_id {
        md.push_str(&format!("- Department: [[Departments/{department_id}]]\n"));
    }
    if let Some(issue_id) = &item.related_issue_id {
        md.push_str(&format!("- Related issue: [[Issues/{issue_id}]]\n"));
    }
    if let Some(image) = &item.image {
        md.push_str(&format!("\n![]({image})\n"));
    }
    md.push('\n');
    md.push_str(&item.content);
    md.push('\n');

    fs::write(note_path, md)?;
    Ok(())
}

fn indent_yaml_block(s: &str) -> String {
    // YAML block scalars need every line indented
    let mut out = String::new();
    for line in s.lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    out
}
