use crate::schema::{Department, Issue, NewsItem};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const BUILTIN_ISSUES: &str = include_str!("../data/issues.yaml");
const BUILTIN_DEPARTMENTS: &str = include_str!("../data/departments.yaml");
const BUILTIN_NEWS: &str = include_str!("../data/news.yaml");

/// The three collections a dashboard is built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub issues: Vec<Issue>,
    pub departments: Vec<Department>,
    pub news: Vec<NewsItem>,
}

#[derive(Debug, Deserialize)]
struct IssuesFile {
    issues: Vec<Issue>,
}

#[derive(Debug, Deserialize)]
struct DepartmentsFile {
    departments: Vec<Department>,
}

#[derive(Debug, Deserialize)]
struct NewsFile {
    news: Vec<NewsItem>,
}

impl Dataset {
    /// Sample city data shipped with the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_yaml(BUILTIN_ISSUES, BUILTIN_DEPARTMENTS, BUILTIN_NEWS)
    }

    /// Reads `issues.yaml`, `departments.yaml` and `news.yaml` from `path`.
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let issues_path = path.join("issues.yaml");
        let issues_str = fs::read_to_string(&issues_path)
            .with_context(|| format!("reading {}", issues_path.display()))?;

        let departments_path = path.join("departments.yaml");
        let departments_str = fs::read_to_string(&departments_path)
            .with_context(|| format!("reading {}", departments_path.display()))?;

        let news_path = path.join("news.yaml");
        let news_str = fs::read_to_string(&news_path)
            .with_context(|| format!("reading {}", news_path.display()))?;

        Self::from_yaml(&issues_str, &departments_str, &news_str)
    }

    fn from_yaml(issues: &str, departments: &str, news: &str) -> Result<Self> {
        let issues: IssuesFile = serde_yaml::from_str(issues).context("parsing issues")?;
        let departments: DepartmentsFile =
            serde_yaml::from_str(departments).context("parsing departments")?;
        let news: NewsFile = serde_yaml::from_str(news).context("parsing news")?;

        Ok(Self {
            issues: issues.issues,
            departments: departments.departments,
            news: news.news,
        })
    }

    pub fn department(&self, id: &str) -> Option<&Department> {
        self.departments.iter().find(|department| department.id == id)
    }
}
