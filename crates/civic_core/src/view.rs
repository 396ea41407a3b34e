use crate::schema::ParseTagError;
use crate::source::DataSource;
use std::fmt;
use std::str::FromStr;

/// The dashboard screens. Exactly one is current at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum View {
    #[default]
    Dashboard,
    Report,
    Leaderboard,
    News,
}

impl View {
    pub const ALL: &'static [View] = &[
        View::Dashboard,
        View::Report,
        View::Leaderboard,
        View::News,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Report => "report",
            View::Leaderboard => "leaderboard",
            View::News => "news",
        }
    }

    /// Unknown names fall back to the dashboard.
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = ParseTagError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        View::ALL
            .iter()
            .copied()
            .find(|view| view.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| ParseTagError {
                kind: "view",
                value: value.to_string(),
            })
    }
}

/// Top-level controller: owns the data source and the current view.
pub struct Dashboard<S> {
    source: S,
    view: View,
}

impl<S: DataSource> Dashboard<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            view: View::default(),
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// Makes `view` current and returns the one it replaced.
    pub fn switch_to(&mut self, view: View) -> View {
        std::mem::replace(&mut self.view, view)
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::source::MemorySource;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Leaderboard".parse::<View>(), Ok(View::Leaderboard));
        assert!("settings".parse::<View>().is_err());
        assert_eq!(View::parse_or_default("settings"), View::Dashboard);
    }

    #[test]
    fn controller_starts_on_dashboard_and_switches() {
        let source = MemorySource::new(Dataset::builtin().unwrap());
        let mut dashboard = Dashboard::new(source);
        assert_eq!(dashboard.view(), View::Dashboard);

        let previous = dashboard.switch_to(View::News);
        assert_eq!(previous, View::Dashboard);
        assert_eq!(dashboard.view(), View::News);
        assert_eq!(dashboard.source().list_news().unwrap().len(), 3);
    }
}
