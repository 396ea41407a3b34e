use crate::schema::{Department, Performance};
use serde::Serialize;

pub const MAX_STARS: u8 = 5;

/// Share of assigned issues that were resolved, in `[0, 1]`.
///
/// A department with nothing assigned has a rate of zero. The ratio is never
/// NaN, so it is safe to sort on and to average.
pub fn resolution_rate(performance: &Performance) -> f64 {
    if performance.total_assigned == 0 {
        return 0.0;
    }
    let rate = f64::from(performance.resolved) / f64::from(performance.total_assigned);
    clamp_score(rate, 0.0, 1.0)
}

/// Whole-number percentage as shown on the leaderboard.
pub fn resolution_percent(performance: &Performance) -> u32 {
    round_score(resolution_rate(performance) * 100.0, 0) as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl PerformanceTier {
    pub fn from_percent(percent: u32) -> Self {
        match percent {
            90.. => PerformanceTier::Excellent,
            75..=89 => PerformanceTier::Good,
            60..=74 => PerformanceTier::Fair,
            _ => PerformanceTier::Poor,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceTier::Excellent => "excellent",
            PerformanceTier::Good => "good",
            PerformanceTier::Fair => "fair",
            PerformanceTier::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(Medal::Gold),
            2 => Some(Medal::Silver),
            3 => Some(Medal::Bronze),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedDepartment<'a> {
    pub rank: usize,
    pub department: &'a Department,
    pub resolution_rate: f64,
    pub resolution_percent: u32,
    pub tier: PerformanceTier,
    pub medal: Option<Medal>,
}

/// Departments ordered by resolution rate, highest first. Equal rates keep
/// their input order.
pub fn rank_departments(departments: &[Department]) -> Vec<RankedDepartment<'_>> {
    let mut scored: Vec<(&Department, f64)> = departments
        .iter()
        .map(|department| (department, resolution_rate(&department.performance)))
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .enumerate()
        .map(|(index, (department, rate))| {
            let rank = index + 1;
            let percent = resolution_percent(&department.performance);
            RankedDepartment {
                rank,
                department,
                resolution_rate: rate,
                resolution_percent: percent,
                tier: PerformanceTier::from_percent(percent),
                medal: Medal::for_rank(rank),
            }
        })
        .collect()
}

/// Filled stars for a rating: `floor(rating)` within `0..=5`.
pub fn star_rating(rating: f64) -> u8 {
    clamp_score(rating, 0.0, f64::from(MAX_STARS)).floor() as u8
}

/// Lowest average response time. The first department wins a tie.
pub fn fastest_response(departments: &[Department]) -> Option<&Department> {
    first_best(departments, responds_faster)
}

/// Highest resolved count. The first department wins a tie.
pub fn most_resolved(departments: &[Department]) -> Option<&Department> {
    first_best(departments, resolved_more)
}

/// Highest rating. The first department wins a tie.
pub fn best_rated(departments: &[Department]) -> Option<&Department> {
    first_best(departments, rated_higher)
}

fn responds_faster(candidate: &Department, best: &Department) -> bool {
    candidate.performance.avg_response_time < best.performance.avg_response_time
}

fn resolved_more(candidate: &Department, best: &Department) -> bool {
    candidate.performance.resolved > best.performance.resolved
}

fn rated_higher(candidate: &Department, best: &Department) -> bool {
    candidate.performance.rating > best.performance.rating
}

// Replaces the current pick only on a strict improvement.
fn first_best<'a, I>(
    departments: I,
    beats: fn(&Department, &Department) -> bool,
) -> Option<&'a Department>
where
    I: IntoIterator<Item = &'a Department>,
{
    departments
        .into_iter()
        .fold(None, |best, candidate| match best {
            Some(current) if !beats(candidate, current) => Some(current),
            _ => Some(candidate),
        })
}

#[derive(Debug, Clone, Serialize)]
pub struct Achievements<'a> {
    pub fastest_response: Option<&'a Department>,
    pub most_resolved: Option<&'a Department>,
    pub best_rated: Option<&'a Department>,
}

/// Leaderboard highlights, picked over the ranked order.
pub fn achievements<'a>(ranked: &[RankedDepartment<'a>]) -> Achievements<'a> {
    let ordered = || ranked.iter().map(|entry| entry.department);

    Achievements {
        fastest_response: first_best(ordered(), responds_faster),
        most_resolved: first_best(ordered(), resolved_more),
        best_rated: first_best(ordered(), rated_higher),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentSummary {
    pub department_count: usize,
    pub total_resolved: u64,
    /// Mean of the per-department percentages, not a ratio of sums.
    pub mean_resolution_percent: f64,
    pub mean_response_hours: f64,
}

pub fn department_summary(departments: &[Department]) -> DepartmentSummary {
    let department_count = departments.len();
    let total_resolved = departments
        .iter()
        .map(|department| u64::from(department.performance.resolved))
        .sum();

    if department_count == 0 {
        return DepartmentSummary {
            department_count,
            total_resolved,
            mean_resolution_percent: 0.0,
            mean_response_hours: 0.0,
        };
    }

    let count = department_count as f64;
    let percent_sum: f64 = departments
        .iter()
        .map(|department| resolution_rate(&department.performance) * 100.0)
        .sum();
    let response_sum: f64 = departments
        .iter()
        .map(|department| department.performance.avg_response_time)
        .sum();

    DepartmentSummary {
        department_count,
        total_resolved,
        mean_resolution_percent: percent_sum / count,
        mean_response_hours: response_sum / count,
    }
}

pub fn clamp_score(value: f64, floor: f64, ceiling: f64) -> f64 {
    value.max(floor).min(ceiling)
}

pub fn round_score(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
