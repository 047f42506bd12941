//! Per-day commit counts for the trailing week of a git repository.
use std::collections::HashMap;
use std::path::Path;

use chrono::{Duration, Local, NaiveDate};
use tokio::process::Command;

use crate::error::{AppError, AppResult};

pub const WEEK_DAYS: i64 = 7;

/// Commits made on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u32,
}

impl DailyCount {
    pub fn new(date: NaiveDate, count: u32) -> Self {
        DailyCount { date, count }
    }
}

/// Run `git log` in `repo` and tally the last seven days, today included.
pub async fn collect_last_week(repo: &Path) -> AppResult<Vec<DailyCount>> {
    let output = Command::new("git")
        .args(["log", "--since=7 days ago", "--date=short", "--pretty=format:%ad"])
        .current_dir(repo)
        .output()
        .await
        .map_err(|e| AppError::Git(format!("cannot run git in {}: {}", repo.display(), e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(AppError::Git(stderr));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let week = tally_week(&stdout, Local::now().date_naive());
    tracing::debug!(repo = %repo.display(), total = week.iter().map(|d| d.count).sum::<u32>(), "Collected commit counts");
    Ok(week)
}

/// Count one line per commit date; return `today-6 ..= today`, oldest first.
///
/// Days without commits are zero-filled and dates outside the window ignored.
pub fn tally_week(log_output: &str, today: NaiveDate) -> Vec<DailyCount> {
    let mut counts: HashMap<NaiveDate, u32> = HashMap::new();
    for line in log_output.lines() {
        if let Ok(date) = NaiveDate::parse_from_str(line.trim(), "%Y-%m-%d") {
            *counts.entry(date).or_insert(0) += 1;
        }
    }
    (0..WEEK_DAYS)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            DailyCount::new(date, counts.get(&date).copied().unwrap_or(0))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn week_is_seven_days_oldest_first() {
        let week = tally_week("", day("2024-01-07"));
        assert_eq!(week.len(), 7);
        assert_eq!(week[0].date, day("2024-01-01"));
        assert_eq!(week[6].date, day("2024-01-07"));
        assert!(week.iter().all(|d| d.count == 0));
    }

    #[test]
    fn counts_commits_per_day() {
        let log = "2024-01-07\n2024-01-07\n2024-01-03\n\n2024-01-01\n";
        let week = tally_week(log, day("2024-01-07"));
        let counts: Vec<u32> = week.iter().map(|d| d.count).collect();
        assert_eq!(counts, vec![1, 0, 1, 0, 0, 0, 2]);
    }

    #[test]
    fn ignores_dates_outside_window_and_noise() {
        let log = "2023-12-31\nnot-a-date\n2024-01-05";
        let week = tally_week(log, day("2024-01-07"));
        assert_eq!(week.iter().map(|d| d.count).sum::<u32>(), 1);
        assert_eq!(week[4], DailyCount::new(day("2024-01-05"), 1));
    }

    #[test]
    fn window_crosses_month_boundary() {
        let week = tally_week("2024-02-28\n2024-03-01", day("2024-03-02"));
        assert_eq!(week[0].date, day("2024-02-25"));
        assert_eq!(week[3].count, 1);
        assert_eq!(week[5].count, 1);
    }
}
