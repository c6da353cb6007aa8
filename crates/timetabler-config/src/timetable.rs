//! Timetable rules.
//!
//! # Environment Variables
//!
//! - `TIMETABLE_PERIODS`: comma-separated period labels in teaching order
//!   (default: the five standard periods)
//! - `TIMETABLE_COMMIT_POLICY`: `best-effort` (default) or `serialized`

use std::env;
use std::str::FromStr;

use crate::env_or;

pub const DEFAULT_PERIODS: [&str; 5] = [
    "8:45-9:45",
    "9:45-10:45",
    "11:00-12:00",
    "12:00-1:00",
    "2:00-3:00",
];

/// How a slot write is ordered against concurrent writers.
///
/// `BestEffort` scans and then commits with no lock, so two admins adding the same
/// teacher at the same time can both pass the scan. `Serialized` holds a per-year lock
/// inside this process from scan to commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CommitPolicy {
    #[default]
    BestEffort,
    Serialized,
}

impl FromStr for CommitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best-effort" | "best_effort" => Ok(CommitPolicy::BestEffort),
            "serialized" => Ok(CommitPolicy::Serialized),
            other => Err(format!("unknown commit policy: {other}")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimetableConfig {
    pub periods: Vec<String>,
    pub commit_policy: CommitPolicy,
}

impl TimetableConfig {
    pub fn from_env() -> Self {
        let periods = env::var("TIMETABLE_PERIODS")
            .map(|raw| parse_periods(&raw))
            .ok()
            .filter(|periods| !periods.is_empty())
            .unwrap_or_else(default_periods);

        Self {
            periods,
            commit_policy: env_or("TIMETABLE_COMMIT_POLICY", CommitPolicy::BestEffort),
        }
    }

    pub fn with_commit_policy(mut self, commit_policy: CommitPolicy) -> Self {
        self.commit_policy = commit_policy;
        self
    }
}

impl Default for TimetableConfig {
    fn default() -> Self {
        Self {
            periods: default_periods(),
            commit_policy: CommitPolicy::BestEffort,
        }
    }
}

fn default_periods() -> Vec<String> {
    DEFAULT_PERIODS.iter().map(|p| p.to_string()).collect()
}

pub fn parse_periods(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}
