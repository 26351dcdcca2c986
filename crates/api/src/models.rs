//! PagerDuty resources consumed by pd-buddy, plus the query types built from
//! command-line input.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Time zone every schedule is rendered in.
pub const SCHEDULE_TIME_ZONE: &str = "America/Los_Angeles";

/// Reference to another PagerDuty object (user, team, assignee).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reference {
    pub id: String,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub teams: Vec<Reference>,
}

impl User {
    pub fn team_ids(&self) -> impl Iterator<Item = &str> {
        self.teams.iter().map(|team| team.id.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Triggered,
    Acknowledged,
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentStatus::Triggered => "triggered",
            IncidentStatus::Acknowledged => "acknowledged",
            IncidentStatus::Resolved => "resolved",
        }
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid status '{0}', must be one of triggered, acknowledged, resolved")]
pub struct ParseStatusError(String);

impl FromStr for IncidentStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "triggered" => Ok(IncidentStatus::Triggered),
            "acknowledged" => Ok(IncidentStatus::Acknowledged),
            "resolved" => Ok(IncidentStatus::Resolved),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Comma separated status list as accepted by `--status`. An empty string
/// disables status filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusFilter(pub Vec<IncidentStatus>);

impl FromStr for StatusFilter {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Ok(StatusFilter::default());
        }

        s.split(',')
            .map(str::parse)
            .collect::<Result<Vec<_>, _>>()
            .map(StatusFilter)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub assignee: Reference,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub incident_number: u64,
    pub status: IncidentStatus,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub teams: Vec<Reference>,
}

impl Incident {
    /// Summary of the first assignee, if the incident is assigned at all.
    pub fn first_assignee(&self) -> Option<&str> {
        self.assignments
            .first()
            .map(|assignment| assignment.assignee.summary.as_str())
    }

    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assignments
            .iter()
            .any(|assignment| assignment.assignee.id == user_id)
    }

    pub fn belongs_to_any(&self, team_ids: &HashSet<String>) -> bool {
        self.teams.iter().any(|team| team_ids.contains(&team.id))
    }

    /// One-line rendering: `created_at number status assignee description`.
    pub fn summary_line(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.created_at,
            self.incident_number,
            self.status,
            self.first_assignee().unwrap_or(""),
            self.description
        )
    }
}

/// Which incidents `incident list` should look at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scope {
    #[default]
    Me,
    Team,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid scope '{0}', must be me|team")]
pub struct ParseScopeError(String);

impl FromStr for Scope {
    type Err = ParseScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "me" => Ok(Scope::Me),
            "team" => Ok(Scope::Team),
            other => Err(ParseScopeError(other.to_string())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Me => f.write_str("me"),
            Scope::Team => f.write_str("team"),
        }
    }
}

/// Filters for `GET /incidents`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentQuery {
    pub user_ids: Vec<String>,
    pub team_ids: Vec<String>,
    pub statuses: Vec<IncidentStatus>,
}

impl IncidentQuery {
    /// `Me` keys the query on the user's ID only, `Team` on every team the
    /// user belongs to.
    pub fn for_scope(scope: Scope, user: &User) -> Self {
        match scope {
            Scope::Me => Self {
                user_ids: vec![user.id.clone()],
                ..Default::default()
            },
            Scope::Team => Self {
                team_ids: user.team_ids().map(str::to_string).collect(),
                ..Default::default()
            },
        }
    }

    pub fn with_statuses(mut self, filter: StatusFilter) -> Self {
        self.statuses = filter.0;
        self
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        pairs.extend(self.user_ids.iter().map(|id| ("user_ids[]", id.clone())));
        pairs.extend(self.team_ids.iter().map(|id| ("team_ids[]", id.clone())));
        pairs.extend(
            self.statuses
                .iter()
                .map(|status| ("statuses[]", status.as_str().to_string())),
        );
        pairs
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub start: String,
    pub end: String,
    pub user: Reference,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderedSchedule {
    #[serde(default)]
    pub rendered_schedule_entries: Vec<ScheduleEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub users: Vec<Reference>,
    #[serde(default)]
    pub final_schedule: Option<RenderedSchedule>,
}

impl Schedule {
    pub fn has_member(&self, user_id: &str) -> bool {
        self.users.iter().any(|user| user.id == user_id)
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        self.final_schedule
            .as_ref()
            .map(|rendered| rendered.rendered_schedule_entries.as_slice())
            .unwrap_or_default()
    }
}

/// Time window a schedule is rendered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleWindow {
    pub time_zone: String,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
}

impl ScheduleWindow {
    /// From one day before `now` through seven days after it.
    pub fn around(now: DateTime<Utc>) -> Self {
        Self {
            time_zone: SCHEDULE_TIME_ZONE.to_string(),
            since: now - Duration::hours(24),
            until: now + Duration::days(7),
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("time_zone", self.time_zone.clone()),
            (
                "since",
                self.since.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            (
                "until",
                self.until.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
        ]
    }
}
