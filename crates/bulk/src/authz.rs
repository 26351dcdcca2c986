//! Who may acknowledge or resolve which incident.

use std::collections::HashSet;

use pd_buddy_api::models::{Incident, User};

/// Opt-in flags widening what the caller may update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdatePolicy {
    /// `--allow-team`: incidents owned by one of my teams but not assigned to me.
    pub allow_team: bool,
    /// `--allow-all-teams-i-know-this-is-dangerous`: any incident at all.
    pub allow_all_teams: bool,
}

/// Why an update was permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    AssignedToMe,
    AssignedToMyTeam,
    AllTeams,
}

/// Why an update was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    NotMineOrMyTeams,
    TeamFlagMissing,
}

/// The caller's identity as far as authorization is concerned.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub team_ids: HashSet<String>,
}

impl Caller {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id.clone(),
            team_ids: user.team_ids().map(str::to_string).collect(),
        }
    }

    /// Direct assignment always wins, team ownership needs `allow_team`, and
    /// `allow_all_teams` permits anything left over.
    pub fn authorize(&self, incident: &Incident, policy: UpdatePolicy) -> Result<Grant, Denial> {
        let assigned_to_me = incident.is_assigned_to(&self.user_id);
        let assigned_to_my_team = incident.belongs_to_any(&self.team_ids);

        if assigned_to_me {
            Ok(Grant::AssignedToMe)
        } else if assigned_to_my_team && policy.allow_team {
            Ok(Grant::AssignedToMyTeam)
        } else if policy.allow_all_teams {
            Ok(Grant::AllTeams)
        } else if assigned_to_my_team {
            Err(Denial::TeamFlagMissing)
        } else {
            Err(Denial::NotMineOrMyTeams)
        }
    }
}
