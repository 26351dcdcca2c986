use anyhow::{ensure, Context, Result};
use clap::{Args, Subcommand};
use pd_buddy_api::models::{Incident, IncidentQuery, IncidentStatus, Scope, StatusFilter};
use pd_buddy_api::pagination::{Paginator, PAGE_SIZE};
use pd_buddy_api::{IncidentPages, PagerDuty, PagerDutyClient};
use pd_buddy_bulk::{BulkUpdater, StdinConfirm, UpdatePolicy};
use pd_buddy_output::OutputRenderer;
use serde::Serialize;

#[derive(Args, Debug, Clone)]
pub struct IncidentArgs {
    #[command(subcommand)]
    command: IncidentCommands,
}

#[derive(Subcommand, Debug, Clone)]
enum IncidentCommands {
    /// List incidents assigned to me or my teams
    List {
        /// Limit to my incidents or my teams' incidents (me|team)
        #[arg(long, default_value = "me")]
        scope: Scope,

        /// Comma separated list of statuses to limit to (triggered,acknowledged,resolved)
        #[arg(long, default_value = "triggered,acknowledged")]
        status: StatusFilter,
    },

    /// Acknowledge incidents
    Ack(UpdateArgs),

    /// Resolve incidents
    Resolve(UpdateArgs),
}

#[derive(Args, Debug, Clone)]
struct UpdateArgs {
    /// Incident IDs or numbers
    #[arg(value_name = "INCIDENT", required = true)]
    incidents: Vec<String>,

    /// Allow updating incidents for my team that are not assigned to me
    #[arg(long)]
    allow_team: bool,

    /// Allow updating incidents for other teams (dangerous!)
    #[arg(long = "allow-all-teams-i-know-this-is-dangerous")]
    allow_all_teams: bool,

    /// Don't prompt for confirmation before updating
    #[arg(short, long)]
    yes: bool,
}

impl UpdateArgs {
    fn policy(&self) -> UpdatePolicy {
        UpdatePolicy {
            allow_team: self.allow_team,
            allow_all_teams: self.allow_all_teams,
        }
    }
}

pub struct IncidentContext<'a> {
    pub client: PagerDutyClient,
    pub renderer: &'a OutputRenderer,
}

pub async fn execute(args: IncidentArgs, ctx: IncidentContext<'_>) -> Result<()> {
    match args.command {
        IncidentCommands::List { scope, status } => list_incidents(&ctx, scope, status).await,
        IncidentCommands::Ack(update) => {
            update_incidents(&ctx, IncidentStatus::Acknowledged, update).await
        }
        IncidentCommands::Resolve(update) => {
            update_incidents(&ctx, IncidentStatus::Resolved, update).await
        }
    }
}

#[derive(Serialize)]
struct Row<'a> {
    created_at: &'a str,
    number: u64,
    status: IncidentStatus,
    assignee: &'a str,
    description: &'a str,
}

impl<'a> From<&'a Incident> for Row<'a> {
    fn from(incident: &'a Incident) -> Self {
        Row {
            created_at: incident.created_at.as_str(),
            number: incident.incident_number,
            status: incident.status,
            assignee: incident.first_assignee().unwrap_or(""),
            description: incident.description.as_str(),
        }
    }
}

async fn list_incidents(
    ctx: &IncidentContext<'_>,
    scope: Scope,
    status: StatusFilter,
) -> Result<()> {
    let me = ctx
        .client
        .current_user()
        .await
        .context("Failed to get current user")?;

    if scope == Scope::Team {
        ensure!(
            !me.teams.is_empty(),
            "{} is not a member of any team, nothing to list for --scope team",
            me.email
        );
    }

    let query = IncidentQuery::for_scope(scope, &me).with_statuses(status);
    tracing::debug!(?query, "Listing incidents");

    let incidents = IncidentPages::new(&ctx.client, &query)
        .fetch_all(PAGE_SIZE)
        .await
        .context("Failed to list incidents")?;

    if incidents.is_empty() {
        tracing::info!(%scope, "No incidents matched.");
        return Ok(());
    }

    let rows: Vec<Row<'_>> = incidents.iter().map(Row::from).collect();
    ctx.renderer.render(&rows)
}

async fn update_incidents(
    ctx: &IncidentContext<'_>,
    target: IncidentStatus,
    args: UpdateArgs,
) -> Result<()> {
    let policy = args.policy();
    if policy.allow_all_teams {
        tracing::warn!("Team ownership checks disabled by --allow-all-teams-i-know-this-is-dangerous");
    }

    let updated = BulkUpdater::new(&ctx.client, StdinConfirm)
        .with_policy(policy)
        .skip_confirmation(args.yes)
        .run(target, &args.incidents)
        .await?;

    tracing::info!(count = updated.len(), status = %target, "All incidents updated");
    Ok(())
}
