use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use futures::StreamExt;
use pd_buddy_api::models::{Schedule, ScheduleWindow};
use pd_buddy_api::pagination::{Paginator, PAGE_SIZE};
use pd_buddy_api::{PagerDuty, PagerDutyClient, SchedulePages};
use pd_buddy_output::OutputRenderer;
use serde::Serialize;

#[derive(Args, Debug, Clone)]
pub struct ScheduleArgs {
    #[command(subcommand)]
    command: ScheduleCommands,
}

#[derive(Subcommand, Debug, Clone)]
enum ScheduleCommands {
    /// List schedules I am a member of
    List,
    /// Show who is on call from yesterday through the next seven days
    Show {
        /// Schedule ID
        id: String,
    },
}

pub struct ScheduleContext<'a> {
    pub client: PagerDutyClient,
    pub renderer: &'a OutputRenderer,
}

pub async fn execute(args: ScheduleArgs, ctx: ScheduleContext<'_>) -> Result<()> {
    match args.command {
        ScheduleCommands::List => list_schedules(&ctx).await,
        ScheduleCommands::Show { id } => show_schedule(&ctx, &id).await,
    }
}

async fn list_schedules(ctx: &ScheduleContext<'_>) -> Result<()> {
    let me = ctx
        .client
        .current_user()
        .await
        .context("Failed to get current user")?;

    let pages = SchedulePages::new(&ctx.client);
    let mut stream = pages.stream(PAGE_SIZE);
    let mut mine: Vec<Schedule> = Vec::new();

    while let Some(page) = stream.next().await {
        let page = page.context("Failed to list schedules")?;
        mine.extend(page.into_iter().filter(|schedule| schedule.has_member(&me.id)));
    }

    if mine.is_empty() {
        tracing::info!("Not a member of any schedule.");
        return Ok(());
    }

    #[derive(Serialize)]
    struct Row<'a> {
        id: &'a str,
        name: &'a str,
    }

    let rows: Vec<Row<'_>> = mine
        .iter()
        .map(|schedule| Row {
            id: schedule.id.as_str(),
            name: schedule.name.as_str(),
        })
        .collect();

    ctx.renderer.render(&rows)
}

async fn show_schedule(ctx: &ScheduleContext<'_>, id: &str) -> Result<()> {
    let window = ScheduleWindow::around(Utc::now());
    tracing::debug!(since = %window.since, until = %window.until, "Rendering schedule");

    let schedule = ctx
        .client
        .get_schedule(id, &window)
        .await
        .with_context(|| format!("Failed to fetch schedule {id}"))?;

    #[derive(Serialize)]
    struct Row<'a> {
        start: &'a str,
        end: &'a str,
        user: &'a str,
    }

    let rows: Vec<Row<'_>> = schedule
        .entries()
        .iter()
        .map(|entry| Row {
            start: entry.start.as_str(),
            end: entry.end.as_str(),
            user: entry.user.summary.as_str(),
        })
        .collect();

    if rows.is_empty() {
        tracing::info!(schedule = %id, "No on-call entries in the window.");
        return Ok(());
    }

    ctx.renderer.render(&rows)
}
