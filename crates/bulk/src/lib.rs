use std::io;

use pd_buddy_api::error::ApiError;
use pd_buddy_api::models::{Incident, IncidentStatus};
use pd_buddy_api::PagerDuty;
use thiserror::Error;
use tracing::{debug, info};

pub mod authz;
pub mod prompt;

pub use authz::{Caller, Denial, Grant, UpdatePolicy};
pub use prompt::{Confirm, StdinConfirm, UPDATE_QUESTION};

#[derive(Error, Debug)]
pub enum BulkError {
    #[error("failed to get current user")]
    CurrentUser(#[source] ApiError),

    #[error("failed to fetch incident {reference}")]
    Fetch {
        reference: String,
        #[source]
        source: ApiError,
    },

    #[error("incident {reference} {summary} is not assigned to me or my team")]
    NotMineOrMyTeams { reference: String, summary: String },

    /// Earlier releases phrased this as "is not assigned to my team but no
    /// --allow-team flag specified", although the incident is on one of my teams.
    #[error(
        "incident {reference} {summary} is assigned to my team but --allow-team was not specified"
    )]
    TeamFlagMissing { reference: String, summary: String },

    #[error("failed to read confirmation")]
    Prompt(#[from] io::Error),

    #[error("Aborting: update of incident {reference} was not confirmed")]
    Aborted { reference: String },

    #[error("failed to update incident {reference}")]
    Update {
        reference: String,
        #[source]
        source: ApiError,
    },
}

impl BulkError {
    fn denied(denial: Denial, reference: &str, incident: &Incident) -> Self {
        let reference = reference.to_string();
        let summary = incident.summary.clone();
        match denial {
            Denial::NotMineOrMyTeams => BulkError::NotMineOrMyTeams { reference, summary },
            Denial::TeamFlagMissing => BulkError::TeamFlagMissing { reference, summary },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedIncident {
    /// ID or number as given on the command line.
    pub reference: String,
    pub id: String,
    pub incident_number: u64,
    pub previous: IncidentStatus,
    pub status: IncidentStatus,
    pub grant: Grant,
}

/// Moves incidents to a new status one at a time, checking authorization and
/// asking for confirmation before each change. The first failure, denial or
/// declined prompt ends the batch; later incidents are left untouched.
pub struct BulkUpdater<'a, C: ?Sized, P> {
    client: &'a C,
    prompt: P,
    policy: UpdatePolicy,
    skip_confirm: bool,
}

impl<'a, C, P> BulkUpdater<'a, C, P>
where
    C: PagerDuty + ?Sized,
    P: Confirm,
{
    pub fn new(client: &'a C, prompt: P) -> Self {
        Self {
            client,
            prompt,
            policy: UpdatePolicy::default(),
            skip_confirm: false,
        }
    }

    pub fn with_policy(mut self, policy: UpdatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn skip_confirmation(mut self, skip: bool) -> Self {
        self.skip_confirm = skip;
        self
    }

    pub async fn run(
        &mut self,
        target: IncidentStatus,
        references: &[String],
    ) -> Result<Vec<UpdatedIncident>, BulkError> {
        if references.is_empty() {
            debug!("No incidents to update");
            return Ok(Vec::new());
        }

        let me = self
            .client
            .current_user()
            .await
            .map_err(BulkError::CurrentUser)?;
        let caller = Caller::from_user(&me);

        info!(
            total = references.len(),
            status = %target,
            "Starting bulk status update"
        );

        let mut updated = Vec::with_capacity(references.len());
        for reference in references {
            let incident = self
                .client
                .get_incident(reference)
                .await
                .map_err(|source| BulkError::Fetch {
                    reference: reference.clone(),
                    source,
                })?;

            let grant = caller
                .authorize(&incident, self.policy)
                .map_err(|denial| BulkError::denied(denial, reference, &incident))?;
            debug!(incident = %reference, ?grant, "Update permitted");

            if !self.skip_confirm {
                let preview = format!(
                    "{}\n\n{} => {}\n\n",
                    incident.summary_line(),
                    incident.status,
                    target
                );
                if !self.prompt.confirm(&preview, UPDATE_QUESTION)? {
                    return Err(BulkError::Aborted {
                        reference: reference.clone(),
                    });
                }
            }

            self.client
                .update_incident_status(&me.email, &incident.id, target)
                .await
                .map_err(|source| BulkError::Update {
                    reference: reference.clone(),
                    source,
                })?;

            info!(
                incident = %reference,
                number = incident.incident_number,
                from = %incident.status,
                to = %target,
                "Incident updated"
            );

            updated.push(UpdatedIncident {
                reference: reference.clone(),
                id: incident.id,
                incident_number: incident.incident_number,
                previous: incident.status,
                status: target,
                grant,
            });
        }

        Ok(updated)
    }
}
