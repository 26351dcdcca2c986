use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;
use url::form_urlencoded;

use crate::error::Result;
use crate::models::{Incident, IncidentQuery, IncidentStatus, Schedule, ScheduleWindow, User};
use crate::pagination::{Page, PageInfo, Paginator};
use crate::ApiClient;

pub const DEFAULT_BASE_URL: &str = "https://api.pagerduty.com";

/// The PagerDuty operations pd-buddy relies on.
#[async_trait]
pub trait PagerDuty: Send + Sync {
    async fn current_user(&self) -> Result<User>;

    async fn list_incidents(
        &self,
        query: &IncidentQuery,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Incident>>;

    /// Accepts either the incident ID or its number.
    async fn get_incident(&self, reference: &str) -> Result<Incident>;

    /// Moves a single incident to `status`, attributed to the user with email `from`.
    async fn update_incident_status(
        &self,
        from: &str,
        incident_id: &str,
        status: IncidentStatus,
    ) -> Result<()>;

    async fn list_schedules(&self, offset: u32, limit: u32) -> Result<Page<Schedule>>;

    async fn get_schedule(&self, id: &str, window: &ScheduleWindow) -> Result<Schedule>;
}

#[derive(Clone)]
pub struct PagerDutyClient {
    api: ApiClient,
}

impl PagerDutyClient {
    pub fn new(base_url: impl AsRef<str>, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(base_url)?.with_token(token),
        })
    }
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct IncidentEnvelope {
    incident: Incident,
}

#[derive(Deserialize)]
struct ScheduleEnvelope {
    schedule: Schedule,
}

#[derive(Deserialize)]
struct IncidentList {
    #[serde(default)]
    incidents: Vec<Incident>,
    #[serde(flatten)]
    page: PageInfo,
}

#[derive(Deserialize)]
struct ScheduleList {
    #[serde(default)]
    schedules: Vec<Schedule>,
    #[serde(flatten)]
    page: PageInfo,
}

fn paged_query(offset: u32, limit: u32) -> form_urlencoded::Serializer<'static, String> {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer
        .append_pair("limit", &limit.to_string())
        .append_pair("offset", &offset.to_string());
    serializer
}

/// Characters escaped inside a single URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn path_segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT).to_string()
}

#[async_trait]
impl PagerDuty for PagerDutyClient {
    async fn current_user(&self) -> Result<User> {
        let envelope: UserEnvelope = self.api.get("/users/me").await?;
        debug!(user_id = %envelope.user.id, "Resolved current user");
        Ok(envelope.user)
    }

    async fn list_incidents(
        &self,
        query: &IncidentQuery,
        offset: u32,
        limit: u32,
    ) -> Result<Page<Incident>> {
        let path = {
            let mut serializer = paged_query(offset, limit);
            for (key, value) in query.query_pairs() {
                serializer.append_pair(key, &value);
            }
            format!("/incidents?{}", serializer.finish())
        };

        let list: IncidentList = self.api.get(&path).await?;
        Ok(Page::new(list.incidents, list.page))
    }

    async fn get_incident(&self, reference: &str) -> Result<Incident> {
        let path = format!("/incidents/{}", path_segment(reference));
        let envelope: IncidentEnvelope = self.api.get(&path).await?;
        Ok(envelope.incident)
    }

    async fn update_incident_status(
        &self,
        from: &str,
        incident_id: &str,
        status: IncidentStatus,
    ) -> Result<()> {
        let payload = json!({
            "incidents": [{
                "id": incident_id,
                "type": "incident_reference",
                "status": status,
            }]
        });

        let _: Value = self.api.put_from("/incidents", &payload, from).await?;
        Ok(())
    }

    async fn list_schedules(&self, offset: u32, limit: u32) -> Result<Page<Schedule>> {
        let path = format!("/schedules?{}", paged_query(offset, limit).finish());
        let list: ScheduleList = self.api.get(&path).await?;
        Ok(Page::new(list.schedules, list.page))
    }

    async fn get_schedule(&self, id: &str, window: &ScheduleWindow) -> Result<Schedule> {
        let path = {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (key, value) in window.query_pairs() {
                serializer.append_pair(key, &value);
            }
            format!("/schedules/{}?{}", path_segment(id), serializer.finish())
        };

        let envelope: ScheduleEnvelope = self.api.get(&path).await?;
        Ok(envelope.schedule)
    }
}

/// Walks `GET /incidents` for a fixed query.
pub struct IncidentPages<'a, C: ?Sized> {
    client: &'a C,
    query: &'a IncidentQuery,
}

impl<'a, C: ?Sized> IncidentPages<'a, C> {
    pub fn new(client: &'a C, query: &'a IncidentQuery) -> Self {
        Self { client, query }
    }
}

#[async_trait]
impl<'a, C> Paginator<Incident> for IncidentPages<'a, C>
where
    C: PagerDuty + ?Sized,
{
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Page<Incident>> {
        self.client.list_incidents(self.query, offset, limit).await
    }
}

/// Walks `GET /schedules`.
pub struct SchedulePages<'a, C: ?Sized> {
    client: &'a C,
}

impl<'a, C: ?Sized> SchedulePages<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<'a, C> Paginator<Schedule> for SchedulePages<'a, C>
where
    C: PagerDuty + ?Sized,
{
    async fn fetch_page(&self, offset: u32, limit: u32) -> Result<Page<Schedule>> {
        self.client.list_schedules(offset, limit).await
    }
}
