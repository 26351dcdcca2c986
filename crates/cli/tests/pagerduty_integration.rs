use chrono::{TimeZone, Utc};
use pd_buddy_api::error::ApiError;
use pd_buddy_api::models::{IncidentQuery, IncidentStatus, Scope, ScheduleWindow, User};
use pd_buddy_api::pagination::{Paginator, PAGE_SIZE};
use pd_buddy_api::{IncidentPages, PagerDuty, PagerDutyClient, SchedulePages};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> PagerDutyClient {
    PagerDutyClient::new(server.uri(), "fake-token").unwrap()
}

fn incident_json(id: &str, number: u64) -> serde_json::Value {
    json!({
        "id": id,
        "incident_number": number,
        "status": "triggered",
        "summary": format!("[#{number}] Incident {number}"),
        "description": format!("Incident {number}"),
        "created_at": "2026-10-15T08:00:00Z",
        "assignments": [{"assignee": {"id": "PUSER01", "summary": "Dana Ops"}}],
        "teams": [{"id": "PTEAM01", "summary": "Payments"}]
    })
}

fn me() -> User {
    serde_json::from_value(json!({
        "id": "PUSER01",
        "name": "Dana Ops",
        "email": "dana@example.com",
        "teams": [
            {"id": "PTEAM01", "summary": "Payments"},
            {"id": "PTEAM02", "summary": "Platform"}
        ]
    }))
    .unwrap()
}

#[tokio::test]
async fn test_current_user_sends_token_and_accept_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .and(header("Authorization", "Token token=fake-token"))
        .and(header("Accept", "application/vnd.pagerduty+json;version=2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user": {
                "id": "PUSER01",
                "name": "Dana Ops",
                "email": "dana@example.com",
                "teams": [{"id": "PTEAM01", "summary": "Payments"}]
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let user = client(&mock_server).current_user().await.unwrap();

    assert_eq!(user.id, "PUSER01");
    assert_eq!(user.email, "dana@example.com");
    assert_eq!(user.team_ids().collect::<Vec<_>>(), vec!["PTEAM01"]);
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication_failed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).current_user().await.unwrap_err();
    assert!(matches!(err, ApiError::AuthenticationFailed { .. }));
}

#[tokio::test]
async fn test_list_incidents_for_me_scope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/incidents"))
        .and(query_param("user_ids[]", "PUSER01"))
        .and(query_param("statuses[]", "triggered"))
        .and(query_param("limit", "100"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "incidents": [incident_json("Q1", 1), incident_json("Q2", 2)],
            "limit": 100,
            "offset": 0,
            "more": false,
            "total": null
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = client(&mock_server);
    let query = IncidentQuery::for_scope(Scope::Me, &me()).with_statuses("triggered".parse().unwrap());
    let page = api.list_incidents(&query, 0, PAGE_SIZE).await.unwrap();

    assert_eq!(page.items.len(), 2);
    assert!(!page.info.more);
    assert_eq!(page.items[1].incident_number, 2);
}

#[tokio::test]
async fn test_incident_pages_follow_offsets_until_no_more() {
    let mock_server = MockServer::start().await;

    let first: Vec<_> = (0..100).map(|n| incident_json(&format!("QA{n}"), n)).collect();
    let second: Vec<_> = (100..130)
        .map(|n| incident_json(&format!("QB{n}"), n))
        .collect();

    Mock::given(method("GET"))
        .and(path("/incidents"))
        .and(query_param("team_ids[]", "PTEAM02"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "incidents": first,
            "limit": 100,
            "offset": 0,
            "more": true,
            "total": 130
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/incidents"))
        .and(query_param("team_ids[]", "PTEAM02"))
        .and(query_param("offset", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "incidents": second,
            "limit": 100,
            "offset": 100,
            "more": false,
            "total": 130
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = client(&mock_server);
    let query = IncidentQuery::for_scope(Scope::Team, &me());
    let incidents = IncidentPages::new(&api, &query)
        .fetch_all(PAGE_SIZE)
        .await
        .unwrap();

    assert_eq!(incidents.len(), 130);
    let numbers: Vec<u64> = incidents.iter().map(|i| i.incident_number).collect();
    assert_eq!(numbers, (0..130).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_get_incident_by_number() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/incidents/1234"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"incident": incident_json("Q1234", 1234)})),
        )
        .mount(&mock_server)
        .await;

    let incident = client(&mock_server).get_incident("1234").await.unwrap();

    assert_eq!(incident.id, "Q1234");
    assert_eq!(incident.status, IncidentStatus::Triggered);
    assert!(incident.is_assigned_to("PUSER01"));
}

#[tokio::test]
async fn test_get_missing_incident() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/incidents/9999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"message": "Not Found", "code": 2100}
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).get_incident("9999").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound { ref resource } if resource == "/incidents/9999"));
}

#[tokio::test]
async fn test_update_incident_status_sends_from_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/incidents"))
        .and(header("From", "dana@example.com"))
        .and(body_json(json!({
            "incidents": [{
                "id": "Q1234",
                "type": "incident_reference",
                "status": "acknowledged"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "incidents": [incident_json("Q1234", 1234)]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    client(&mock_server)
        .update_incident_status("dana@example.com", "Q1234", IncidentStatus::Acknowledged)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_rejected_by_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/incidents"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Invalid status transition"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server)
        .update_incident_status("dana@example.com", "Q1", IncidentStatus::Resolved)
        .await
        .unwrap_err();

    match err {
        ApiError::BadRequest { message } => assert!(message.contains("Invalid status transition")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_schedule_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/schedules"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schedules": [
                {"id": "PS1", "name": "Primary", "users": [{"id": "PUSER01", "summary": "Dana Ops"}]},
                {"id": "PS2", "name": "Secondary", "users": [{"id": "PUSER09", "summary": "Someone"}]}
            ],
            "limit": 2,
            "offset": 0,
            "more": true
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/schedules"))
        .and(query_param("offset", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schedules": [
                {"id": "PS3", "name": "Escalation", "users": [{"id": "PUSER01", "summary": "Dana Ops"}]}
            ],
            "limit": 2,
            "offset": 2,
            "more": false
        })))
        .mount(&mock_server)
        .await;

    let api = client(&mock_server);
    let schedules = SchedulePages::new(&api).fetch_all(2).await.unwrap();

    let mine: Vec<&str> = schedules
        .iter()
        .filter(|s| s.has_member("PUSER01"))
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(schedules.len(), 3);
    assert_eq!(mine, vec!["PS1", "PS3"]);
}

#[tokio::test]
async fn test_get_schedule_with_window() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/schedules/PS1"))
        .and(query_param("time_zone", "America/Los_Angeles"))
        .and(query_param("since", "2026-10-14T12:00:00Z"))
        .and(query_param("until", "2026-10-22T12:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schedule": {
                "id": "PS1",
                "name": "Primary",
                "users": [{"id": "PUSER01", "summary": "Dana Ops"}],
                "final_schedule": {
                    "name": "Final Schedule",
                    "rendered_schedule_entries": [
                        {
                            "start": "2026-10-14T05:00:00-07:00",
                            "end": "2026-10-16T05:00:00-07:00",
                            "user": {"id": "PUSER01", "summary": "Dana Ops"}
                        },
                        {
                            "start": "2026-10-16T05:00:00-07:00",
                            "end": "2026-10-22T05:00:00-07:00",
                            "user": {"id": "PUSER02", "summary": "Sam Oncall"}
                        }
                    ]
                }
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let window = ScheduleWindow::around(Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap());
    let schedule = client(&mock_server)
        .get_schedule("PS1", &window)
        .await
        .unwrap();

    let entries = schedule.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].user.summary, "Sam Oncall");
}

#[tokio::test]
async fn test_base_url_path_prefix_is_kept() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pagerduty/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": me()})))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/pagerduty/incidents/42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"incident": incident_json("Q42", 42)})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = PagerDutyClient::new(format!("{}/pagerduty", mock_server.uri()), "fake-token").unwrap();

    let user = api.current_user().await.unwrap();
    let incident = api.get_incident("42").await.unwrap();

    assert_eq!(user.id, "PUSER01");
    assert_eq!(incident.id, "Q42");
}

#[tokio::test]
async fn test_base_url_with_trailing_slash() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/pagerduty/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"user": me()})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let api = PagerDutyClient::new(format!("{}/pagerduty/", mock_server.uri()), "fake-token").unwrap();

    assert_eq!(api.current_user().await.unwrap().email, "dana@example.com");
}

#[tokio::test]
async fn test_incident_reference_is_path_encoded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/incidents/bad%20ref"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).get_incident("bad ref").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound { ref resource } if resource == "/incidents/bad%20ref"));
}
