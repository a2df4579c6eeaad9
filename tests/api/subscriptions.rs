use serde_json::{Value, json};
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{header, header_exists, method, path},
};

use crate::helpers::{schema_response, spawn_app, spawn_app_with};

#[tokio::test]
async fn subscribe_returns_200_for_a_valid_email() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path(app.schema_path()))
        .and(header_exists("Authorization"))
        .and(header("Notion-Version", "2022-06-28"))
        .respond_with(schema_response(json!({ "Email": { "type": "email" } })))
        .expect(1)
        .mount(&app.notion_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .and(header_exists("Authorization"))
        .and(header("Notion-Version", "2022-06-28"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.notion_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_subscribe(json!({ "email": "ursula_le_guin@gmail.com" }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "success": true, "emailSent": { "ok": true } }));
}

#[tokio::test]
async fn subscribe_creates_a_record_matching_the_schema() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path(app.schema_path()))
        .respond_with(schema_response(json!({ "Email": { "type": "email" } })))
        .expect(1)
        .mount(&app.notion_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.notion_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;

    app.post_subscribe(json!({ "email": "ursula@domain.com" }))
        .await;

    let requests = app.notion_server.received_requests().await.unwrap();
    let create = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .expect("No record-creation request was received.");
    let body: Value = serde_json::from_slice(&create.body).unwrap();

    assert_eq!(body["parent"]["database_id"], json!(app.database_id));
    assert_eq!(
        body["properties"],
        json!({ "Email": { "email": "ursula@domain.com" } })
    );
}

#[tokio::test]
async fn subscribe_wraps_the_address_when_the_schema_has_only_a_title_property() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path(app.schema_path()))
        .respond_with(schema_response(json!({
            "Notes": { "type": "rich_text" },
            "Name": { "type": "title" },
        })))
        .expect(1)
        .mount(&app.notion_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.notion_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;

    app.post_subscribe(json!({ "email": "ursula@domain.com" }))
        .await;

    let requests = app.notion_server.received_requests().await.unwrap();
    let create = requests
        .iter()
        .find(|r| r.method.as_str() == "POST")
        .expect("No record-creation request was received.");
    let body: Value = serde_json::from_slice(&create.body).unwrap();

    assert_eq!(
        body["properties"],
        json!({ "Name": { "title": [{ "text": { "content": "ursula@domain.com" } }] } })
    );
}

#[tokio::test]
async fn subscribe_returns_400_when_the_email_is_invalid() {
    let app = spawn_app().await;

    let test_cases = vec![
        (json!({}), "missing the email field"),
        (json!({ "email": 42 }), "a non-string email"),
        (json!({ "email": null }), "a null email"),
        (json!({ "email": "" }), "an empty email"),
        (json!({ "email": "definitely-not-an-email" }), "no at sign"),
        (json!({ "email": "ursula@domain" }), "a dotless domain"),
    ];

    for (payload, description) in test_cases {
        let response = app.post_subscribe(payload).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload had {}.",
            description
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "error": "Invalid email" }));
    }

    assert!(
        app.notion_server.received_requests().await.unwrap().is_empty(),
        "Invalid input must not reach Notion."
    );
}

#[tokio::test]
async fn subscribe_returns_500_when_the_integration_token_is_missing() {
    let app = spawn_app_with(|config| {
        config.notion.api_token = None;
    })
    .await;

    let response = app
        .post_subscribe(json!({ "email": "ursula@domain.com" }))
        .await;

    assert_eq!(500, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Notion not configured on server" }));
    assert!(app.notion_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn subscribe_returns_500_when_the_database_id_is_missing() {
    let app = spawn_app_with(|config| {
        config.notion.database_id = None;
    })
    .await;

    let response = app
        .post_subscribe(json!({ "email": "ursula@domain.com" }))
        .await;

    assert_eq!(500, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Notion not configured on server" }));
    assert!(app.notion_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn subscribe_passes_through_a_schema_read_failure() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path(app.schema_path()))
        .respond_with(ResponseTemplate::new(404).set_body_string("database not found"))
        .expect(1)
        .mount(&app.notion_server)
        .await;

    let response = app
        .post_subscribe(json!({ "email": "ursula@domain.com" }))
        .await;

    assert_eq!(404, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "error": "Failed to read Notion database schema",
            "details": "database not found"
        })
    );
}

#[tokio::test]
async fn subscribe_passes_through_a_record_creation_failure() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path(app.schema_path()))
        .respond_with(schema_response(json!({ "Email": { "type": "email" } })))
        .expect(1)
        .mount(&app.notion_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .respond_with(ResponseTemplate::new(403).set_body_string("insufficient permissions"))
        .expect(1)
        .mount(&app.notion_server)
        .await;

    let response = app
        .post_subscribe(json!({ "email": "ursula@domain.com" }))
        .await;

    assert_eq!(403, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "error": "Notion API error", "details": "insufficient permissions" })
    );
    assert!(
        app.email_server.received_requests().await.unwrap().is_empty(),
        "No welcome email may be sent when the record was not created."
    );
}

#[tokio::test]
async fn subscribe_still_succeeds_when_the_welcome_email_fails() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path(app.schema_path()))
        .respond_with(schema_response(json!({ "Email": { "type": "email" } })))
        .expect(1)
        .mount(&app.notion_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.notion_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(500).set_body_string("provider exploded"))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_subscribe(json!({ "email": "ursula@domain.com" }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "success": true,
            "emailSent": { "ok": false, "details": "provider exploded", "status": 500 }
        })
    );
}

#[tokio::test]
async fn subscribe_skips_the_welcome_email_when_no_provider_is_configured() {
    let app = spawn_app_with(|config| {
        config.email_client = None;
    })
    .await;

    Mock::given(method("GET"))
        .and(path(app.schema_path()))
        .respond_with(schema_response(json!({ "Email": { "type": "email" } })))
        .expect(1)
        .mount(&app.notion_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.notion_server)
        .await;

    let response = app
        .post_subscribe(json!({ "email": "ursula@domain.com" }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "success": true, "emailSent": null }));
    assert!(app.email_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn subscribing_twice_creates_two_records() {
    let app = spawn_app().await;

    Mock::given(method("GET"))
        .and(path(app.schema_path()))
        .respond_with(schema_response(json!({ "Email": { "type": "email" } })))
        .expect(2)
        .mount(&app.notion_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/pages"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.notion_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    for _ in 0..2 {
        let response = app
            .post_subscribe(json!({ "email": "ursula@domain.com" }))
            .await;
        assert_eq!(200, response.status().as_u16());
    }
}

#[tokio::test]
async fn subscribe_returns_500_on_a_malformed_body() {
    let app = spawn_app().await;

    let response = app
        .post_subscribe_raw(r#"{"email": "ursula@domain.com""#.into())
        .await;

    assert_eq!(500, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], json!("Server error"));
    assert!(body["details"].is_string());
    assert!(app.notion_server.received_requests().await.unwrap().is_empty());
}
