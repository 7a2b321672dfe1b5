#![allow(clippy::unwrap_used)]

use instipass::{
    client::ApiClient,
    config::AppConfig,
    forms::{
        INVALID_EMAIL_MESSAGE,
        login_link::{LINK_SENT_MESSAGE, REQUEST_LINK_PATH, request_login_link},
        newsletter::{NEWSLETTER_PATH, SUBSCRIBED_MESSAGE, subscribe},
        settings::{
            SETTINGS_PATH, SettingsUpdate, TemplateUpload, fetch_settings, update_settings,
            upload_template,
        },
    },
    session::{AuthError, Credential, errors::ALREADY_SUBSCRIBED_MESSAGE},
};
use serde_json::json;
use std::{net::TcpListener, time::Duration};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, header_regex, method, path},
};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn api(server: &MockServer) -> ApiClient {
    let config = AppConfig::new()
        .with_api_base_url(&server.uri())
        .with_request_timeout(Duration::from_secs(2));
    ApiClient::from_config(&config).unwrap()
}

fn credential() -> Credential {
    Credential::new("bearer-1".to_string()).unwrap()
}

#[tokio::test]
async fn login_link_request_sends_trimmed_email() {
    if !can_bind_localhost() {
        eprintln!("Skipping forms test: cannot bind to localhost");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REQUEST_LINK_PATH))
        .and(body_json(json!({"email": "registrar@uni.edu"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "sent"})))
        .expect(1)
        .mount(&server)
        .await;

    let message = request_login_link(&api(&server), "  registrar@uni.edu ")
        .await
        .unwrap();
    assert_eq!(message, LINK_SENT_MESSAGE);
}

#[tokio::test]
async fn login_link_statuses_are_categorized() {
    if !can_bind_localhost() {
        eprintln!("Skipping forms test: cannot bind to localhost");
        return;
    }

    let cases = [
        (429, json!({"detail": "slow down"}), AuthError::RateLimited),
        (404, json!({"detail": "No institution"}), AuthError::NotFound),
        (500, json!({}), AuthError::ServerError),
        (
            400,
            json!({"email": ["Enter a valid email address."]}),
            AuthError::validation("email", INVALID_EMAIL_MESSAGE),
        ),
        (
            400,
            json!({"detail": "<b>relation institution_email violated</b>"}),
            AuthError::validation("email", INVALID_EMAIL_MESSAGE),
        ),
    ];

    for (status, body, expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REQUEST_LINK_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(
            request_login_link(&api(&server), "registrar@uni.edu").await,
            Err(expected),
            "status {status}"
        );
    }
}

#[tokio::test]
async fn invalid_email_is_rejected_before_sending() {
    if !can_bind_localhost() {
        eprintln!("Skipping forms test: cannot bind to localhost");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let expected = Err(AuthError::validation("email", INVALID_EMAIL_MESSAGE));
    assert_eq!(request_login_link(&api(&server), "not-an-email").await, expected);
    assert_eq!(subscribe(&api(&server), "").await, expected);
}

#[tokio::test]
async fn newsletter_subscribe_and_duplicate() {
    if !can_bind_localhost() {
        eprintln!("Skipping forms test: cannot bind to localhost");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(NEWSLETTER_PATH))
        .and(body_json(json!({"email": "new@uni.edu"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"email": "new@uni.edu"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(NEWSLETTER_PATH))
        .and(body_json(json!({"email": "old@uni.edu"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(
            json!({"email": ["newsletter with this email already exists."]}),
        ))
        .mount(&server)
        .await;

    let api = api(&server);
    assert_eq!(subscribe(&api, "new@uni.edu").await, Ok(SUBSCRIBED_MESSAGE));

    let err = subscribe(&api, "old@uni.edu").await.unwrap_err();
    assert_eq!(err, AuthError::AlreadySubscribed);
    assert_eq!(err.message(), ALREADY_SUBSCRIBED_MESSAGE);
}

#[tokio::test]
async fn newsletter_rejection_without_email_field_hides_server_detail() {
    if !can_bind_localhost() {
        eprintln!("Skipping forms test: cannot bind to localhost");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(NEWSLETTER_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(
            json!({"detail": "<b>DB constraint nl_email_uniq violated</b>"}),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let err = subscribe(&api(&server), "someone@uni.edu").await.unwrap_err();
    assert_eq!(err, AuthError::validation("email", INVALID_EMAIL_MESSAGE));
    assert!(!err.to_string().contains("nl_email_uniq"));
}

#[tokio::test]
async fn settings_fetch_and_update_use_bearer() {
    if !can_bind_localhost() {
        eprintln!("Skipping forms test: cannot bind to localhost");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SETTINGS_PATH))
        .and(header("authorization", "Bearer bearer-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({"name": "State U", "email": "registrar@uni.edu", "slug": "state-u"}),
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(SETTINGS_PATH))
        .and(header("authorization", "Bearer bearer-1"))
        .and(body_json(json!({"phone": "+1 555 0100"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"name": "State U", "phone": "+1 555 0100"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let api = api(&server);
    let settings = fetch_settings(&api, &credential()).await.unwrap();
    assert_eq!(settings.name.as_deref(), Some("State U"));
    assert_eq!(settings.extra.get("slug"), Some(&json!("state-u")));

    let update = SettingsUpdate {
        phone: Some("+1 555 0100".to_string()),
        ..SettingsUpdate::default()
    };
    let updated = update_settings(&api, &credential(), &update).await.unwrap();
    assert_eq!(updated.phone.as_deref(), Some("+1 555 0100"));
}

#[tokio::test]
async fn settings_rejected_credential_is_invalid() {
    if !can_bind_localhost() {
        eprintln!("Skipping forms test: cannot bind to localhost");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SETTINGS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "bad token"})))
        .mount(&server)
        .await;

    assert_eq!(
        fetch_settings(&api(&server), &credential()).await,
        Err(AuthError::InvalidCredential)
    );
}

#[tokio::test]
async fn template_upload_is_multipart() {
    if !can_bind_localhost() {
        eprintln!("Skipping forms test: cannot bind to localhost");
        return;
    }

    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path(SETTINGS_PATH))
        .and(header("authorization", "Bearer bearer-1"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"template": "https://cdn.instipass.test/card.png"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
    let upload = TemplateUpload::new("card.png", png).unwrap();
    let settings = upload_template(&api(&server), &credential(), upload)
        .await
        .unwrap();
    assert_eq!(
        settings.template.as_deref(),
        Some("https://cdn.instipass.test/card.png")
    );
}
