//! Gmail and Graph adapters against a local mock API.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use inboxbridge_core::provider::{GmailAdapter, GraphAdapter, MailProvider};
use inboxbridge_core::service;
use inboxbridge_core::{Credentials, ErrorKind, OAuthCredential};
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token() -> Credentials {
    Credentials::OAuth(OAuthCredential::AccessToken("ya29.test".to_string()))
}

fn base(server: &MockServer) -> Url {
    Url::parse(&format!("{}/", server.uri())).unwrap()
}

fn gmail(server: &MockServer) -> GmailAdapter {
    GmailAdapter::new(
        reqwest::Client::new(),
        base(server),
        inboxbridge_oauth::Provider::google().unwrap(),
    )
}

fn graph(server: &MockServer) -> GraphAdapter {
    GraphAdapter::new(
        reqwest::Client::new(),
        base(server),
        inboxbridge_oauth::Provider::microsoft().unwrap(),
    )
}

fn metadata(id: &str, subject: &str) -> serde_json::Value {
    json!({
        "id": id,
        "threadId": format!("t-{id}"),
        "snippet": format!("snippet {id}"),
        "labelIds": ["INBOX"],
        "payload": {"headers": [
            {"name": "Subject", "value": subject},
            {"name": "From", "value": "\"Ada Lovelace\" <ada@example.org>"},
            {"name": "Date", "value": "Tue, 7 Oct 2025 12:00:00 +0000"}
        ]}
    })
}

async fn mount_listing(server: &MockServer, ids: &[&str]) {
    let messages: Vec<_> = ids.iter().map(|id| json!({"id": id, "threadId": "x"})).collect();
    Mock::given(method("GET"))
        .and(path("/users/me/messages"))
        .and(query_param("labelIds", "INBOX"))
        .and(header("authorization", "Bearer ya29.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": messages,
            "resultSizeEstimate": ids.len()
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn gmail_lists_with_metadata() {
    let server = MockServer::start().await;
    mount_listing(&server, &["a1", "b2"]).await;
    for (id, subject) in [("a1", "First"), ("b2", "Second")] {
        Mock::given(method("GET"))
            .and(path(format!("/users/me/messages/{id}")))
            .and(query_param("format", "metadata"))
            .respond_with(ResponseTemplate::new(200).set_body_json(metadata(id, subject)))
            .mount(&server)
            .await;
    }

    let listed = service::list_messages(&gmail(&server), &token(), 25).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, "a1");
    assert_eq!(listed[0].subject, "First");
    assert_eq!(listed[0].from, "Ada Lovelace <ada@example.org>");
    assert_eq!(listed[0].thread_id, "t-a1");
    assert_eq!(listed[1].snippet, "snippet b2");

    let requests = server.received_requests().await.unwrap();
    let listing = requests
        .iter()
        .find(|r| r.url.path() == "/users/me/messages")
        .unwrap();
    assert!(listing.url.query().unwrap().contains("maxResults=25"));
}

#[tokio::test]
async fn gmail_listing_fails_when_one_fetch_fails() {
    let server = MockServer::start().await;
    mount_listing(&server, &["ok1", "gone", "ok2"]).await;
    for id in ["ok1", "ok2"] {
        Mock::given(method("GET"))
            .and(path(format!("/users/me/messages/{id}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(metadata(id, "fine")))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/users/me/messages/gone"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"code": 500, "message": "Backend Error"}
        })))
        .mount(&server)
        .await;

    let err = gmail(&server).list(&token(), 10).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransportError);
    assert!(err.to_string().contains("Backend Error"));
}

#[tokio::test]
async fn gmail_empty_inbox() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resultSizeEstimate": 0})))
        .mount(&server)
        .await;

    let listed = gmail(&server).list(&token(), 10).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn gmail_detail_prefers_nested_plain_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages/m1"))
        .and(query_param("format", "full"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m1",
            "threadId": "t1",
            "snippet": "Hello",
            "payload": {
                "mimeType": "multipart/mixed",
                "headers": [
                    {"name": "Subject", "value": "Report"},
                    {"name": "To", "value": "\"Bob B\" <bob@example.org>"}
                ],
                "parts": [
                    {"mimeType": "text/html", "body": {"data": URL_SAFE_NO_PAD.encode("<p>Hello <b>HTML</b></p>")}},
                    {"mimeType": "multipart/alternative", "parts": [
                        {"mimeType": "text/plain", "body": {"data": URL_SAFE_NO_PAD.encode("Hello plain")}}
                    ]}
                ]
            }
        })))
        .mount(&server)
        .await;

    let detail = service::get_message_detail(&gmail(&server), &token(), "m1")
        .await
        .unwrap();
    assert_eq!(detail.body, "Hello plain");
    assert_eq!(detail.to.as_deref(), Some("Bob B <bob@example.org>"));
    assert_eq!(detail.summary.thread_id, "t1");
}

#[tokio::test]
async fn gmail_detail_html_only_is_reduced() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages/h1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "h1",
            "snippet": "News",
            "payload": {
                "mimeType": "text/html",
                "headers": [],
                "body": {"data": URL_SAFE_NO_PAD.encode("<script>x()</script><div>Big   <i>news</i></div>")}
            }
        })))
        .mount(&server)
        .await;

    let detail = gmail(&server).detail(&token(), "h1").await.unwrap();
    assert_eq!(detail.body, "Big news");
    assert!(detail.html.unwrap().contains("<i>news</i>"));
}

#[tokio::test]
async fn gmail_detail_without_body_uses_snippet() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages/e1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "e1",
            "snippet": "Only a snippet",
            "payload": {"mimeType": "multipart/mixed", "headers": [], "parts": []}
        })))
        .mount(&server)
        .await;

    let detail = gmail(&server).detail(&token(), "e1").await.unwrap();
    assert_eq!(detail.body, "Only a snippet");
    assert_eq!(detail.summary.subject, "(no subject)");
    assert_eq!(detail.summary.thread_id, "");
}

#[tokio::test]
async fn gmail_unknown_id_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/messages/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "message": "Requested entity was not found."}
        })))
        .mount(&server)
        .await;

    let err = gmail(&server).detail(&token(), "nope").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn gmail_connection_test() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me/profile"))
        .and(header("authorization", "Bearer ya29.test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "emailAddress": "ada@example.org",
            "messagesTotal": 3
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/me/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": 401, "message": "Invalid Credentials"}
        })))
        .mount(&server)
        .await;

    let adapter = gmail(&server);
    assert!(service::test_connection(&adapter, &token()).await.success);

    let stale = Credentials::OAuth(OAuthCredential::AccessToken("expired".to_string()));
    let result = service::test_connection(&adapter, &stale).await;
    assert!(!result.success);
    assert_eq!(result.kind, Some(ErrorKind::AuthenticationFailed));
    assert!(result.error.unwrap().contains("Invalid Credentials"));
}

#[tokio::test]
async fn gmail_refresh_without_app_is_configuration_missing() {
    let server = MockServer::start().await;
    let refresh = Credentials::OAuth(OAuthCredential::RefreshToken("1//stored".to_string()));
    let result = gmail(&server).test_connection(&refresh).await;
    assert_eq!(result.kind, Some(ErrorKind::ConfigurationMissing));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn graph_lists_inbox() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/mailFolders/Inbox/messages"))
        .and(query_param("$top", "5"))
        .and(query_param("$orderby", "receivedDateTime desc"))
        .and(query_param("$select", "id,subject,from,receivedDateTime,bodyPreview,isRead"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {
                    "id": "AAMk1",
                    "subject": "Invoice",
                    "from": {"emailAddress": {"name": "Billing", "address": "billing@example.com"}},
                    "receivedDateTime": "2025-10-07T09:30:00Z",
                    "bodyPreview": "Your invoice is ready",
                    "isRead": false
                },
                {
                    "id": "AAMk2",
                    "subject": "",
                    "from": {"emailAddress": {"address": "noreply@example.com"}},
                    "receivedDateTime": "2025-10-06T09:30:00Z",
                    "bodyPreview": "",
                    "isRead": true
                }
            ]
        })))
        .mount(&server)
        .await;

    let listed = service::list_messages(&graph(&server), &token(), 5).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].from, "Billing <billing@example.com>");
    assert_eq!(listed[0].is_read, Some(false));
    assert_eq!(listed[1].subject, "(no subject)");
    assert_eq!(listed[1].from, "noreply@example.com");
}

#[tokio::test]
async fn graph_detail_reduces_html() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/messages/AAMk1"))
        .and(query_param(
            "$select",
            "id,subject,from,toRecipients,receivedDateTime,bodyPreview,body,isRead",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "AAMk1",
            "subject": "Invoice",
            "from": {"emailAddress": {"name": "Billing", "address": "billing@example.com"}},
            "toRecipients": [
                {"emailAddress": {"name": "Ada", "address": "ada@example.org"}},
                {"emailAddress": {"address": "ops@example.org"}}
            ],
            "receivedDateTime": "2025-10-07T09:30:00Z",
            "bodyPreview": "Your invoice",
            "body": {"contentType": "html", "content": "<html><style>p{}</style><p>Your <b>invoice</b> is ready</p></html>"},
            "isRead": true
        })))
        .mount(&server)
        .await;

    let detail = graph(&server).detail(&token(), "AAMk1").await.unwrap();
    assert_eq!(detail.body, "Your invoice is ready");
    assert_eq!(
        detail.to.as_deref(),
        Some("Ada <ada@example.org>, ops@example.org")
    );
    assert!(detail.html.is_some());
}

#[tokio::test]
async fn graph_detail_text_and_missing_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/messages/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "plain",
            "bodyPreview": "preview",
            "body": {"contentType": "text", "content": "Line one\n\nLine <two>"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/messages/bare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "bare",
            "bodyPreview": "just the preview"
        })))
        .mount(&server)
        .await;

    let adapter = graph(&server);
    let plain = adapter.detail(&token(), "plain").await.unwrap();
    assert_eq!(plain.body, "Line one\n\nLine <two>");
    assert!(plain.html.is_none());

    let bare = adapter.detail(&token(), "bare").await.unwrap();
    assert_eq!(bare.body, "just the preview");
}

#[tokio::test]
async fn graph_unauthorized_is_authentication_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"code": "InvalidAuthenticationToken", "message": "Access token has expired or is not yet valid."}
        })))
        .mount(&server)
        .await;

    let result = graph(&server).test_connection(&token()).await;
    assert!(!result.success);
    assert_eq!(result.kind, Some(ErrorKind::AuthenticationFailed));
    assert!(result.error.unwrap().contains("Access token has expired"));
}

#[tokio::test]
async fn graph_search_matches_preview() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me/mailFolders/Inbox/messages"))
        .and(query_param("$top", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"id": "1", "subject": "Lunch", "bodyPreview": "Pizza on Friday?"},
                {"id": "2", "subject": "Build failed", "bodyPreview": "pipeline red"},
                {"id": "3", "subject": "Re: lunch", "bodyPreview": "Sure"}
            ]
        })))
        .mount(&server)
        .await;

    let found = service::search_messages(&graph(&server), &token(), "LUNCH", 10)
        .await
        .unwrap();
    let ids: Vec<&str> = found.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "3"]);
}
