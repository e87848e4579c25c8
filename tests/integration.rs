#![cfg(test)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use mockall::mock;
use serde_json::{Value, json};
use support_desk::{
    api,
    base::{
        config::{Config, ConfigInner},
        types::{Category, ChatTurn, Priority, Res, Role, TicketStatus, TriageReply, Void},
    },
    client::{http::ApiClient, session::ChatSession},
    runtime::Runtime,
    service::{
        db::DbClient,
        llm::{GenericLlmClient, LlmClient},
        mail::{GenericMailClient, MailClient, Notification},
    },
};
use tower::ServiceExt;

// Mocks.

mock! {
    pub Llm {}

    #[async_trait]
    impl GenericLlmClient for Llm {
        async fn triage(&self, history: &[ChatTurn]) -> Res<TriageReply>;
    }
}

mock! {
    pub Mail {}

    #[async_trait]
    impl GenericMailClient for Mail {
        async fn send(&self, notification: &Notification) -> Void;
    }
}

type Outbox = Arc<Mutex<Vec<Notification>>>;

/// An LLM that always answers with `reply`, labelled as `category`.
fn get_mock_llm(reply: &'static str, category: Option<Category>) -> MockLlm {
    let mut mock = MockLlm::new();

    mock.expect_triage().returning(move |_| {
        Ok(TriageReply {
            reply: reply.to_string(),
            category,
        })
    });

    mock
}

/// A mail client that records everything it sends.
fn get_recording_mail(outbox: Outbox) -> MockMail {
    let mut mock = MockMail::new();

    mock.expect_send().returning(move |notification| {
        outbox.lock().unwrap().push(notification.clone());
        Ok(())
    });

    mock
}

fn test_config(accept_messages_after_resolution: bool) -> Config {
    Config {
        inner: Arc::new(ConfigInner {
            openai_api_key: "test_key".to_string(),
            openai_triage_agent_model: "gpt-4.1-mini".to_string(),
            openai_triage_agent_temperature: 0.7,
            openai_max_tokens: 500,
            db_endpoint: "mem://".to_string(),
            server_bind: "127.0.0.1:0".to_string(),
            cors_allowed_origin: "http://localhost:5173".to_string(),
            ticket_link_base_url: "http://localhost:5173/support".to_string(),
            smtp_host: "localhost".to_string(),
            sender_email: "support@example.com".to_string(),
            sender_name: "Support System".to_string(),
            accept_messages_after_resolution,
            ..Default::default()
        }),
    }
}

/// Helper function to setup the test environment.
async fn setup_test_environment(llm: MockLlm, mail: MockMail, accept_messages_after_resolution: bool) -> Runtime {
    let db = DbClient::surreal_memory().await.expect("Failed to create DB client");

    Runtime {
        config: test_config(accept_messages_after_resolution),
        db,
        llm: LlmClient::new(Arc::new(llm)),
        mail: MailClient::new(Arc::new(mail)),
    }
}

async fn call(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri).header("content-type", "application/json");
    let request = match body {
        Some(body) => request.body(Body::from(body.to_string())).unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };

    (status, value)
}

fn first_turn() -> Value {
    json!({
        "messages": [
            {"role": "assistant", "content": "Hello A! How can I help you today?"},
            {"role": "user", "content": "My site is down"}
        ],
        "userInfo": {"name": "A", "email": "a@x.com"}
    })
}

async fn open_ticket(router: &Router) -> i64 {
    let (status, body) = call(router, "POST", "/api/chat", Some(first_turn())).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    body["aiMessage"]["ticketId"].as_i64().expect("ticketId on first turn")
}

// Tests.

#[tokio::test]
async fn test_health_and_initiate() {
    let runtime = setup_test_environment(MockLlm::new(), MockMail::new(), true).await;
    let router = api::router(runtime);

    let (status, body) = call(&router, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));

    let (status, body) = call(&router, "POST", "/api/ticket/initiate", Some(json!({"query": "hi"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Received your query!", "query": "hi"}));

    let (status, body) = call(&router, "POST", "/api/ticket/initiate", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_first_turn_opens_and_routes_ticket() {
    let outbox = Outbox::default();
    let llm = get_mock_llm("[Website] Which site is affected?", Some(Category::Website));
    let runtime = setup_test_environment(llm, get_recording_mail(outbox.clone()), true).await;
    let router = api::router(runtime.clone());

    let (status, body) = call(&router, "POST", "/api/chat", Some(first_turn())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["aiMessage"]["role"], "assistant");
    assert_eq!(body["aiMessage"]["content"], "[Website] Which site is affected?");

    let ticket_id = body["aiMessage"]["ticketId"].as_i64().unwrap();
    assert!(ticket_id > 0);

    let ticket = runtime.db.get_ticket(ticket_id).await.unwrap();
    assert_eq!(ticket.category, Some(Category::Website));
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.priority, Priority::Normal);
    assert_eq!(ticket.user_email, "a@x.com");

    let messages = runtime.db.get_messages(ticket_id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].message, "My site is down");
    assert_eq!(messages[1].role, Role::Assistant);

    let sent = outbox.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "web-team@example.com");
    assert_eq!(sent[0].subject, format!("New Ticket #{ticket_id}: Website"));
    assert!(sent[0].text.contains(&format!("http://localhost:5173/support/{ticket_id}")));
}

#[tokio::test]
async fn test_unlabelled_reply_is_unclassified() {
    let outbox = Outbox::default();
    let llm = get_mock_llm("Could you tell me more?", None);
    let runtime = setup_test_environment(llm, get_recording_mail(outbox.clone()), true).await;
    let router = api::router(runtime.clone());

    let ticket_id = open_ticket(&router).await;

    let ticket = runtime.db.get_ticket(ticket_id).await.unwrap();
    assert_eq!(ticket.category, Some(Category::Unclassified));
    assert_eq!(outbox.lock().unwrap()[0].to, "support-leads@example.com");
}

#[tokio::test]
async fn test_follow_up_turn_appends_without_new_ticket() {
    let outbox = Outbox::default();
    let llm = get_mock_llm("[Email] Have you checked spam?", Some(Category::Email));
    let runtime = setup_test_environment(llm, get_recording_mail(outbox.clone()), true).await;
    let router = api::router(runtime.clone());

    let ticket_id = open_ticket(&router).await;

    let (status, body) = call(
        &router,
        "POST",
        "/api/chat",
        Some(json!({
            "messages": [
                {"role": "assistant", "content": "Hello A! How can I help you today?"},
                {"role": "user", "content": "My site is down"},
                {"role": "assistant", "content": "[Email] Have you checked spam?"},
                {"role": "user", "content": "Yes"}
            ],
            "ticketId": ticket_id.to_string()
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["aiMessage"].get("ticketId").is_none());

    let messages = runtime.db.get_messages(ticket_id).await.unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2].message, "Yes");
    assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));

    // Only the opening turn notifies.
    assert_eq!(outbox.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_chat_validation_has_no_side_effects() {
    let mut llm = MockLlm::new();
    llm.expect_triage().never();
    let mut mail = MockMail::new();
    mail.expect_send().never();

    let runtime = setup_test_environment(llm, mail, true).await;
    let router = api::router(runtime);

    let (status, _) = call(&router, "POST", "/api/chat", Some(json!({"messages": []}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&router, "POST", "/api/chat", Some(json!({"messages": [{"role": "user", "content": "hi"}]}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&router, "POST", "/api/chat", Some(json!({"messages": [{"role": "user", "content": "hi"}], "ticketId": 999}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&router, "POST", "/api/chat", Some(json!({"messages": "nope"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ai_failure_creates_nothing() {
    let mut llm = MockLlm::new();
    llm.expect_triage().returning(|_| Err(anyhow::anyhow!("rate limited")));
    let mut mail = MockMail::new();
    mail.expect_send().never();

    let runtime = setup_test_environment(llm, mail, true).await;
    let router = api::router(runtime.clone());

    let (status, body) = call(&router, "POST", "/api/chat", Some(first_turn())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "AI service error."}));
    assert!(runtime.db.get_ticket(1).await.is_err());
}

#[tokio::test]
async fn test_missing_ticket_id_is_rejected_everywhere() {
    let mut mail = MockMail::new();
    mail.expect_send().never();

    let runtime = setup_test_environment(MockLlm::new(), mail, true).await;
    let router = api::router(runtime);

    for uri in ["/api/ticket/escalate", "/api/ticket/urgent", "/api/ticket/resolve"] {
        let (status, body) = call(&router, "POST", uri, Some(json!({"rating": 5}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body["error"].is_string());
    }

    let (status, _) = call(&router, "POST", "/api/ticket/escalate", Some(json!({"ticketId": 42}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_escalate_changes_only_status() {
    let outbox = Outbox::default();
    let llm = get_mock_llm("[Admin] Which account?", Some(Category::Admin));
    let runtime = setup_test_environment(llm, get_recording_mail(outbox.clone()), true).await;
    let router = api::router(runtime.clone());

    let ticket_id = open_ticket(&router).await;
    let before = runtime.db.get_ticket(ticket_id).await.unwrap();

    let (status, body) = call(&router, "POST", "/api/ticket/escalate", Some(json!({"ticketId": ticket_id}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Ticket escalated successfully."}));

    let after = runtime.db.get_ticket(ticket_id).await.unwrap();
    assert_eq!(after.status, TicketStatus::Escalated);
    assert_eq!(after.priority, before.priority);
    assert_eq!(after.category, before.category);
    assert_eq!(after.rating, None);
    assert_eq!(runtime.db.get_messages(ticket_id).await.unwrap().len(), 2);

    let sent = outbox.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].to, "escalations@example.com");
    assert!(sent[1].subject.starts_with(&format!("Escalated Ticket #{ticket_id}")));
    assert!(sent[1].text.contains("USER: My site is down"));
}

#[tokio::test]
async fn test_urgent_changes_only_priority() {
    let outbox = Outbox::default();
    let llm = get_mock_llm("[Social] Which network?", Some(Category::Social));
    let runtime = setup_test_environment(llm, get_recording_mail(outbox.clone()), true).await;
    let router = api::router(runtime.clone());

    let ticket_id = open_ticket(&router).await;

    let (status, body) = call(&router, "POST", "/api/ticket/urgent", Some(json!({"ticketId": ticket_id}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Ticket marked as urgent."}));

    let ticket = runtime.db.get_ticket(ticket_id).await.unwrap();
    assert_eq!(ticket.priority, Priority::Urgent);
    assert_eq!(ticket.status, TicketStatus::Open);

    // Marking urgent sends nothing.
    assert_eq!(outbox.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_resolve_stores_review_and_notifies() {
    let outbox = Outbox::default();
    let llm = get_mock_llm("[Website] Clear your cache. Is your issue resolved?", Some(Category::Website));
    let runtime = setup_test_environment(llm, get_recording_mail(outbox.clone()), true).await;
    let router = api::router(runtime.clone());

    let ticket_id = open_ticket(&router).await;

    let (status, body) = call(&router, "POST", "/api/ticket/resolve", Some(json!({"ticketId": ticket_id, "rating": 5, "comment": "great"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Ticket resolved and review submitted."}));

    let ticket = runtime.db.get_ticket(ticket_id).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Resolved);
    assert_eq!(ticket.rating, Some(5));
    assert_eq!(ticket.review_comment.as_deref(), Some("great"));

    let sent = outbox.lock().unwrap().clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].to, "reviews@example.com");
    assert_eq!(sent[1].subject, format!("Resolved Ticket #{ticket_id} - 5/5 Stars"));
    assert!(sent[1].text.contains("Rating: 5/5\nComment: great"));

    // A resolved ticket cannot be escalated.
    let (status, _) = call(&router, "POST", "/api/ticket/escalate", Some(json!({"ticketId": ticket_id}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(outbox.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_resolve_rejects_bad_rating() {
    let outbox = Outbox::default();
    let llm = get_mock_llm("[Website] Ok.", Some(Category::Website));
    let runtime = setup_test_environment(llm, get_recording_mail(outbox.clone()), true).await;
    let router = api::router(runtime.clone());

    let ticket_id = open_ticket(&router).await;

    let (status, _) = call(&router, "POST", "/api/ticket/resolve", Some(json!({"ticketId": ticket_id, "rating": 9}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(runtime.db.get_ticket(ticket_id).await.unwrap().status, TicketStatus::Open);
}

#[tokio::test]
async fn test_mail_failure_keeps_ticket() {
    let mut mail = MockMail::new();
    mail.expect_send().times(1).returning(|_| Err(anyhow::anyhow!("smtp unavailable")));

    let llm = get_mock_llm("[Website] Which site?", Some(Category::Website));
    let runtime = setup_test_environment(llm, mail, true).await;
    let router = api::router(runtime.clone());

    let (status, body) = call(&router, "POST", "/api/chat", Some(first_turn())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "AI service error."}));

    let ticket = runtime.db.get_ticket(1).await.unwrap();
    assert_eq!(ticket.category, Some(Category::Website));
    assert_eq!(runtime.db.get_messages(1).await.unwrap().len(), 2);
}

/// A mail client that accepts the first notification and fails every later one.
fn get_failing_after_first_mail() -> MockMail {
    let mut mock = MockMail::new();
    let mut seq = mockall::Sequence::new();

    mock.expect_send().times(1).in_sequence(&mut seq).returning(|_| Ok(()));
    mock.expect_send().times(1).in_sequence(&mut seq).returning(|_| Err(anyhow::anyhow!("smtp unavailable")));

    mock
}

#[tokio::test]
async fn test_escalate_mail_failure_keeps_status_open() {
    let llm = get_mock_llm("[Admin] Which account?", Some(Category::Admin));
    let runtime = setup_test_environment(llm, get_failing_after_first_mail(), true).await;
    let router = api::router(runtime.clone());

    let ticket_id = open_ticket(&router).await;

    let (status, body) = call(&router, "POST", "/api/ticket/escalate", Some(json!({"ticketId": ticket_id}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to escalate ticket."}));

    let ticket = runtime.db.get_ticket(ticket_id).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.priority, Priority::Normal);
}

#[tokio::test]
async fn test_resolve_mail_failure_keeps_review() {
    let llm = get_mock_llm("[Website] Clear your cache. Is your issue resolved?", Some(Category::Website));
    let runtime = setup_test_environment(llm, get_failing_after_first_mail(), true).await;
    let router = api::router(runtime.clone());

    let ticket_id = open_ticket(&router).await;

    let (status, body) = call(&router, "POST", "/api/ticket/resolve", Some(json!({"ticketId": ticket_id, "rating": 4, "comment": "fine"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to resolve ticket."}));

    let ticket = runtime.db.get_ticket(ticket_id).await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Resolved);
    assert_eq!(ticket.rating, Some(4));
    assert_eq!(ticket.review_comment.as_deref(), Some("fine"));
}

#[tokio::test]
async fn test_resolved_ticket_can_be_closed_to_chat() {
    let outbox = Outbox::default();
    let llm = get_mock_llm("[Website] Done.", Some(Category::Website));
    let runtime = setup_test_environment(llm, get_recording_mail(outbox), false).await;
    let router = api::router(runtime.clone());

    let ticket_id = open_ticket(&router).await;
    runtime.db.resolve(ticket_id, 4, None).await.unwrap();

    let (status, _) = call(
        &router,
        "POST",
        "/api/chat",
        Some(json!({"messages": [{"role": "user", "content": "One more thing"}], "ticketId": ticket_id})),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(runtime.db.get_messages(ticket_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_ticket_details() {
    let outbox = Outbox::default();
    let llm = get_mock_llm("[Email] Which mailbox?", Some(Category::Email));
    let runtime = setup_test_environment(llm, get_recording_mail(outbox), true).await;
    let router = api::router(runtime);

    let ticket_id = open_ticket(&router).await;

    let (status, body) = call(&router, "GET", &format!("/api/ticket/{ticket_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ticket"]["id"], ticket_id);
    assert_eq!(body["ticket"]["category"], "Email");
    assert_eq!(body["ticket"]["status"], "open");
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);

    let (status, _) = call(&router, "GET", "/api/ticket/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&router, "GET", "/api/ticket/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_session_against_live_server() {
    let outbox = Outbox::default();
    let llm = get_mock_llm("[Website] Try a hard refresh. Is your issue resolved?", Some(Category::Website));
    let runtime = setup_test_environment(llm, get_recording_mail(outbox.clone()), true).await;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(axum::serve(listener, api::router(runtime.clone())).into_future());

    let api = ApiClient::new(format!("http://{addr}/"));
    let mut session = ChatSession::new();

    session
        .start(support_desk::base::types::UserInfo {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            phone: None,
        })
        .unwrap();

    let request = session.submit("My site is down").unwrap();
    let reply = api.chat(&request).await.unwrap();
    session.receive(reply);

    let ticket_id = session.ticket_id().expect("ticket opened");
    assert!(session.escalate_request().is_err());

    let review = session.review_request(5, "great").unwrap();
    api.resolve(&review).await.unwrap();
    session.mark_reviewed();

    let details = api.ticket(ticket_id).await.unwrap();
    assert_eq!(details.ticket.status, TicketStatus::Resolved);
    assert_eq!(details.ticket.rating, Some(5));

    let err = api.escalate(&support_desk::api::models::TicketRequest { ticket_id: Some(ticket_id) }).await.unwrap_err();
    let failed = err.downcast_ref::<support_desk::client::http::RequestFailed>().unwrap();
    assert_eq!(failed.status, StatusCode::CONFLICT);

    assert_eq!(outbox.lock().unwrap().len(), 2);

    server.abort();
}
