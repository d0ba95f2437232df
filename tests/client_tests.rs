//! HTTP client tests against a mock coaching API.

use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use coach_chat::chat::{NullRenderer, SessionConfig, SessionController, TurnOutcome};
use coach_chat::{ChatRequest, CoachClient, Message, StreamEvent, Universe};

fn client_for(server: &MockServer) -> CoachClient {
    CoachClient::new(Some(server.uri())).unwrap()
}

async fn mount_usage(server: &MockServer, used: u32) {
    Mock::given(method("GET"))
        .and(path("/api/chat/usage"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages_used": used,
            "messages_remaining": 50 - used,
            "percentage_used": used as f64 * 2.0,
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn fetches_usage() {
    let server = MockServer::start().await;
    mount_usage(&server, 12).await;

    let usage = client_for(&server).usage().await.unwrap();

    assert_eq!(usage.messages_used, 12);
    assert_eq!(usage.messages_remaining, 38);
    assert_eq!(usage.percentage_used, 24.0);
}

#[tokio::test]
async fn fetches_intro_for_universe() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/intro/todays_workout"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"intro": "Ready to lift?"})),
        )
        .mount(&server)
        .await;

    let intro = client_for(&server)
        .intro(Universe::TodaysWorkout)
        .await
        .unwrap();

    assert_eq!(intro, "Ready to lift?");
}

#[tokio::test]
async fn fetches_journal_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/journal-entries-count"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count_last_week": 4})))
        .mount(&server)
        .await;

    let count = client_for(&server).journal_entries_count().await.unwrap();

    assert_eq!(count, 4);
}

#[tokio::test]
async fn streams_chat_events() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"type\":\"token\",\"content\":\"Great\"}\n\n",
        "data: not json\n\n",
        ": keep-alive\n",
        "data: {\"type\":\"token\",\"content\":\" job\"}\n\n",
        "data: {\"type\":\"done\"}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header("accept", "text/event-stream"))
        .and(body_json(json!({
            "topic": "autopsy",
            "message": "How was my run?",
            "conversation": [],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let request = ChatRequest::new(Universe::Autopsy, "How was my run?", &[], None);
    let stream = client_for(&server).stream_chat(&request).await.unwrap();
    let events: Vec<StreamEvent> = stream.map(|event| event.unwrap()).collect().await;

    assert_eq!(
        events,
        vec![
            StreamEvent::token("Great"),
            StreamEvent::token(" job"),
            StreamEvent::Done,
        ]
    );
}

#[tokio::test]
async fn maps_rate_limit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "30")
                .set_body_json(json!({"detail": "Monthly message limit reached"})),
        )
        .mount(&server)
        .await;

    let request = ChatRequest::new(Universe::General, "hi", &[], None);
    let err = match client_for(&server).stream_chat(&request).await {
        Ok(_) => panic!("expected rate limit error"),
        Err(err) => err,
    };

    assert!(err.is_rate_limit());
    assert_eq!(err.status_code(), Some(429));
    assert!(err.to_string().contains("Monthly message limit reached"));
    assert!(err.to_string().contains("retry after 30 seconds"));
}

#[tokio::test]
async fn maps_missing_intro_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/chat/intro/progress"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not Found"})))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .intro(Universe::Progress)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn session_round_trip_over_http() {
    let server = MockServer::start().await;
    mount_usage(&server, 3).await;
    Mock::given(method("GET"))
        .and(path("/api/chat/intro/general"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"intro": "Hey there!"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({
            "topic": "general",
            "message": "Plan my week",
            "conversation": [],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"type\":\"token\",\"content\":\"Three runs\"}\n\ndata: {\"type\":\"done\"}\n\n",
            "text/event-stream",
        ))
        .mount(&server)
        .await;

    let session = SessionController::new(client_for(&server), SessionConfig::default());
    session.open().await;
    assert_eq!(session.messages().await, vec![Message::intro("Hey there!")]);

    let outcome = session.submit("Plan my week", &mut NullRenderer).await;

    assert!(matches!(
        outcome,
        TurnOutcome::Completed {
            done_received: true
        }
    ));
    assert_eq!(
        session.messages().await,
        vec![Message::user("Plan my week"), Message::assistant("Three runs")]
    );
    assert_eq!(session.usage().await.map(|u| u.messages_used), Some(3));
    assert_eq!(session.error().await, None);
}
