use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::json;
use tripmate_agent::backend::{AgentBackend, BookingBackend};
use tripmate_agent::http::{ClientError, HttpAgentClient, HttpBookingClient};
use tripmate_agent::runtime::{AssistantRuntime, RuntimeSettings};
use tripmate_agent::session::{ConversationSession, TurnOutcome};
use tripmate_core::decode::ProcessResponse;
use tripmate_core::domain::agent::{AgentSearchRequest, SearchStrategy};
use tripmate_core::domain::params::{BookingParameters, ParamKey};
use tripmate_core::domain::quiz::QuizRequest;
use tripmate_core::flows::DialogueMode;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn booking_client(server: &MockServer, token: Option<&str>) -> HttpBookingClient {
    HttpBookingClient::new(
        format!("{}/api", server.uri()),
        token.map(|token| SecretString::from(token.to_string())),
        Duration::from_secs(5),
    )
    .expect("booking client")
}

fn agent_client(server: &MockServer) -> HttpAgentClient {
    HttpAgentClient::new(server.uri(), Duration::from_secs(5)).expect("agent client")
}

#[tokio::test]
async fn process_sends_camel_case_request_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/booking/process"))
        .and(header("authorization", "Bearer secret-token"))
        .and(body_partial_json(json!({
            "userPrompt": "đi Huế",
            "currentParams": {"city": "Huế"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "quiz_completed": false,
            "missing_quiz": "Bạn đi mấy đêm?",
            "key_to_collect": "duration",
            "final_params": {"city": "Huế"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = booking_client(&server, Some("secret-token"));
    let request = QuizRequest {
        user_prompt: "đi Huế".to_string(),
        current_params: BookingParameters::new().with(ParamKey::City, "Huế"),
    };

    let response = client.process(&request).await.expect("process");
    match response {
        ProcessResponse::Quiz(step) => assert_eq!(step.key(), Some(&ParamKey::Duration)),
        other => panic!("expected quiz step, got {other:?}"),
    }
}

#[tokio::test]
async fn process_decodes_suggestion_lists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/booking/process"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"establishmentId": "est-1", "establishmentName": "Sea Breeze",
             "finalPrice": "1500000", "unitsAvailable": 3},
            {"establishmentId": "est-2", "finalPrice": 800000}
        ])))
        .mount(&server)
        .await;

    let client = booking_client(&server, None);
    let request =
        QuizRequest { user_prompt: String::new(), current_params: BookingParameters::new() };

    match client.process(&request).await.expect("process") {
        ProcessResponse::Suggestions(suggestions) => {
            assert_eq!(suggestions.len(), 2);
            assert_eq!(suggestions[0].final_price, 1_500_000);
            assert_eq!(suggestions[0].units_available, 3);
        }
        other => panic!("expected suggestions, got {other:?}"),
    }
}

#[tokio::test]
async fn error_status_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/booking/process"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"message": "Thiếu thông tin"})),
        )
        .mount(&server)
        .await;

    let client = booking_client(&server, None);
    let request =
        QuizRequest { user_prompt: "x".to_string(), current_params: BookingParameters::new() };

    let error = client.process(&request).await.expect_err("status error");
    assert_eq!(error.status(), Some(400));
    assert_eq!(error.user_message(), "Thiếu thông tin");
}

#[tokio::test]
async fn user_bookings_tolerates_non_list_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/booking/user/view/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "no bookings"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/booking/user/view/8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": 1,
            "userId": 8,
            "establishmentId": "est-1",
            "startDate": "2025-10-10",
            "duration": 2,
            "totalPriceVnd": 2000000,
            "status": "CONFIRMED"
        }])))
        .mount(&server)
        .await;

    let client = booking_client(&server, None);
    assert!(client.user_bookings(7).await.expect("empty").is_empty());

    let bookings = client.user_bookings(8).await.expect("bookings");
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].duration, 2);
}

#[tokio::test]
async fn agent_search_and_health() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/search"))
        .and(body_partial_json(json!({"query": "resort gần biển", "strategy": "hybrid"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "results": [{"establishment_id": "est-5", "name": "Blue Bay",
                         "relevance_score": 0.7, "metadata": {"city": "Nha Trang"}}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/agent/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sessions": 3})))
        .mount(&server)
        .await;

    let client = agent_client(&server);
    let request = AgentSearchRequest {
        query: "resort gần biển".to_string(),
        strategy: Some(SearchStrategy::Hybrid),
    };
    let response = client.search(&request).await.expect("search");
    let suggestions = response.into_suggestions();
    assert_eq!(suggestions[0].city.as_deref(), Some("Nha Trang"));
    assert!(client.is_healthy().await);
}

#[tokio::test]
async fn unreachable_agent_is_unhealthy() {
    let client = HttpAgentClient::new("http://127.0.0.1:9", Duration::from_secs(1))
        .expect("agent client");
    assert!(!client.is_healthy().await);
    assert!(matches!(client.stats().await, Err(ClientError::Transport { .. })));
}

#[tokio::test]
async fn agent_outage_falls_back_to_quiz_endpoint() {
    let agent_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/agent/chat"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&agent_server)
        .await;

    let booking_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/booking/process"))
        .and(body_partial_json(json!({"userPrompt": "Đà Lạt 2 đêm"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"establishmentId": "est-dl", "finalPrice": 1200000}
        ])))
        .expect(1)
        .mount(&booking_server)
        .await;

    let runtime = AssistantRuntime::new(
        Arc::new(booking_client(&booking_server, None)),
        Arc::new(agent_client(&agent_server)),
        RuntimeSettings::default(),
    );
    let mut session = ConversationSession::new(DialogueMode::Agent);

    let outcome = runtime.handle_utterance(&mut session, "Đà Lạt 2 đêm").await.expect("turn");

    assert_eq!(outcome, TurnOutcome::Suggestions(1));
    assert_eq!(session.mode(), DialogueMode::Quiz);
}
