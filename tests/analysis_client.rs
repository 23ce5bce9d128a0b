use serde_json::json;

use fineprint::analysis::{AnalysisClient, CancellationDifficulty, OpenAiClient};
use fineprint::cli::config::AnalysisSettings;
use fineprint::AnalysisError;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(AnalysisSettings {
        api_base: format!("{}/v1", server.uri()),
        api_key: Some("sk-test".to_string()),
        ..AnalysisSettings::default()
    })
    .unwrap()
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    }))
}

fn full_analysis() -> serde_json::Value {
    json!({
        "offerSummary": "Streaming trial for $0.99",
        "plainEnglishSummary": "You pay full price after 30 days unless you cancel.",
        "hiddenRequirements": ["Credit card required"],
        "redFlags": ["Auto-renews at $15.99"],
        "riskScore": 65,
        "clarityScore": 40,
        "cancellationDifficulty": "Medium",
        "riskScoreExplanation": "Silent renewal"
    })
}

#[tokio::test]
async fn parses_successful_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_string_contains("json_object"))
        .and(body_string_contains("Cancel within 30 days"))
        .respond_with(completion(&full_analysis().to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let analysis = client(&server)
        .analyze("Cancel within 30 days to avoid the monthly charge.")
        .await
        .unwrap();

    assert_eq!(analysis.risk_score, 65);
    assert_eq!(analysis.clarity_score, 40);
    assert_eq!(analysis.cancellation_difficulty, CancellationDifficulty::Medium);
    assert_eq!(analysis.red_flags, vec!["Auto-renews at $15.99".to_string()]);
    assert_eq!(analysis.risk_score_explanation.as_deref(), Some("Silent renewal"));
    assert_eq!(analysis.clarity_score_explanation, None);
}

#[tokio::test]
async fn missing_field_is_reported() {
    let server = MockServer::start().await;
    let mut reply = full_analysis();
    reply.as_object_mut().unwrap().remove("riskScore");
    Mock::given(path("/v1/chat/completions"))
        .respond_with(completion(&reply.to_string()))
        .mount(&server)
        .await;

    let err = client(&server).analyze("some terms").await.unwrap_err();
    assert!(matches!(err, AnalysisError::FieldMissing("riskScore")));
}

#[tokio::test]
async fn non_json_reply_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/chat/completions"))
        .respond_with(completion("Sorry, I can't help with that."))
        .mount(&server)
        .await;

    let err = client(&server).analyze("some terms").await.unwrap_err();
    assert!(matches!(err, AnalysisError::Parse(_)));
}

#[tokio::test]
async fn empty_choices_is_empty_response() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = client(&server).analyze("some terms").await.unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyResponse));
}

#[tokio::test]
async fn api_error_carries_status() {
    let server = MockServer::start().await;
    Mock::given(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
        .mount(&server)
        .await;

    let err = client(&server).analyze("some terms").await.unwrap_err();
    match err {
        AnalysisError::Api { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "rate limited");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
