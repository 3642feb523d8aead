use serde_json::{json, Value};
use tripmate::{
    ClientConfig, ErrorKind, LanguageModel, OpenAICompatibleClient, TripmateError,
    GENERATE_FAILURE,
};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> OpenAICompatibleClient {
    let base_url = format!("{}/v1", server.uri());
    OpenAICompatibleClient::new(ClientConfig::new("qwen-plus", "sk-test", base_url)).unwrap()
}

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn generate_posts_one_two_message_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Thought: 先查天气")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let answer = client.generate("北京天气如何?", "你是旅行助手").await;
    assert_eq!(answer, "Thought: 先查天气");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["model"], "qwen-plus");
    assert_eq!(body["stream"], false);
    assert_eq!(
        body["messages"],
        json!([
            {"role": "system", "content": "你是旅行助手"},
            {"role": "user", "content": "北京天气如何?"}
        ])
    );
}

#[tokio::test]
async fn generate_returns_sentinel_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.generate("hi", "sys").await, GENERATE_FAILURE);
}

#[tokio::test]
async fn complete_reports_auth_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&server)
        .await;

    let err = client_for(&server).complete("hi", "sys").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(matches!(err, TripmateError::Auth { status: 401, .. }));
}

#[tokio::test]
async fn complete_reports_missing_choices_as_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.complete("hi", "sys").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(client.generate("hi", "sys").await, GENERATE_FAILURE);
}

#[tokio::test]
async fn unreachable_service_is_a_network_error() {
    let client =
        OpenAICompatibleClient::new(ClientConfig::new("m", "k", "http://127.0.0.1:1/v1")).unwrap();
    let err = client.complete("hi", "sys").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(client.generate("hi", "sys").await, GENERATE_FAILURE);
}
