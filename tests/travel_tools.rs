use std::time::Duration;

use serde_json::{json, Value};
use tripmate::tools::{AttractionFinder, WeatherLookup};
use tripmate::{travel_toolkit, AttractionConfig, ToolsConfig, WeatherConfig};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BEIJING_QUERY: &str = "北京 晴 天气 旅游景点 推荐攻略";

fn weather_body(desc: &str, temp: &str) -> Value {
    json!({
        "current_condition": [{
            "temp_C": temp,
            "FeelsLikeC": temp,
            "weatherDesc": [{"value": desc}]
        }],
        "nearest_area": []
    })
}

fn search_reply(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "application/x-javascript")
}

async fn finder_with(body: Value) -> (MockServer, AttractionFinder) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("q", BEIJING_QUERY))
        .and(query_param("format", "json"))
        .and(query_param("pretty", "0"))
        .respond_with(search_reply(body))
        .expect(1)
        .mount(&server)
        .await;
    let finder = AttractionFinder::new(AttractionConfig::default().with_endpoint(server.uri()));
    (server, finder)
}

#[tokio::test]
async fn weather_reports_city_condition_and_temperature() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Beijing"))
        .and(query_param("format", "j1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body("Sunny", "20")))
        .expect(1)
        .mount(&server)
        .await;

    let lookup = WeatherLookup::new(WeatherConfig::default().with_endpoint(server.uri()));
    let text = lookup.get_weather("Beijing").await;
    assert_eq!(text, "Beijing当前天气:Sunny，气温20摄氏度");
}

#[tokio::test]
async fn weather_keeps_service_temperature_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Beijing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body("Sunny", "20.0")))
        .mount(&server)
        .await;

    let lookup = WeatherLookup::new(WeatherConfig::default().with_endpoint(server.uri()));
    let report = lookup.fetch_weather("Beijing").await.unwrap();
    assert_eq!(report.temp_c, "20.0");
    assert_eq!(report.to_string(), "Beijing当前天气:Sunny，气温20.0摄氏度");
}

#[tokio::test]
async fn weather_network_failure_becomes_error_text() {
    let lookup = WeatherLookup::new(WeatherConfig::default().with_endpoint("http://127.0.0.1:1"));
    let text = lookup.get_weather("Beijing").await;
    assert!(text.starts_with("错误:查询天气时遇到网络问题"), "{text}");
}

#[tokio::test]
async fn weather_http_status_counts_as_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let lookup = WeatherLookup::new(WeatherConfig::default().with_endpoint(server.uri()));
    assert!(lookup.get_weather("Nowhere").await.starts_with("错误:查询天气时遇到网络问题"));
}

#[tokio::test]
async fn weather_for_unrecognised_city_becomes_parse_error_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"current_condition": []})))
        .mount(&server)
        .await;

    let lookup = WeatherLookup::new(WeatherConfig::default().with_endpoint(server.uri()));
    let text = lookup.get_weather("Atlantis").await;
    assert!(text.starts_with("错误:解析天气数据失败，可能是城市名称无效"), "{text}");
}

#[tokio::test]
async fn attraction_prefers_abstract_text() {
    let (_server, finder) = finder_with(json!({
        "AbstractText": "北京是中国的首都，拥有故宫和长城。",
        "RelatedTopics": [{"Text": "ignored"}]
    }))
    .await;

    let text = finder.get_attraction("北京", "晴").await;
    assert_eq!(text, "📍 北京\n\n北京是中国的首都，拥有故宫和长城。");
}

#[tokio::test]
async fn attraction_lists_related_topics_without_markup() {
    let (_server, finder) = finder_with(json!({
        "AbstractText": "",
        "RelatedTopics": [
            {"Text": "<b>故宫</b> 明清皇宫", "FirstURL": "https://duckduckgo.com/a"},
            {"Text": "<a href=\"https://duckduckgo.com/b\">颐和园</a> 皇家园林"},
            {"Text": "天坛<br/>祭天场所"}
        ]
    }))
    .await;

    let text = finder.get_attraction("北京", "晴").await;
    let bullets: Vec<&str> = text.lines().filter(|line| line.starts_with("• ")).collect();
    assert_eq!(bullets, vec!["• 故宫 明清皇宫", "• 颐和园 皇家园林", "• 天坛祭天场所"]);
    assert!(text.starts_with("🏞️ 北京景点推荐:"));
}

#[tokio::test]
async fn attraction_falls_back_to_curated_city_list() {
    let (_server, finder) = finder_with(json!({"AbstractText": "", "RelatedTopics": []})).await;

    let text = finder.get_attraction("北京", "晴").await;
    assert_eq!(
        text,
        "🏞️ 北京推荐景点:\n\n故宫博物院 - 皇家宫殿建筑群，历史文化厚重\n\n颐和园 - 清代皇家园林，景色优美\n\n长城 - 世界文化遗产，不到长城非好汉\n\n天坛公园 - 明清皇帝祭天的场所"
    );
}

#[tokio::test]
async fn attraction_treats_null_fields_as_empty() {
    let (_server, finder) =
        finder_with(json!({"AbstractText": null, "RelatedTopics": null})).await;

    let text = finder.get_attraction("北京", "晴").await;
    assert!(text.starts_with("🏞️ 北京推荐景点:\n\n故宫博物院"), "{text}");
    assert!(text.ends_with("天坛公园 - 明清皇帝祭天的场所"), "{text}");
}

#[tokio::test]
async fn attraction_uses_generic_advice_for_unknown_city() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(search_reply(json!({"AbstractText": "", "RelatedTopics": []})))
        .mount(&server)
        .await;

    let finder = AttractionFinder::new(AttractionConfig::default().with_endpoint(server.uri()));
    let text = finder.get_attraction("拉萨", "晴").await;
    assert_eq!(
        text,
        "🏞️ 拉萨通用推荐:\n\n在任何天气下，都建议参观当地的博物馆、历史古迹和特色街区，体验当地文化。"
    );
}

#[tokio::test]
async fn attraction_failure_becomes_apology() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let finder = AttractionFinder::new(AttractionConfig::default().with_endpoint(server.uri()));
    let text = finder.get_attraction("北京", "晴").await;
    assert!(text.starts_with("抱歉，获取景点推荐时遇到问题"), "{text}");
    assert!(text.ends_with("建议您可以查询当地旅游官网或使用其他地图应用获取最新信息。"));
}

#[tokio::test]
async fn attraction_search_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            search_reply(json!({"AbstractText": "too late"})).set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = AttractionConfig::default().with_endpoint(server.uri());
    config.timeout_secs = 1;
    let text = AttractionFinder::new(config).get_attraction("北京", "晴").await;
    assert!(text.starts_with("抱歉，获取景点推荐时遇到问题"), "{text}");
}

#[tokio::test]
async fn registry_dispatches_by_tool_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Shanghai"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body("Light rain", "16")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(search_reply(json!({"AbstractText": "", "RelatedTopics": []})))
        .mount(&server)
        .await;

    let config = ToolsConfig {
        weather: WeatherConfig::default().with_endpoint(server.uri()),
        attraction: AttractionConfig::default().with_endpoint(server.uri()),
    };
    let registry = travel_toolkit(&config);
    assert_eq!(registry.names(), vec!["get_attraction", "get_weather"]);

    let weather = registry
        .call("get_weather", json!({"city": "Shanghai"}))
        .await
        .unwrap();
    assert_eq!(weather, json!("Shanghai当前天气:Light rain，气温16摄氏度"));

    let attraction = registry
        .call("get_attraction", json!({"city": "上海", "weather": "小雨"}))
        .await
        .unwrap();
    assert!(attraction.as_str().unwrap().starts_with("🏞️ 上海推荐景点:"));

    assert!(registry.call("book_hotel", json!({})).await.is_err());
}
