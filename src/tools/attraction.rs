//! Attraction recommendations from the DuckDuckGo instant-answer API,
//! falling back to a curated per-city table.

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::{AttractionConfig, RecommendationTable};
use crate::error::{Result, TripmateError};
use crate::tool::Tool;

const GENERIC_ADVICE: &str =
    "在任何天气下，都建议参观当地的博物馆、历史古迹和特色街区，体验当地文化。";
const FAILURE_HINT: &str = "建议您可以查询当地旅游官网或使用其他地图应用获取最新信息。";

/// Where a recommendation came from; the first source that yields something wins.
#[derive(Debug, Clone, PartialEq)]
pub enum AttractionRecommendation {
    Abstract { city: String, text: String },
    RelatedTopics { city: String, topics: Vec<String> },
    Curated { city: String, items: Vec<String> },
    Generic { city: String },
}

impl fmt::Display for AttractionRecommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Abstract { city, text } => write!(f, "📍 {city}\n\n{text}"),
            Self::RelatedTopics { city, topics } => {
                let bullets: Vec<String> = topics.iter().map(|t| format!("• {t}")).collect();
                write!(f, "🏞️ {city}景点推荐:\n\n{}", bullets.join("\n\n"))
            }
            Self::Curated { city, items } => {
                write!(f, "🏞️ {city}推荐景点:\n\n{}", items.join("\n\n"))
            }
            Self::Generic { city } => write!(f, "🏞️ {city}通用推荐:\n\n{GENERIC_ADVICE}"),
        }
    }
}

/// The fields of an instant answer that drive selection.
///
/// Read leniently: a null, missing or mistyped field counts as absent.
#[derive(Debug, Default)]
struct InstantAnswer {
    abstract_text: Option<String>,
    /// `Text` of each related-topic entry, in order. Category groups carry
    /// `Topics` instead of `Text` and show up as `None`.
    related_topics: Vec<Option<String>>,
}

impl InstantAnswer {
    fn from_value(body: &Value) -> Self {
        let abstract_text = body
            .get("AbstractText")
            .and_then(Value::as_str)
            .map(str::to_string);
        let related_topics = body
            .get("RelatedTopics")
            .and_then(Value::as_array)
            .map(|topics| {
                topics
                    .iter()
                    .map(|topic| {
                        topic
                            .get("Text")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            abstract_text,
            related_topics,
        }
    }
}

fn strip_tags(text: &str) -> String {
    static TAGS: OnceLock<Regex> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag pattern"))
        .replace_all(text, "")
        .into_owned()
}

fn select(
    city: &str,
    answer: InstantAnswer,
    max_related_topics: usize,
    fallback: &RecommendationTable,
) -> AttractionRecommendation {
    if let Some(text) = answer.abstract_text.filter(|t| !t.is_empty()) {
        return AttractionRecommendation::Abstract {
            city: city.to_string(),
            text,
        };
    }

    let topics: Vec<String> = answer
        .related_topics
        .into_iter()
        .take(max_related_topics)
        .flatten()
        .map(|text| strip_tags(&text))
        .collect();
    if !topics.is_empty() {
        return AttractionRecommendation::RelatedTopics {
            city: city.to_string(),
            topics,
        };
    }

    match fallback.get(city) {
        Some(items) => AttractionRecommendation::Curated {
            city: city.to_string(),
            items: items.to_vec(),
        },
        None => AttractionRecommendation::Generic {
            city: city.to_string(),
        },
    }
}

#[derive(Clone, Default)]
pub struct AttractionFinder {
    http: reqwest::Client,
    config: AttractionConfig,
}

impl AttractionFinder {
    pub fn new(config: AttractionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub async fn recommend(&self, city: &str, weather: &str) -> Result<AttractionRecommendation> {
        let query = format!("{city} {weather} {}", self.config.keywords);
        let url = format!("{}/", self.config.endpoint.trim_end_matches('/'));

        info!(city, weather, "searching attractions");
        let response = self
            .http
            .get(&url)
            .query(&[("q", query.as_str()), ("format", "json"), ("pretty", "0")])
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await?
            .error_for_status()?;

        // The API answers with `application/x-javascript`, so decode by hand.
        let raw = response.text().await?;
        let body: Value = serde_json::from_str(&raw)
            .map_err(|err| TripmateError::Parse(format!("instant answer body: {err}")))?;
        let answer = InstantAnswer::from_value(&body);

        let recommendation = select(
            city,
            answer,
            self.config.max_related_topics,
            &self.config.fallback,
        );
        debug!(?recommendation, "selected recommendation");
        Ok(recommendation)
    }

    /// Renders the recommendation, or an apology with a hint when the search fails.
    pub async fn get_attraction(&self, city: &str, weather: &str) -> String {
        match self.recommend(city, weather).await {
            Ok(recommendation) => recommendation.to_string(),
            Err(err) => {
                warn!(city, error = %err, "attraction search failed");
                format!("抱歉，获取景点推荐时遇到问题: {err}\n\n{FAILURE_HINT}")
            }
        }
    }
}

/// Recommends attractions with the default search configuration.
pub async fn get_attraction(city: &str, weather: &str) -> String {
    AttractionFinder::default().get_attraction(city, weather).await
}

/// Exposes [`AttractionFinder`] as the `get_attraction` tool.
pub struct GetAttractionTool {
    finder: AttractionFinder,
}

impl GetAttractionTool {
    pub fn new(config: AttractionConfig) -> Self {
        Self {
            finder: AttractionFinder::new(config),
        }
    }
}

#[async_trait]
impl Tool for GetAttractionTool {
    fn name(&self) -> &str {
        "get_attraction"
    }

    fn description(&self) -> &str {
        "Recommend tourist attractions for a city given its current weather. Expects {\"city\": string, \"weather\": string}."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "City to visit"},
                "weather": {"type": "string", "description": "Current weather, e.g. 晴 or Sunny"}
            },
            "required": ["city", "weather"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let city = input
            .get("city")
            .and_then(Value::as_str)
            .ok_or_else(|| TripmateError::Protocol("missing `city` for get_attraction".into()))?;
        let weather = input
            .get("weather")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                TripmateError::Protocol("missing `weather` for get_attraction".into())
            })?;

        Ok(Value::String(self.finder.get_attraction(city, weather).await))
    }
}
