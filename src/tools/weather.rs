//! Current weather lookup backed by wttr.in.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::config::WeatherConfig;
use crate::error::{ErrorKind, Result, TripmateError};
use crate::tool::Tool;

/// Current conditions for one city, as reported by the weather service.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub description: String,
    /// `temp_C` exactly as the service sent it.
    pub temp_c: String,
}

impl WeatherReport {
    pub fn temp_celsius(&self) -> Option<f64> {
        self.temp_c.trim().parse().ok()
    }
}

impl fmt::Display for WeatherReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}当前天气:{}，气温{}摄氏度",
            self.city, self.description, self.temp_c
        )
    }
}

#[derive(Clone, Default)]
pub struct WeatherLookup {
    http: reqwest::Client,
    config: WeatherConfig,
}

impl WeatherLookup {
    pub fn new(config: WeatherConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub async fn fetch_weather(&self, city: &str) -> Result<WeatherReport> {
        let url = format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            urlencoding::encode(city)
        );

        let mut request = self.http.get(&url).query(&[("format", "j1")]);
        if let Some(secs) = self.config.timeout_secs {
            request = request.timeout(Duration::from_secs(secs));
        }

        info!(city, "querying weather");
        let response = request.send().await?.error_for_status()?;
        let body: Value = response
            .json()
            .await
            .map_err(|err| TripmateError::Parse(format!("weather body: {err}")))?;

        parse_report(city, &body)
    }

    /// Renders the report, or an `错误:`-prefixed sentence when the lookup fails.
    pub async fn get_weather(&self, city: &str) -> String {
        match self.fetch_weather(city).await {
            Ok(report) => report.to_string(),
            Err(err) => {
                warn!(city, error = %err, "weather lookup failed");
                render_error(&err)
            }
        }
    }
}

/// Looks up `city` with the default wttr.in configuration.
pub async fn get_weather(city: &str) -> String {
    WeatherLookup::default().get_weather(city).await
}

fn parse_report(city: &str, body: &Value) -> Result<WeatherReport> {
    let current = body
        .get("current_condition")
        .and_then(|c| c.get(0))
        .ok_or_else(|| TripmateError::Parse("missing current_condition[0]".into()))?;

    let description = current
        .get("weatherDesc")
        .and_then(|d| d.get(0))
        .and_then(|d| d.get("value"))
        .and_then(Value::as_str)
        .ok_or_else(|| TripmateError::Parse("missing weatherDesc[0].value".into()))?;

    let temp_c = match current.get("temp_C") {
        Some(Value::String(raw)) => raw.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(TripmateError::Parse("missing temp_C".into())),
    };

    Ok(WeatherReport {
        city: city.to_string(),
        description: description.to_string(),
        temp_c,
    })
}

fn render_error(err: &TripmateError) -> String {
    match err.kind() {
        ErrorKind::Network => format!("错误:查询天气时遇到网络问题 - {err}"),
        _ => format!("错误:解析天气数据失败，可能是城市名称无效 - {err}"),
    }
}

/// Exposes [`WeatherLookup`] as the `get_weather` tool.
pub struct GetWeatherTool {
    lookup: WeatherLookup,
}

impl GetWeatherTool {
    pub fn new(config: WeatherConfig) -> Self {
        Self {
            lookup: WeatherLookup::new(config),
        }
    }
}

#[async_trait]
impl Tool for GetWeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather of a city. Expects {\"city\": string}."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "City name, e.g. 北京 or Beijing"}
            },
            "required": ["city"]
        }))
    }

    async fn call(&self, input: Value) -> Result<Value> {
        let city = input
            .get("city")
            .and_then(Value::as_str)
            .ok_or_else(|| TripmateError::Protocol("missing `city` for get_weather".into()))?;

        Ok(Value::String(self.lookup.get_weather(city).await))
    }
}
