use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TripmateError};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_WEATHER_ENDPOINT: &str = "https://wttr.in";
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.duckduckgo.com";

/// Connection settings for an OpenAI-compatible chat completion service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientConfig {
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_llm_timeout() -> u64 {
    60
}

impl ClientConfig {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout_secs: default_llm_timeout(),
        }
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Reads `TRIPMATE_MODEL`, `TRIPMATE_API_KEY` and `TRIPMATE_BASE_URL`.
    ///
    /// The key and URL fall back to the conventional `OPENAI_API_KEY` and
    /// `OPENAI_BASE_URL` variables. Nothing is written back to the environment.
    pub fn from_env() -> Result<Self> {
        let model = env::var("TRIPMATE_MODEL")
            .map_err(|_| TripmateError::Config("TRIPMATE_MODEL is not set".into()))?;
        let api_key = env::var("TRIPMATE_API_KEY")
            .or_else(|_| env::var("OPENAI_API_KEY"))
            .map_err(|_| {
                TripmateError::Config("neither TRIPMATE_API_KEY nor OPENAI_API_KEY is set".into())
            })?;
        let base_url = env::var("TRIPMATE_BASE_URL")
            .or_else(|_| env::var("OPENAI_BASE_URL"))
            .unwrap_or_else(|_| default_base_url());
        Ok(Self::new(model, api_key, base_url))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeatherConfig {
    #[serde(default = "default_weather_endpoint")]
    pub endpoint: String,
    /// Unset means the request waits as long as the transport allows.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_weather_endpoint() -> String {
    DEFAULT_WEATHER_ENDPOINT.to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            endpoint: default_weather_endpoint(),
            timeout_secs: None,
        }
    }
}

impl WeatherConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Curated recommendations used when the search service has nothing to offer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RecommendationTable {
    cities: HashMap<String, Vec<String>>,
}

impl RecommendationTable {
    pub fn empty() -> Self {
        Self {
            cities: HashMap::new(),
        }
    }

    pub fn with_city<I, S>(mut self, city: impl Into<String>, recommendations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cities.insert(
            city.into(),
            recommendations.into_iter().map(Into::into).collect(),
        );
        self
    }

    pub fn get(&self, city: &str) -> Option<&[String]> {
        self.cities.get(city).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

impl Default for RecommendationTable {
    fn default() -> Self {
        Self::empty()
            .with_city(
                "北京",
                [
                    "故宫博物院 - 皇家宫殿建筑群，历史文化厚重",
                    "颐和园 - 清代皇家园林，景色优美",
                    "长城 - 世界文化遗产，不到长城非好汉",
                    "天坛公园 - 明清皇帝祭天的场所",
                ],
            )
            .with_city(
                "上海",
                [
                    "外滩 - 上海标志性景观带",
                    "东方明珠塔 - 上海地标建筑",
                    "豫园 - 明代私家园林",
                    "田子坊 - 创意文化街区",
                ],
            )
            .with_city(
                "广州",
                [
                    "广州塔 - 小蛮腰城市地标",
                    "陈家祠 - 岭南建筑艺术瑰宝",
                    "白云山 - 南粤名山，空气清新",
                    "长隆旅游度假区 - 综合主题公园",
                ],
            )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttractionConfig {
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_related_topics")]
    pub max_related_topics: usize,
    #[serde(default = "default_keywords")]
    pub keywords: String,
    #[serde(default)]
    pub fallback: RecommendationTable,
}

fn default_search_endpoint() -> String {
    DEFAULT_SEARCH_ENDPOINT.to_string()
}

fn default_search_timeout() -> u64 {
    10
}

fn default_max_related_topics() -> usize {
    5
}

fn default_keywords() -> String {
    "天气 旅游景点 推荐攻略".to_string()
}

impl Default for AttractionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            timeout_secs: default_search_timeout(),
            max_related_topics: default_max_related_topics(),
            keywords: default_keywords(),
            fallback: RecommendationTable::default(),
        }
    }
}

impl AttractionConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_fallback(mut self, fallback: RecommendationTable) -> Self {
        self.fallback = fallback;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ToolsConfig {
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub attraction: AttractionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "tripmate=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub model: ClientConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|err| TripmateError::Config(format!("failed to parse configuration: {err}")))
    }

    pub fn from_env_or_file(path: impl AsRef<Path>) -> Result<Self> {
        let mut cfg = Self::from_file(path)?;
        if let Ok(model) = env::var("TRIPMATE_MODEL") {
            cfg.model.model = model;
        }
        if let Ok(key) = env::var("TRIPMATE_API_KEY") {
            cfg.model.api_key = key;
        }
        if let Ok(url) = env::var("TRIPMATE_BASE_URL") {
            cfg.model.base_url = url;
        }
        if let Ok(endpoint) = env::var("TRIPMATE_WEATHER_ENDPOINT") {
            cfg.tools.weather.endpoint = endpoint;
        }
        if let Ok(endpoint) = env::var("TRIPMATE_SEARCH_ENDPOINT") {
            cfg.tools.attraction.endpoint = endpoint;
        }
        if let Ok(timeout) = env::var("TRIPMATE_SEARCH_TIMEOUT") {
            if let Ok(parsed) = timeout.parse::<u64>() {
                cfg.tools.attraction.timeout_secs = parsed;
            }
        }
        if let Ok(filter) = env::var("TRIPMATE_LOG") {
            cfg.logging.filter = filter;
        }
        Ok(cfg)
    }

    /// Installs the global subscriber with `logging.filter` as the default filter.
    pub fn init_tracing(&self) -> Result<()> {
        crate::telemetry::init_tracing(&self.logging.filter)
    }
}
