//! Building blocks for a tool-using travel-assistant agent.
//!
//! The crate provides:
//! - An OpenAI-compatible chat client (`OpenAICompatibleClient`) behind the
//!   `LanguageModel` trait.
//! - Two tools, `get_weather` and `get_attraction`, each doing one outbound
//!   HTTP call and answering with text.
//! - A `ToolRegistry` mapping tool names to tools for an external agent loop.

mod config;
mod error;
mod llm;
mod message;
mod telemetry;
mod tool;
mod toolkit;
pub mod tools;

pub use config::{
    AppConfig, AttractionConfig, ClientConfig, LoggingConfig, RecommendationTable, ToolsConfig,
    WeatherConfig,
};
pub use error::{ErrorKind, Result, TripmateError};
pub use llm::{LanguageModel, OpenAICompatibleClient, GENERATE_FAILURE};
#[cfg(any(test, feature = "testing"))]
pub use llm::StubModel;
pub use message::{ChatRequest, Message, Role};
pub use telemetry::init_tracing;
pub use tool::{Tool, ToolDescription, ToolRegistry};
pub use toolkit::travel_toolkit;
pub use tools::{get_attraction, get_weather};
