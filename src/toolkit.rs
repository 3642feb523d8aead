use crate::config::ToolsConfig;
use crate::tool::ToolRegistry;
use crate::tools::{GetAttractionTool, GetWeatherTool};

/// Registers `get_weather` and `get_attraction`.
pub fn travel_toolkit(config: &ToolsConfig) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(GetWeatherTool::new(config.weather.clone()));
    registry.register(GetAttractionTool::new(config.attraction.clone()));
    registry
}
