//! Travel tools an agent loop can dispatch to.
//!
//! - Weather: current conditions from wttr.in
//! - Attraction: recommendations from DuckDuckGo, with a curated fallback

pub mod attraction;
pub mod weather;

pub use attraction::{get_attraction, AttractionFinder, AttractionRecommendation, GetAttractionTool};
pub use weather::{get_weather, GetWeatherTool, WeatherLookup, WeatherReport};
