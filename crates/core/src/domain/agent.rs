//! Wire types for the natural-language agent service (`/agent/*`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::params::{BookingParameters, ParamKey};
use crate::domain::suggestion::{count_from_json, price_from_json, Suggestion};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub preferences: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_range: Option<(i64, i64)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_cities: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub preferred_amenities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub travel_companion: Option<String>,
}

impl UserProfile {
    /// Folds `metadata.user_insights` from an agent reply into the preferences.
    /// Returns whether anything was absorbed.
    pub fn absorb_insights(&mut self, metadata: &Map<String, Value>) -> bool {
        let Some(Value::Object(insights)) = metadata.get("user_insights") else {
            return false;
        };
        for (key, value) in insights {
            self.preferences.insert(key.clone(), value.clone());
        }
        !insights.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentChatRequest {
    pub message: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_profile: Option<UserProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    Semantic,
    Hybrid,
    Contextual,
}

impl SearchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Semantic => "semantic",
            Self::Hybrid => "hybrid",
            Self::Contextual => "contextual",
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "semantic" => Ok(Self::Semantic),
            "hybrid" => Ok(Self::Hybrid),
            "contextual" => Ok(Self::Contextual),
            other => Err(format!(
                "unsupported search strategy `{other}` (expected semantic|hybrid|contextual)"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSearchRequest {
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<SearchStrategy>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub establishment_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub relevance_score: f32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub explanation: String,
}

impl SearchResult {
    pub fn into_suggestion(self) -> Suggestion {
        let metadata_text = |key: &str| {
            self.metadata.get(key).and_then(Value::as_str).filter(|text| !text.is_empty())
        };
        let image = metadata_text("image_url_main").map(ToString::to_string);
        let units_available = self
            .metadata
            .get("availability")
            .and_then(|availability| availability.get("units_available"))
            .map(count_from_json)
            .unwrap_or(0);

        Suggestion {
            establishment_id: self.establishment_id.clone(),
            establishment_name: self.name.clone(),
            city: Some(metadata_text("city").unwrap_or("N/A").to_string()),
            item_type: Some(metadata_text("type").unwrap_or("HOTEL").to_string()),
            final_price: self.metadata.get("price_range_vnd").map(price_from_json).unwrap_or(0),
            units_available,
            image_url_main: image.clone(),
            item_image_url: image,
            floor_area: Some(metadata_text("floor_area").unwrap_or("Standard").to_string()),
            relevance_score: Some(self.relevance_score),
            explanation: Some(self.explanation.clone()).filter(|text| !text.is_empty()),
            ..Suggestion::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentChatResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub results: Vec<SearchResult>,
    #[serde(default)]
    pub intent: String,
    #[serde(default)]
    pub strategy_used: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub processing_time: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl AgentChatResponse {
    pub fn into_suggestions(self) -> Vec<Suggestion> {
        self.results.into_iter().map(SearchResult::into_suggestion).collect()
    }
}

/// Parameter map enriched with the derived hints the agent ranks on.
pub fn build_agent_context(params: &BookingParameters) -> Map<String, Value> {
    let mut context = params.to_json_map();

    let amenities = params.amenities();
    if !amenities.is_empty() {
        context.insert("amenities_count".to_string(), Value::from(amenities.len()));
    }

    if let Some(max_price) = params.number(&ParamKey::MaxPrice).filter(|price| *price > 0) {
        let category = if max_price < 1_000_000 {
            "budget"
        } else if max_price < 3_000_000 {
            "mid"
        } else {
            "luxury"
        };
        context.insert("budget_category".to_string(), Value::from(category));
    }

    if let Some(duration) = params.number(&ParamKey::Duration).filter(|nights| *nights > 0) {
        let trip_length = if duration < 3 {
            "short"
        } else if duration < 7 {
            "medium"
        } else {
            "long"
        };
        context.insert("trip_length".to_string(), Value::from(trip_length));
    }

    context
}

pub fn search_strategy_for(context: &Map<String, Value>) -> SearchStrategy {
    let amenity_count = context.get("amenities_count").and_then(Value::as_u64).unwrap_or(0);
    if amenity_count > 3 {
        return SearchStrategy::Contextual;
    }

    let max_price = context.get("max_price").map(price_from_json).unwrap_or(0);
    if max_price > 3_000_000 {
        return SearchStrategy::Hybrid;
    }

    SearchStrategy::Semantic
}
