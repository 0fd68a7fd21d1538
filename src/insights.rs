//! AI insights
//!
//! Typed view of the recommendation payload produced by the analysis
//! function. The payload has no fixed schema, so parsing is lenient:
//! recommendations with an unknown type or no title are dropped, missing text
//! fields are empty, and unrecognised insight keys are kept as raw JSON.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Kind of recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    /// Buy several tools together.
    Bundle,

    /// A cheaper or better-value substitute.
    Alternative,

    /// A higher-spec model worth the extra spend.
    Upgrade,

    /// An add-on for the searched tool.
    Accessory,
}

impl RecommendationKind {
    /// Parses a payload `type` value, ignoring case.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "bundle" => Some(Self::Bundle),
            "alternative" => Some(Self::Alternative),
            "upgrade" => Some(Self::Upgrade),
            "accessory" => Some(Self::Accessory),
            _ => None,
        }
    }

    /// Display label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bundle => "Bundle",
            Self::Alternative => "Alternative",
            Self::Upgrade => "Upgrade",
            Self::Accessory => "Accessory",
        }
    }
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single AI recommendation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Kind of recommendation.
    #[serde(rename = "type")]
    pub kind: RecommendationKind,

    /// Short headline.
    pub title: String,

    /// What is being recommended.
    pub description: String,

    /// Why it is recommended.
    pub reasoning: String,

    /// Estimated saving, as supplied (e.g. `"£15.00"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub potential_savings: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecommendation {
    #[serde(rename = "type", default)]
    kind: Option<String>,

    #[serde(default)]
    title: Option<String>,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    reasoning: Option<String>,

    #[serde(default)]
    potential_savings: Option<Value>,
}

impl Recommendation {
    /// Parses one recommendation, or `None` if it has no recognised type or no title.
    pub fn from_value(value: Value) -> Option<Self> {
        let raw: RawRecommendation = serde_json::from_value(value).ok()?;
        let kind = RecommendationKind::parse(raw.kind.as_deref()?)?;
        let title = raw.title.filter(|title| !title.trim().is_empty())?;

        Some(Self {
            kind,
            title,
            description: raw.description.unwrap_or_default(),
            reasoning: raw.reasoning.unwrap_or_default(),
            potential_savings: raw.potential_savings.and_then(text_value),
        })
    }
}

/// Market-level observations accompanying the recommendations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketInsights {
    /// Which offer is the best value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_value: Option<String>,

    /// Observed price trend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_trend: Option<String>,

    /// Free-form market analysis.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_analysis: Option<String>,

    /// Buying tips.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tips: Vec<String>,

    /// Any other keys, kept verbatim.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl MarketInsights {
    /// Parses the `insights` object. Anything other than an object yields empty insights.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut object) = value else {
            return Self::default();
        };

        let best_value = object.remove("bestValue").and_then(text_value);
        let price_trend = object.remove("priceTrend").and_then(text_value);
        let market_analysis = object.remove("marketAnalysis").and_then(text_value);
        let tips = match object.remove("tips") {
            Some(Value::Array(tips)) => tips.into_iter().filter_map(text_value).collect(),
            Some(tip) => text_value(tip).into_iter().collect(),
            None => Vec::new(),
        };

        Self {
            best_value,
            price_trend,
            market_analysis,
            tips,
            other: object,
        }
    }

    /// Whether no insight was supplied.
    pub fn is_empty(&self) -> bool {
        self.best_value.is_none()
            && self.price_trend.is_none()
            && self.market_analysis.is_none()
            && self.tips.is_empty()
            && self.other.is_empty()
    }
}

/// Recommendations and market insights for one comparison.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AiInsights {
    /// Recommendations with a recognised type.
    pub recommendations: Vec<Recommendation>,

    /// Market insights.
    pub insights: MarketInsights,
}

impl AiInsights {
    /// Builds insights from the raw payload fields.
    pub fn from_payload(recommendations: Vec<Value>, insights: Value) -> Self {
        let received = recommendations.len();

        let recommendations: Vec<Recommendation> = recommendations
            .into_iter()
            .filter_map(Recommendation::from_value)
            .collect();

        if recommendations.len() < received {
            debug!(
                received,
                kept = recommendations.len(),
                "dropped unrecognised recommendations"
            );
        }

        Self {
            recommendations,
            insights: MarketInsights::from_value(insights),
        }
    }

    /// Recommendations of one kind.
    pub fn of_kind(&self, kind: RecommendationKind) -> impl Iterator<Item = &Recommendation> {
        self.recommendations
            .iter()
            .filter(move |recommendation| recommendation.kind == kind)
    }
}

fn text_value(value: Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
