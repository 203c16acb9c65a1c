use serde::{Deserialize, Serialize};

/// Language of the generated summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightLanguage {
    Th,
    En,
}

impl InsightLanguage {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "th" => Ok(InsightLanguage::Th),
            "en" => Ok(InsightLanguage::En),
            _ => Err(format!("Invalid language: {}", s)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InsightLanguage::Th => "th",
            InsightLanguage::En => "en",
        }
    }
}

/// Where a summary came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSource {
    Ai,
    Fallback,
}

impl InsightSource {
    /// Badge text shown next to the summary
    pub fn label(&self) -> &'static str {
        match self {
            InsightSource::Ai => "AI",
            InsightSource::Fallback => "Fallback (Free)",
        }
    }
}

/// Monthly summary, tagged with its origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyInsight {
    pub month: String,
    pub language: InsightLanguage,
    pub base_currency: String,
    pub text: String,
    pub source: InsightSource,
}

/// Result of asking for a monthly insight: either the remote AI answer or the
/// locally generated fallback together with why the remote call was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsightOutcome {
    Remote(MonthlyInsight),
    Fallback { insight: MonthlyInsight, reason: String },
}

impl InsightOutcome {
    pub fn insight(&self) -> &MonthlyInsight {
        match self {
            InsightOutcome::Remote(insight) => insight,
            InsightOutcome::Fallback { insight, .. } => insight,
        }
    }

    pub fn into_insight(self) -> MonthlyInsight {
        match self {
            InsightOutcome::Remote(insight) => insight,
            InsightOutcome::Fallback { insight, .. } => insight,
        }
    }

    pub fn source(&self) -> InsightSource {
        self.insight().source
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, InsightOutcome::Fallback { .. })
    }
}
