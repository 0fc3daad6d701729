use shared::protocol::{RiskResponse, WireClause, WireScore};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskColor {
    Red,
    Yellow,
    Green,
    Gray,
}

impl RiskColor {
    /// Maps a free-form risk level onto a display colour. Total over all
    /// inputs, including a missing level.
    pub fn classify(level: Option<&str>) -> Self {
        let Some(level) = level else {
            return Self::Gray;
        };
        match level.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Self::Red,
            "MEDIUM" => Self::Yellow,
            "LOW" => Self::Green,
            _ => Self::Gray,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Gray => "gray",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConcern {
    pub title: String,
    pub level: Option<String>,
    pub description: String,
}

impl RiskConcern {
    pub fn color(&self) -> RiskColor {
        RiskColor::classify(self.level.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskAssessment {
    /// Score on a 1-10 scale; `None` when the model gave no usable number.
    pub score: Option<f64>,
    pub summary: String,
    pub concerns: Vec<RiskConcern>,
}

fn trimmed(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

fn key_concern(text: String) -> Option<RiskConcern> {
    let title = text.trim().to_string();
    (!title.is_empty()).then(|| RiskConcern {
        title,
        level: None,
        description: String::new(),
    })
}

fn clause_concern(clause: WireClause) -> RiskConcern {
    RiskConcern {
        title: clause.clause.trim().to_string(),
        level: level(clause.risk_level),
        description: clause.details.trim().to_string(),
    }
}

fn level(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn normalize_risk(response: RiskResponse) -> ClientResult<RiskAssessment> {
    match response {
        RiskResponse::Detailed {
            overall_risk_score,
            risk_summary,
            clauses,
            key_concerns,
            error,
        } => {
            if let Some(error) = error.filter(|e| !e.trim().is_empty()) {
                return Err(ClientError::Backend(error));
            }
            let mut concerns: Vec<RiskConcern> = clauses.into_iter().map(clause_concern).collect();
            concerns.extend(key_concerns.into_iter().filter_map(key_concern));
            Ok(RiskAssessment {
                score: overall_risk_score.value(),
                summary: trimmed(risk_summary),
                concerns,
            })
        }
        RiskResponse::Legacy {
            risk_score,
            overall_risk_score,
            summary,
            concerns,
            clauses,
            key_concerns,
            error,
        } => {
            if let Some(error) = error.filter(|e| !e.trim().is_empty()) {
                return Err(ClientError::Backend(error));
            }
            let mut normalized: Vec<RiskConcern> = concerns
                .into_iter()
                .map(|concern| RiskConcern {
                    title: concern.title.trim().to_string(),
                    level: level(concern.level),
                    description: concern.description.trim().to_string(),
                })
                .collect();
            normalized.extend(clauses.into_iter().map(clause_concern));
            normalized.extend(key_concerns.into_iter().filter_map(key_concern));
            Ok(RiskAssessment {
                score: risk_score
                    .or(overall_risk_score)
                    .as_ref()
                    .and_then(WireScore::value),
                summary: trimmed(summary),
                concerns: normalized,
            })
        }
    }
}

#[cfg(test)]
#[path = "tests/risk_tests.rs"]
mod tests;
