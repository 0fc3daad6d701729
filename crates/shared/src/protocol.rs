use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    CollaboratorRole, CommentId, InvitationId, SignaturePosition, Signer, UserId,
};

/// Body shared by every endpoint that only needs the contract text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRequest {
    pub content: String,
}

/// Signature-position body. Older backends read `contract_text`, newer ones
/// `content`, so both carry the contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignaturePositionsRequest {
    pub content: String,
    pub contract_text: String,
}

impl SignaturePositionsRequest {
    pub fn new(contract: impl Into<String>) -> Self {
        let content = contract.into();
        Self {
            contract_text: content.clone(),
            content,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteRequest {
    pub content: String,
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    pub contract: String,
    pub signers: Vec<Signer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_positions: Option<Vec<SignaturePosition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_ai_positioning: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSettingsRequest {
    #[serde(default)]
    pub openai_key: String,
    #[serde(default)]
    pub docusign_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvitationRequest {
    pub email: String,
    pub role: CollaboratorRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRequest {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
}

/// `/api/analyze` replies. Depending on backend revision the analysis is
/// either pre-split into sections or returned as one marker-delimited blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalyzeResponse {
    Structured { sections: Vec<WireSection> },
    Text { analysis: String },
    Failed { error: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireSection {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<WireItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// `/api/analyze/risks` replies. The structured-service shape carries
/// `overall_risk_score`; the line-parsed shape uses `risk_score`. Anything
/// the first shape rejects, such as a null score, falls through to the
/// second, which keeps whatever clauses came along.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RiskResponse {
    Detailed {
        overall_risk_score: WireScore,
        #[serde(default, alias = "summary")]
        risk_summary: Option<String>,
        #[serde(default)]
        clauses: Vec<WireClause>,
        #[serde(default)]
        key_concerns: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    Legacy {
        #[serde(default)]
        risk_score: Option<WireScore>,
        #[serde(default)]
        overall_risk_score: Option<WireScore>,
        #[serde(default, alias = "risk_summary")]
        summary: Option<String>,
        #[serde(default)]
        concerns: Vec<WireConcern>,
        #[serde(default)]
        clauses: Vec<WireClause>,
        #[serde(default)]
        key_concerns: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireScore {
    Number(f64),
    Text(String),
}

impl WireScore {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(text) => text.trim().trim_end_matches("/10").trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireClause {
    #[serde(default, alias = "title")]
    pub clause: String,
    #[serde(default, alias = "level")]
    pub risk_level: Option<String>,
    #[serde(default, alias = "description")]
    pub details: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireConcern {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RewriteResponse {
    #[serde(default)]
    pub rewritten: Option<String>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadResponse {
    #[serde(default, alias = "text")]
    pub content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignaturePositionsResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub positions: Option<PositionsPayload>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Positions arrive either decoded or as a JSON document inside a string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PositionsPayload {
    Decoded(Vec<SignaturePosition>),
    Encoded(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub envelope_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveSettingsResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invitation {
    pub id: InvitationId,
    pub email: String,
    pub role: CollaboratorRole,
    #[serde(default)]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub user: UserRef,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSummary {
    pub version: u32,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: UserRef,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub number: u32,
    pub content: String,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionComparison {
    pub version1: VersionSnapshot,
    pub version2: VersionSnapshot,
}

/// Backend timestamps come as RFC 3339, RFC 2822 (`Mon, 01 Jan 2024 ... GMT`)
/// or naive ISO-8601 without an offset, which is taken as UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        if let Ok(parsed) = DateTime::parse_from_rfc2822(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
        }
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
