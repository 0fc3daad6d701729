use super::*;

use chrono::{Datelike, Timelike};
use serde_json::json;

use crate::domain::{Template, TemplateId};

#[test]
fn timestamps_accept_the_backend_formats() {
    let rfc3339 = timestamp::parse("2024-03-01T10:15:00+02:00").expect("rfc3339");
    assert_eq!(rfc3339.hour(), 8);

    let rfc2822 = timestamp::parse("Fri, 01 Mar 2024 10:15:00 GMT").expect("rfc2822");
    assert_eq!(rfc2822.day(), 1);

    let naive = timestamp::parse("2024-03-01T10:15:00.123456").expect("naive");
    assert_eq!((naive.hour(), naive.minute()), (10, 15));

    assert!(timestamp::parse("yesterday").is_none());
}

#[test]
fn blank_timestamps_deserialize_as_absent() {
    let comment: Comment = serde_json::from_value(json!({
        "id": 4,
        "content": "Looks good",
        "user": {"id": 1, "name": "Ada"},
        "created_at": ""
    }))
    .expect("comment");
    assert!(comment.created_at.is_none());
    assert!(!comment.resolved);

    let invalid = serde_json::from_value::<Comment>(json!({
        "id": 4,
        "content": "x",
        "user": {"id": 1},
        "created_at": "not a date"
    }));
    assert!(invalid.is_err());
}

#[test]
fn template_ids_may_be_numbers_or_slugs() {
    let numeric: Template =
        serde_json::from_value(json!({"id": 7, "name": "Consulting"})).expect("numeric");
    let slug: Template =
        serde_json::from_value(json!({"id": "nda", "name": "NDA"})).expect("slug");

    assert_eq!(numeric.id, TemplateId("7".into()));
    assert_eq!(slug.id, TemplateId("nda".into()));
    assert!(numeric.content.is_empty());
}

#[test]
fn analysis_replies_pick_the_matching_shape() {
    let structured: AnalyzeResponse =
        serde_json::from_value(json!({"success": true, "sections": []})).expect("sections");
    assert!(matches!(structured, AnalyzeResponse::Structured { .. }));

    let text: AnalyzeResponse =
        serde_json::from_value(json!({"analysis": "SUMMARY: ok"})).expect("text");
    assert!(matches!(text, AnalyzeResponse::Text { .. }));

    let failed: AnalyzeResponse =
        serde_json::from_value(json!({"error": "No content provided"})).expect("error");
    assert!(matches!(failed, AnalyzeResponse::Failed { .. }));
}

#[test]
fn risk_scores_parse_from_numbers_and_text() {
    assert_eq!(WireScore::Number(7.0).value(), Some(7.0));
    assert_eq!(WireScore::Text(" 6.5/10 ".into()).value(), Some(6.5));
    assert_eq!(WireScore::Text("high".into()).value(), None);

    let detailed: RiskResponse = serde_json::from_value(json!({
        "overall_risk_score": "8",
        "risk_summary": "Heavy indemnity",
        "clauses": [{"clause": "Indemnity", "risk_level": "HIGH", "details": "Uncapped"}]
    }))
    .expect("detailed");
    assert!(matches!(detailed, RiskResponse::Detailed { .. }));
}

#[test]
fn optional_send_fields_are_omitted() {
    let request = SendRequest {
        contract: "NDA".into(),
        signers: vec![],
        signature_positions: None,
        use_ai_positioning: None,
    };
    assert_eq!(
        serde_json::to_value(&request).expect("encode"),
        json!({"contract": "NDA", "signers": []})
    );

    let settings = SaveSettingsRequest {
        openai_key: "sk".into(),
        docusign_key: String::new(),
    };
    assert_eq!(
        serde_json::to_value(&settings).expect("encode"),
        json!({"openaiKey": "sk", "docusignKey": ""})
    );
}
