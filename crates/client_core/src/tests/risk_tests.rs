use super::*;

#[test]
fn classifies_levels_case_insensitively() {
    assert_eq!(RiskColor::classify(Some("high")), RiskColor::Red);
    assert_eq!(RiskColor::classify(Some("HIGH")), RiskColor::Red);
    assert_eq!(RiskColor::classify(Some("Medium")), RiskColor::Yellow);
    assert_eq!(RiskColor::classify(Some(" low ")), RiskColor::Green);
}

#[test]
fn unknown_or_missing_levels_are_gray() {
    assert_eq!(RiskColor::classify(None), RiskColor::Gray);
    assert_eq!(RiskColor::classify(Some("")), RiskColor::Gray);
    assert_eq!(RiskColor::classify(Some("critical")), RiskColor::Gray);
    assert_eq!(RiskColor::classify(Some("höch")), RiskColor::Gray);
}

#[test]
fn legacy_shape_is_normalized() {
    let response: RiskResponse = serde_json::from_str(
        r#"{
            "risk_score": 7,
            "summary": "Liability is uncapped.",
            "concerns": [
                {"title": "Unlimited liability", "level": "HIGH", "description": "No cap on damages"},
                {"title": "Notice period", "level": "low", "description": "Short but acceptable"}
            ]
        }"#,
    )
    .expect("decode");

    let risk = normalize_risk(response).expect("risk");
    assert_eq!(risk.score, Some(7.0));
    assert_eq!(risk.summary, "Liability is uncapped.");
    assert_eq!(risk.concerns.len(), 2);
    assert_eq!(risk.concerns[0].color(), RiskColor::Red);
    assert_eq!(risk.concerns[1].color(), RiskColor::Green);
}

#[test]
fn detailed_shape_merges_clauses_and_key_concerns() {
    let response: RiskResponse = serde_json::from_str(
        r#"{
            "overall_risk_score": 4,
            "risk_summary": "Moderate exposure.",
            "clauses": [
                {"clause": "Termination", "risk_level": "Medium", "details": "Either party, 5 days"}
            ],
            "key_concerns": ["Missing governing law", "  "]
        }"#,
    )
    .expect("decode");

    let risk = normalize_risk(response).expect("risk");
    assert_eq!(risk.score, Some(4.0));
    assert_eq!(risk.summary, "Moderate exposure.");
    assert_eq!(risk.concerns.len(), 2);
    assert_eq!(risk.concerns[0].title, "Termination");
    assert_eq!(risk.concerns[0].color(), RiskColor::Yellow);
    assert_eq!(risk.concerns[1].title, "Missing governing law");
    assert_eq!(risk.concerns[1].level, None);
    assert_eq!(risk.concerns[1].color(), RiskColor::Gray);
}

#[test]
fn clauses_survive_a_null_overall_score() {
    let response: RiskResponse = serde_json::from_str(
        r#"{
            "overall_risk_score": null,
            "risk_summary": "Scoring unavailable.",
            "clauses": [
                {"clause": "Indemnity", "risk_level": "HIGH", "details": "Uncapped indemnity"}
            ],
            "key_concerns": ["k"]
        }"#,
    )
    .expect("decode");

    let risk = normalize_risk(response).expect("risk");
    assert_eq!(risk.score, None);
    assert_eq!(risk.summary, "Scoring unavailable.");
    assert_eq!(risk.concerns.len(), 2);
    assert_eq!(risk.concerns[0].title, "Indemnity");
    assert_eq!(risk.concerns[0].color(), RiskColor::Red);
    assert_eq!(risk.concerns[0].description, "Uncapped indemnity");
    assert_eq!(risk.concerns[1].title, "k");
}

#[test]
fn non_numeric_score_is_absent() {
    let response: RiskResponse =
        serde_json::from_str(r#"{"risk_score": "N/A", "summary": "", "concerns": []}"#)
            .expect("decode");
    let risk = normalize_risk(response).expect("risk");
    assert_eq!(risk.score, None);
    assert!(risk.concerns.is_empty());
}

#[test]
fn textual_score_out_of_ten_is_parsed() {
    let response: RiskResponse =
        serde_json::from_str(r#"{"overall_risk_score": "6/10"}"#).expect("decode");
    assert_eq!(normalize_risk(response).expect("risk").score, Some(6.0));
}

#[test]
fn mixed_field_names_still_fill_the_summary() {
    let response: RiskResponse =
        serde_json::from_str(r#"{"risk_score": 2, "risk_summary": "Low exposure"}"#)
            .expect("decode");
    assert_eq!(normalize_risk(response).expect("risk").summary, "Low exposure");
}

#[test]
fn service_failure_payload_is_an_error() {
    let response: RiskResponse = serde_json::from_str(
        r#"{"error": "Failed to analyze risks: timeout", "overall_risk_score": 0, "risk_summary": "Analysis failed", "clauses": [], "key_concerns": ["Analysis could not be completed"]}"#,
    )
    .expect("decode");
    assert!(matches!(normalize_risk(response), Err(ClientError::Backend(_))));
}
