use super::*;

use shared::protocol::SignaturePositionsResponse;

#[test]
fn send_preconditions_are_checked_in_order() {
    assert_eq!(
        validate_send("  ", &[Signer::new("", "")]),
        Err(ValidationError::EmptyContract)
    );
    assert_eq!(validate_send("NDA", &[]), Err(ValidationError::NoSigners));
    assert_eq!(
        validate_send(
            "NDA",
            &[
                Signer::new("Ada", "ada@example.com"),
                Signer::new("Bob", "   "),
            ]
        ),
        Err(ValidationError::IncompleteSigner { position: 2 })
    );
    assert_eq!(
        validate_send("NDA", &[Signer::new("Ada", "ada@example.com")]),
        Ok(())
    );
}

#[test]
fn signers_are_trimmed_for_the_wire() {
    let signers = normalize_signers(&[Signer::new(" Ada ", " ada@example.com\n")]);
    assert_eq!(signers, vec![Signer::new("Ada", "ada@example.com")]);
}

#[test]
fn positions_decode_from_either_form() {
    let encoded: SignaturePositionsResponse = serde_json::from_str(
        r#"{"success": true, "positions": "[{\"description\": \"Party A\", \"anchor_text\": \"By:\", \"align\": \"left\"}]"}"#,
    )
    .expect("decode");
    let decoded: SignaturePositionsResponse = serde_json::from_str(
        r#"{"success": true, "positions": [{"description": "Party A", "anchor_text": "By:", "align": "left"}]}"#,
    )
    .expect("decode");

    let from_string = decode_positions(encoded.positions).expect("string form");
    let from_array = decode_positions(decoded.positions).expect("array form");
    assert_eq!(from_string, from_array);
    assert_eq!(from_array[0].anchor_text, "By:");
}

#[test]
fn absent_positions_are_empty() {
    assert!(decode_positions(None).expect("none").is_empty());
    assert!(decode_positions(Some(PositionsPayload::Encoded(" ".into())))
        .expect("blank")
        .is_empty());
}

#[test]
fn garbage_position_string_is_malformed() {
    let result = decode_positions(Some(PositionsPayload::Encoded("not json".into())));
    assert!(matches!(
        result,
        Err(ClientError::MalformedResponse { endpoint: POSITIONS_ENDPOINT, .. })
    ));
}
