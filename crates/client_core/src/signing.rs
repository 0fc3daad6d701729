use shared::{
    domain::{SignaturePosition, Signer},
    protocol::PositionsPayload,
};

use crate::error::{ClientError, ClientResult, ValidationError};

pub const POSITIONS_ENDPOINT: &str = "/api/analyze-signature-positions";

/// Checks the send preconditions in order: contract text, at least one
/// signer, then every signer complete. Positions in errors are 1-based.
pub fn validate_send(contract: &str, signers: &[Signer]) -> Result<(), ValidationError> {
    if contract.trim().is_empty() {
        return Err(ValidationError::EmptyContract);
    }
    validate_signers(signers)
}

pub fn validate_signers(signers: &[Signer]) -> Result<(), ValidationError> {
    if signers.is_empty() {
        return Err(ValidationError::NoSigners);
    }
    match signers.iter().position(|signer| !signer.is_complete()) {
        Some(index) => Err(ValidationError::IncompleteSigner {
            position: index + 1,
        }),
        None => Ok(()),
    }
}

/// Trims both fields so the backend never sees padded addresses.
pub fn normalize_signers(signers: &[Signer]) -> Vec<Signer> {
    signers
        .iter()
        .map(|signer| Signer::new(signer.name.trim(), signer.email.trim()))
        .collect()
}

/// Positions arrive either as an array or as that array JSON-encoded inside a
/// string. A missing payload decodes to no positions.
pub fn decode_positions(payload: Option<PositionsPayload>) -> ClientResult<Vec<SignaturePosition>> {
    match payload {
        None => Ok(Vec::new()),
        Some(PositionsPayload::Decoded(positions)) => Ok(positions),
        Some(PositionsPayload::Encoded(raw)) => {
            if raw.trim().is_empty() {
                return Ok(Vec::new());
            }
            serde_json::from_str(&raw)
                .map_err(|err| ClientError::malformed(POSITIONS_ENDPOINT, err.to_string()))
        }
    }
}

#[cfg(test)]
#[path = "tests/signing_tests.rs"]
mod tests;
