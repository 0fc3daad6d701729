//! reqwest-backed [`ContractApi`] talking to the ContractIQ backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{CommentId, ContractId, SignaturePosition, Template, UserSettings},
    error::{ErrorBody, ErrorCode},
    protocol::{
        AnalyzeResponse, Comment, CommentRequest, ContentRequest, Invitation, InvitationRequest,
        RewriteRequest, RewriteResponse, RiskResponse, SaveSettingsRequest, SaveSettingsResponse,
        SendRequest, SendResponse, SignaturePositionsRequest, SignaturePositionsResponse,
        UploadResponse, VersionComparison, VersionSummary,
    },
};
use tracing::{debug, info, warn};

use crate::{
    analysis::{normalize_analysis, Analysis},
    config::ClientConfig,
    error::{ClientError, ClientResult},
    risk::{normalize_risk, RiskAssessment},
    signing::{decode_positions, POSITIONS_ENDPOINT},
    upload::UploadedFile,
    ContractApi, SendReceipt,
};

const ANALYZE: &str = "/api/analyze";
const RISKS: &str = "/api/analyze/risks";
const REWRITE: &str = "/api/rewrite";
const UPLOAD: &str = "/api/upload";
const SEND: &str = "/api/send";
const SETTINGS: &str = "/api/settings/save";
const TEMPLATES: &str = "/api/templates";
const CONTRACTS: &str = "/api/contracts";

#[derive(Debug, Clone)]
pub struct HttpContractApi {
    http: Client,
    base_url: String,
}

impl HttpContractApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ClientResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Self::new(config.server_url()?, config.request_timeout())
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins by concatenation so a deployment prefix such as `/docusign`
    /// survives.
    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn contract_endpoint(&self, contract: ContractId, tail: &str) -> String {
        self.endpoint(&format!("{CONTRACTS}/{contract}{tail}"))
    }
}

/// Maps non-2xx replies to [`ClientError::Status`] with the backend's own
/// reason when it sent one.
async fn check_status(endpoint: &'static str, response: Response) -> ClientResult<Vec<u8>> {
    let status = response.status();
    let body = response.bytes().await?;
    if status.is_success() {
        return Ok(body.to_vec());
    }

    let message = serde_json::from_slice::<ErrorBody>(&body)
        .ok()
        .and_then(|parsed| parsed.reason().map(str::to_string))
        .or_else(|| {
            let text = String::from_utf8_lossy(&body).trim().to_string();
            (!text.is_empty() && text.len() <= 200).then_some(text)
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    warn!(endpoint, status = status.as_u16(), %message, "backend request failed");
    Err(ClientError::Status {
        code: ErrorCode::from_status(status.as_u16()),
        status: status.as_u16(),
        message,
    })
}

async fn read_json<T: DeserializeOwned>(endpoint: &'static str, response: Response) -> ClientResult<T> {
    let body = check_status(endpoint, response).await?;
    serde_json::from_slice(&body).map_err(|err| {
        warn!(endpoint, error = %err, "backend response did not match the expected shape");
        ClientError::malformed(endpoint, err.to_string())
    })
}

fn backend_error(error: Option<String>) -> Option<ClientError> {
    error
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .map(ClientError::Backend)
}

#[async_trait]
impl ContractApi for HttpContractApi {
    async fn analyze(&self, content: &str) -> ClientResult<Analysis> {
        debug!(chars = content.len(), "requesting contract analysis");
        let response = self
            .http
            .post(self.endpoint(ANALYZE))
            .json(&ContentRequest {
                content: content.to_string(),
            })
            .send()
            .await?;
        let parsed: AnalyzeResponse = read_json(ANALYZE, response).await?;
        normalize_analysis(parsed)
    }

    async fn analyze_risks(&self, content: &str) -> ClientResult<RiskAssessment> {
        debug!(chars = content.len(), "requesting risk analysis");
        let response = self
            .http
            .post(self.endpoint(RISKS))
            .json(&ContentRequest {
                content: content.to_string(),
            })
            .send()
            .await?;
        let parsed: RiskResponse = read_json(RISKS, response).await?;
        normalize_risk(parsed)
    }

    async fn rewrite(&self, content: &str, instructions: &str) -> ClientResult<String> {
        let response = self
            .http
            .post(self.endpoint(REWRITE))
            .json(&RewriteRequest {
                content: content.to_string(),
                instructions: instructions.to_string(),
            })
            .send()
            .await?;
        let parsed: RewriteResponse = read_json(REWRITE, response).await?;
        if let Some(err) = backend_error(parsed.error) {
            return Err(err);
        }
        match parsed.rewritten {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ClientError::malformed(REWRITE, "missing rewritten contract")),
        }
    }

    async fn upload(&self, file: &UploadedFile) -> ClientResult<String> {
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.filename.clone())
            .mime_str(&file.mime_type())?;
        let form = multipart::Form::new().part("file", part);
        info!(filename = %file.filename, bytes = file.bytes.len(), "uploading contract document");
        let response = self
            .http
            .post(self.endpoint(UPLOAD))
            .multipart(form)
            .send()
            .await?;
        let parsed: UploadResponse = read_json(UPLOAD, response).await?;
        if let Some(err) = backend_error(parsed.error) {
            return Err(err);
        }
        match parsed.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ClientError::malformed(UPLOAD, "no text extracted from document")),
        }
    }

    async fn suggest_signature_positions(&self, content: &str) -> ClientResult<Vec<SignaturePosition>> {
        let response = self
            .http
            .post(self.endpoint(POSITIONS_ENDPOINT))
            .json(&SignaturePositionsRequest::new(content))
            .send()
            .await?;
        let parsed: SignaturePositionsResponse = read_json(POSITIONS_ENDPOINT, response).await?;
        if let Some(err) = backend_error(parsed.error) {
            return Err(err);
        }
        if parsed.success == Some(false) {
            return Err(ClientError::Backend(
                "Signature position analysis failed".to_string(),
            ));
        }
        decode_positions(parsed.positions)
    }

    async fn send_for_signature(
        &self,
        request: &SendRequest,
        access_token: Option<&str>,
    ) -> ClientResult<SendReceipt> {
        info!(signers = request.signers.len(), "sending contract for signature");
        let mut builder = self.http.post(self.endpoint(SEND)).json(request);
        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }
        let parsed: SendResponse = read_json(SEND, builder.send().await?).await?;
        if let Some(err) = backend_error(parsed.error) {
            return Err(err);
        }
        if parsed.success == Some(false) {
            return Err(ClientError::Backend(
                parsed
                    .message
                    .unwrap_or_else(|| "Failed to send contract".to_string()),
            ));
        }
        Ok(SendReceipt {
            message: parsed.message,
            envelope_id: parsed.envelope_id,
        })
    }

    async fn save_settings(&self, settings: &UserSettings) -> ClientResult<()> {
        let response = self
            .http
            .post(self.endpoint(SETTINGS))
            .json(&SaveSettingsRequest {
                openai_key: settings.openai_key.clone().unwrap_or_default(),
                docusign_key: settings.docusign_key.clone().unwrap_or_default(),
            })
            .send()
            .await?;
        let parsed: SaveSettingsResponse = read_json(SETTINGS, response).await?;
        if parsed.status.eq_ignore_ascii_case("success") {
            Ok(())
        } else {
            Err(ClientError::Backend(
                parsed
                    .message
                    .unwrap_or_else(|| "Failed to save settings".to_string()),
            ))
        }
    }

    async fn list_templates(&self) -> ClientResult<Vec<Template>> {
        let response = self.http.get(self.endpoint(TEMPLATES)).send().await?;
        read_json(TEMPLATES, response).await
    }

    async fn list_invitations(&self, contract: ContractId) -> ClientResult<Vec<Invitation>> {
        let response = self
            .http
            .get(self.contract_endpoint(contract, "/invitations"))
            .send()
            .await?;
        read_json("invitations", response).await
    }

    async fn create_invitation(
        &self,
        contract: ContractId,
        request: &InvitationRequest,
    ) -> ClientResult<Invitation> {
        let response = self
            .http
            .post(self.contract_endpoint(contract, "/invitations"))
            .json(request)
            .send()
            .await?;
        read_json("invitations", response).await
    }

    async fn list_comments(
        &self,
        contract: ContractId,
        include_resolved: bool,
    ) -> ClientResult<Vec<Comment>> {
        let response = self
            .http
            .get(self.contract_endpoint(contract, "/comments"))
            .query(&[("include_resolved", include_resolved.to_string())])
            .send()
            .await?;
        read_json("comments", response).await
    }

    async fn add_comment(&self, contract: ContractId, request: &CommentRequest) -> ClientResult<Comment> {
        let response = self
            .http
            .post(self.contract_endpoint(contract, "/comments"))
            .json(request)
            .send()
            .await?;
        read_json("comments", response).await
    }

    async fn resolve_comment(&self, contract: ContractId, comment: CommentId) -> ClientResult<()> {
        let response = self
            .http
            .post(self.contract_endpoint(contract, &format!("/comments/{comment}/resolve")))
            .send()
            .await?;
        check_status("comments", response).await.map(|_| ())
    }

    async fn list_versions(&self, contract: ContractId) -> ClientResult<Vec<VersionSummary>> {
        let response = self
            .http
            .get(self.contract_endpoint(contract, "/versions"))
            .send()
            .await?;
        read_json("versions", response).await
    }

    async fn compare_versions(
        &self,
        contract: ContractId,
        first: u32,
        second: u32,
    ) -> ClientResult<VersionComparison> {
        let response = self
            .http
            .get(self.contract_endpoint(contract, "/versions/compare"))
            .query(&[("v1", first), ("v2", second)])
            .send()
            .await?;
        read_json("versions", response).await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
