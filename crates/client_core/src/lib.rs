use async_trait::async_trait;
use shared::{
    domain::{CommentId, ContractId, SignaturePosition, Template, UserSettings},
    protocol::{
        Comment, CommentRequest, Invitation, InvitationRequest, SendRequest, VersionComparison,
        VersionSummary,
    },
};

pub mod analysis;
pub mod collaboration;
pub mod config;
pub mod error;
pub mod render;
pub mod risk;
pub mod signing;
pub mod templates;
pub mod transport;
pub mod upload;
pub mod workflow;

pub use analysis::Analysis;
pub use collaboration::{CollaborationSession, CollaborationSnapshot};
pub use config::{load_config, ClientConfig};
pub use error::{ClientError, ClientResult, ValidationError};
pub use risk::{RiskAssessment, RiskColor};
pub use transport::HttpContractApi;
pub use upload::UploadedFile;
pub use workflow::{
    Action, ContractSource, WorkflowController, WorkflowEvent, WorkflowOptions, WorkflowSnapshot,
    WorkflowStep,
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendReceipt {
    pub message: Option<String>,
    pub envelope_id: Option<String>,
}

/// Backend operations the workflow depends on. Responses are already
/// normalised into canonical client types.
#[async_trait]
pub trait ContractApi: Send + Sync {
    async fn analyze(&self, content: &str) -> ClientResult<Analysis>;
    async fn analyze_risks(&self, content: &str) -> ClientResult<RiskAssessment>;
    async fn rewrite(&self, content: &str, instructions: &str) -> ClientResult<String>;
    /// Server-side text extraction for binary documents.
    async fn upload(&self, file: &UploadedFile) -> ClientResult<String>;
    async fn suggest_signature_positions(&self, content: &str) -> ClientResult<Vec<SignaturePosition>>;
    async fn send_for_signature(
        &self,
        request: &SendRequest,
        access_token: Option<&str>,
    ) -> ClientResult<SendReceipt>;
    async fn save_settings(&self, settings: &UserSettings) -> ClientResult<()>;
    async fn list_templates(&self) -> ClientResult<Vec<Template>>;

    async fn list_invitations(&self, contract: ContractId) -> ClientResult<Vec<Invitation>>;
    async fn create_invitation(
        &self,
        contract: ContractId,
        request: &InvitationRequest,
    ) -> ClientResult<Invitation>;
    async fn list_comments(
        &self,
        contract: ContractId,
        include_resolved: bool,
    ) -> ClientResult<Vec<Comment>>;
    async fn add_comment(&self, contract: ContractId, request: &CommentRequest) -> ClientResult<Comment>;
    async fn resolve_comment(&self, contract: ContractId, comment: CommentId) -> ClientResult<()>;
    async fn list_versions(&self, contract: ContractId) -> ClientResult<Vec<VersionSummary>>;
    async fn compare_versions(
        &self,
        contract: ContractId,
        first: u32,
        second: u32,
    ) -> ClientResult<VersionComparison>;
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
