//! In-memory [`ContractApi`] for controller and session tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use shared::{
    domain::{
        CollaboratorRole, CommentId, ContractId, InvitationId, SignaturePosition, Template,
        TemplateId, UserId, UserSettings,
    },
    protocol::{
        Comment, CommentRequest, Invitation, InvitationRequest, SendRequest, UserRef,
        VersionComparison, VersionSnapshot, VersionSummary,
    },
};
use tokio::sync::Notify;

use crate::{
    analysis::Analysis,
    error::{ClientError, ClientResult},
    risk::{RiskAssessment, RiskConcern},
    upload::UploadedFile,
    ContractApi, SendReceipt,
};

/// Holds the next matching call until released.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl Gate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashMap<&'static str, String>>,
    gates: Mutex<HashMap<&'static str, Arc<Gate>>>,
    pub sent: Mutex<Vec<(SendRequest, Option<String>)>>,
    pub saved_settings: Mutex<Vec<UserSettings>>,
    pub positions: Mutex<Vec<SignaturePosition>>,
    pub comments: Mutex<Vec<Comment>>,
    pub invitations: Mutex<Vec<Invitation>>,
    pub versions: Mutex<Vec<VersionSummary>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every later call to `op` fail with a backend error.
    pub fn fail(&self, op: &'static str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(op, message.to_string());
    }

    pub fn recover(&self, op: &'static str) {
        self.failures.lock().unwrap().remove(op);
    }

    /// Blocks the next call to `op` on the returned gate.
    pub fn gate(&self, op: &'static str) -> Arc<Gate> {
        let gate = Gate::new();
        self.gates.lock().unwrap().insert(op, gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.split(':').next() == Some(op))
            .count()
    }

    async fn enter(&self, op: &'static str, detail: &str) -> ClientResult<()> {
        self.calls.lock().unwrap().push(format!("{op}:{detail}"));
        let gate = self.gates.lock().unwrap().remove(op);
        if let Some(gate) = gate {
            gate.pass().await;
        }
        match self.failures.lock().unwrap().get(op) {
            Some(message) => Err(ClientError::Backend(message.clone())),
            None => Ok(()),
        }
    }
}

pub fn user(id: i64, name: &str) -> UserRef {
    UserRef {
        id: UserId(id),
        name: name.to_string(),
    }
}

pub fn comment(id: i64, content: &str, resolved: bool) -> Comment {
    Comment {
        id: CommentId(id),
        content: content.to_string(),
        user: user(1, "Ada"),
        created_at: None,
        resolved,
        parent_id: None,
    }
}

#[async_trait]
impl ContractApi for FakeApi {
    async fn analyze(&self, content: &str) -> ClientResult<Analysis> {
        self.enter("analyze", content).await?;
        Ok(Analysis::from_text(&format!("SUMMARY:\n{content}")))
    }

    async fn analyze_risks(&self, content: &str) -> ClientResult<RiskAssessment> {
        self.enter("risks", content).await?;
        Ok(RiskAssessment {
            score: Some(5.0),
            summary: format!("risk of {content}"),
            concerns: vec![RiskConcern {
                title: "Liability".into(),
                level: Some("high".into()),
                description: String::new(),
            }],
        })
    }

    async fn rewrite(&self, content: &str, instructions: &str) -> ClientResult<String> {
        self.enter("rewrite", instructions).await?;
        Ok(format!("{content}\n[{instructions}]"))
    }

    async fn upload(&self, file: &UploadedFile) -> ClientResult<String> {
        self.enter("upload", &file.filename).await?;
        Ok(format!("extracted from {}", file.filename))
    }

    async fn suggest_signature_positions(&self, content: &str) -> ClientResult<Vec<SignaturePosition>> {
        self.enter("positions", content).await?;
        Ok(self.positions.lock().unwrap().clone())
    }

    async fn send_for_signature(
        &self,
        request: &SendRequest,
        access_token: Option<&str>,
    ) -> ClientResult<SendReceipt> {
        self.enter("send", &request.contract).await?;
        self.sent
            .lock()
            .unwrap()
            .push((request.clone(), access_token.map(str::to_string)));
        Ok(SendReceipt {
            message: Some(format!(
                "Contract sent successfully to {} signers",
                request.signers.len()
            )),
            envelope_id: Some("env-1".into()),
        })
    }

    async fn save_settings(&self, settings: &UserSettings) -> ClientResult<()> {
        self.enter("settings", "").await?;
        self.saved_settings.lock().unwrap().push(settings.clone());
        Ok(())
    }

    async fn list_templates(&self) -> ClientResult<Vec<Template>> {
        self.enter("templates", "").await?;
        Ok(vec![Template {
            id: TemplateId("nda".into()),
            name: "Non-Disclosure Agreement (NDA)".into(),
            description: String::new(),
            icon: String::new(),
            content: String::new(),
        }])
    }

    async fn list_invitations(&self, contract: ContractId) -> ClientResult<Vec<Invitation>> {
        self.enter("list_invitations", &contract.to_string()).await?;
        Ok(self.invitations.lock().unwrap().clone())
    }

    async fn create_invitation(
        &self,
        contract: ContractId,
        request: &InvitationRequest,
    ) -> ClientResult<Invitation> {
        self.enter("create_invitation", &contract.to_string()).await?;
        let mut invitations = self.invitations.lock().unwrap();
        let invitation = Invitation {
            id: InvitationId(invitations.len() as i64 + 1),
            email: request.email.clone(),
            role: request.role,
            status: "pending".into(),
            message: None,
            created_at: None,
            expires_at: None,
        };
        invitations.insert(0, invitation.clone());
        Ok(invitation)
    }

    async fn list_comments(
        &self,
        contract: ContractId,
        include_resolved: bool,
    ) -> ClientResult<Vec<Comment>> {
        self.enter("list_comments", &format!("{contract}?{include_resolved}"))
            .await?;
        Ok(self
            .comments
            .lock()
            .unwrap()
            .iter()
            .filter(|comment| include_resolved || !comment.resolved)
            .cloned()
            .collect())
    }

    async fn add_comment(&self, contract: ContractId, request: &CommentRequest) -> ClientResult<Comment> {
        self.enter("add_comment", &contract.to_string()).await?;
        let mut comments = self.comments.lock().unwrap();
        let created = comment(comments.len() as i64 + 1, &request.content, false);
        comments.push(created.clone());
        Ok(created)
    }

    async fn resolve_comment(&self, contract: ContractId, id: CommentId) -> ClientResult<()> {
        self.enter("resolve_comment", &format!("{contract}/{id}")).await?;
        if let Some(found) = self
            .comments
            .lock()
            .unwrap()
            .iter_mut()
            .find(|comment| comment.id == id)
        {
            found.resolved = true;
        }
        Ok(())
    }

    async fn list_versions(&self, contract: ContractId) -> ClientResult<Vec<VersionSummary>> {
        self.enter("list_versions", &contract.to_string()).await?;
        Ok(self.versions.lock().unwrap().clone())
    }

    async fn compare_versions(
        &self,
        contract: ContractId,
        first: u32,
        second: u32,
    ) -> ClientResult<VersionComparison> {
        self.enter("compare_versions", &format!("{contract}:{first}-{second}"))
            .await?;
        let snapshot = |number: u32| VersionSnapshot {
            number,
            content: format!("version {number}"),
            created_at: None,
            created_by: Some(UserId(1)),
        };
        Ok(VersionComparison {
            version1: snapshot(first),
            version2: snapshot(second),
        })
    }
}

pub fn viewer_invitation(id: i64, email: &str) -> Invitation {
    Invitation {
        id: InvitationId(id),
        email: email.to_string(),
        role: CollaboratorRole::Viewer,
        status: "pending".into(),
        message: None,
        created_at: None,
        expires_at: None,
    }
}
