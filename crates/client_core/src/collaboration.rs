//! Per-contract collaboration: invitations, review comments and version
//! comparison.

use std::sync::Arc;

use shared::{
    domain::{CollaboratorRole, CommentId, ContractId},
    protocol::{
        Comment, CommentRequest, Invitation, InvitationRequest, VersionComparison, VersionSummary,
    },
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    error::{ClientError, ClientResult, ValidationError},
    ContractApi,
};

const MAX_SELECTED_VERSIONS: usize = 2;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollaborationSnapshot {
    pub contract: Option<ContractId>,
    pub invitations: Vec<Invitation>,
    pub comments: Vec<Comment>,
    pub show_resolved: bool,
    pub versions: Vec<VersionSummary>,
    /// Selection order is kept; the oldest pick is dropped first.
    pub selected_versions: Vec<u32>,
    pub comparison: Option<VersionComparison>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Default)]
struct CollaborationState {
    invitations: Vec<Invitation>,
    comments: Vec<Comment>,
    show_resolved: bool,
    versions: Vec<VersionSummary>,
    selected_versions: Vec<u32>,
    comparison: Option<VersionComparison>,
    in_flight: usize,
    error: Option<String>,
}

pub struct CollaborationSession {
    api: Arc<dyn ContractApi>,
    contract: ContractId,
    inner: Mutex<CollaborationState>,
}

fn valid_email(email: &str) -> bool {
    !email.is_empty() && email.contains('@')
}

impl CollaborationSession {
    pub fn new(api: Arc<dyn ContractApi>, contract: ContractId) -> Self {
        Self {
            api,
            contract,
            inner: Mutex::new(CollaborationState::default()),
        }
    }

    pub fn contract(&self) -> ContractId {
        self.contract
    }

    pub async fn snapshot(&self) -> CollaborationSnapshot {
        let state = self.inner.lock().await;
        CollaborationSnapshot {
            contract: Some(self.contract),
            invitations: state.invitations.clone(),
            comments: state.comments.clone(),
            show_resolved: state.show_resolved,
            versions: state.versions.clone(),
            selected_versions: state.selected_versions.clone(),
            comparison: state.comparison.clone(),
            loading: state.in_flight > 0,
            error: state.error.clone(),
        }
    }

    async fn reject(&self, error: ValidationError) -> ClientError {
        self.inner.lock().await.error = Some(error.to_string());
        ClientError::Validation(error)
    }

    async fn begin(&self) {
        let mut state = self.inner.lock().await;
        state.in_flight += 1;
        state.error = None;
    }

    /// Ends a request, applying its result or recording the failure.
    async fn complete<T, R>(
        &self,
        failure: &'static str,
        result: ClientResult<T>,
        apply: impl FnOnce(&mut CollaborationState, T) -> R,
    ) -> ClientResult<R> {
        let mut state = self.inner.lock().await;
        state.in_flight = state.in_flight.saturating_sub(1);
        match result {
            Ok(value) => Ok(apply(&mut *state, value)),
            Err(err) => {
                warn!(contract = %self.contract, error = %err, "collaboration: {failure}");
                state.error = Some(format!("{failure}: {err}"));
                Err(err)
            }
        }
    }

    /// Invites a collaborator. The new invitation is listed first.
    pub async fn invite(&self, email: &str, role: CollaboratorRole) -> ClientResult<Invitation> {
        let email = email.trim();
        if !valid_email(email) {
            return Err(self.reject(ValidationError::InvalidEmail).await);
        }
        self.begin().await;
        let request = InvitationRequest {
            email: email.to_string(),
            role,
        };
        let result = self.api.create_invitation(self.contract, &request).await;
        let invitation = self
            .complete("Failed to send invitation", result, |state, invitation: Invitation| {
                state.invitations.insert(0, invitation.clone());
                invitation
            })
            .await?;
        info!(contract = %self.contract, role = %invitation.role, "collaboration: invitation sent");
        Ok(invitation)
    }

    pub async fn refresh_invitations(&self) -> ClientResult<Vec<Invitation>> {
        self.begin().await;
        let result = self.api.list_invitations(self.contract).await;
        self.complete("Failed to load invitations", result, |state, invitations: Vec<Invitation>| {
            state.invitations = invitations.clone();
            invitations
        })
        .await
    }

    /// Changes the resolved-comment filter and reloads the list.
    pub async fn set_show_resolved(&self, show_resolved: bool) -> ClientResult<Vec<Comment>> {
        self.inner.lock().await.show_resolved = show_resolved;
        self.refresh_comments().await
    }

    pub async fn refresh_comments(&self) -> ClientResult<Vec<Comment>> {
        let include_resolved = self.inner.lock().await.show_resolved;
        self.begin().await;
        let result = self.api.list_comments(self.contract, include_resolved).await;
        self.complete("Failed to load comments", result, |state, comments: Vec<Comment>| {
            state.comments = comments.clone();
            comments
        })
        .await
    }

    pub async fn add_comment(&self, content: &str) -> ClientResult<Comment> {
        if content.trim().is_empty() {
            return Err(self.reject(ValidationError::EmptyComment).await);
        }
        self.begin().await;
        let request = CommentRequest {
            content: content.to_string(),
            parent_id: None,
        };
        let result = self.api.add_comment(self.contract, &request).await;
        self.complete("Failed to add comment", result, |state, comment: Comment| {
            state.comments.push(comment.clone());
            comment
        })
        .await
    }

    pub async fn resolve_comment(&self, comment: CommentId) -> ClientResult<()> {
        self.begin().await;
        let result = self.api.resolve_comment(self.contract, comment).await;
        self.complete("Failed to resolve comment", result, |state, ()| {
            if let Some(found) = state.comments.iter_mut().find(|c| c.id == comment) {
                found.resolved = true;
            }
        })
        .await
    }

    pub async fn refresh_versions(&self) -> ClientResult<Vec<VersionSummary>> {
        self.begin().await;
        let result = self.api.list_versions(self.contract).await;
        self.complete("Failed to load versions", result, |state, versions: Vec<VersionSummary>| {
            state.versions = versions.clone();
            versions
        })
        .await
    }

    /// Selects or deselects a version for comparison, returning the current
    /// selection.
    pub async fn toggle_version(&self, version: u32) -> Vec<u32> {
        let mut state = self.inner.lock().await;
        if let Some(index) = state.selected_versions.iter().position(|v| *v == version) {
            state.selected_versions.remove(index);
        } else {
            state.selected_versions.push(version);
            if state.selected_versions.len() > MAX_SELECTED_VERSIONS {
                state.selected_versions.remove(0);
            }
        }
        state.selected_versions.clone()
    }

    /// Compares the two selected versions, lower number first.
    pub async fn compare_selected(&self) -> ClientResult<VersionComparison> {
        let selected = self.inner.lock().await.selected_versions.clone();
        let &[a, b] = selected.as_slice() else {
            return Err(self.reject(ValidationError::VersionSelection).await);
        };
        let (first, second) = (a.min(b), a.max(b));
        self.begin().await;
        let result = self.api.compare_versions(self.contract, first, second).await;
        self.complete("Could not compare versions", result, |state, comparison: VersionComparison| {
            state.comparison = Some(comparison.clone());
            comparison
        })
        .await
    }
}

#[cfg(test)]
#[path = "tests/collaboration_tests.rs"]
mod tests;
