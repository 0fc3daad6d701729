use super::*;

use crate::test_support::{comment, user, viewer_invitation, FakeApi};

fn session(api: &Arc<FakeApi>) -> CollaborationSession {
    CollaborationSession::new(api.clone(), ContractId(42))
}

fn version(number: u32) -> VersionSummary {
    VersionSummary {
        version: number,
        created_at: None,
        created_by: user(1, "Ada"),
    }
}

#[tokio::test]
async fn invite_rejects_addresses_without_at_sign() {
    let api = FakeApi::new();
    let session = session(&api);

    for email in ["", "   ", "ada.example.com"] {
        let err = session
            .invite(email, CollaboratorRole::Editor)
            .await
            .expect_err("invalid email");
        assert!(matches!(err, ClientError::Validation(ValidationError::InvalidEmail)));
    }
    assert_eq!(api.count("create_invitation"), 0);
    assert_eq!(
        session.snapshot().await.error.as_deref(),
        Some("A valid email address is required")
    );
}

#[tokio::test]
async fn new_invitations_are_listed_first() {
    let api = FakeApi::new();
    api.invitations
        .lock()
        .unwrap()
        .push(viewer_invitation(7, "old@example.com"));
    let session = session(&api);
    session.refresh_invitations().await.expect("list");

    let invitation = session
        .invite(" bob@example.com ", CollaboratorRole::Admin)
        .await
        .expect("invite");

    assert_eq!(invitation.email, "bob@example.com");
    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.invitations.len(), 2);
    assert_eq!(snapshot.invitations[0].email, "bob@example.com");
    assert_eq!(snapshot.invitations[0].role, CollaboratorRole::Admin);
    assert!(snapshot.error.is_none());
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn resolved_comments_follow_the_toggle() {
    let api = FakeApi::new();
    api.comments.lock().unwrap().extend([
        comment(1, "Check clause 3", false),
        comment(2, "Typo fixed", true),
    ]);
    let session = session(&api);

    assert_eq!(session.refresh_comments().await.expect("open").len(), 1);
    assert_eq!(session.set_show_resolved(true).await.expect("all").len(), 2);
    assert!(api.calls().contains(&"list_comments:42?true".to_string()));
    assert!(session.snapshot().await.show_resolved);
}

#[tokio::test]
async fn comments_are_added_and_resolved() {
    let api = FakeApi::new();
    let session = session(&api);

    assert!(matches!(
        session.add_comment("  ").await,
        Err(ClientError::Validation(ValidationError::EmptyComment))
    ));

    let added = session.add_comment("Please review the term").await.expect("add");
    session.resolve_comment(added.id).await.expect("resolve");

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.comments.len(), 1);
    assert!(snapshot.comments[0].resolved);
}

#[tokio::test]
async fn failures_are_recorded_with_context() {
    let api = FakeApi::new();
    api.fail("list_comments", "database unavailable");
    let session = session(&api);

    session.refresh_comments().await.expect_err("fails");

    let snapshot = session.snapshot().await;
    assert_eq!(
        snapshot.error.as_deref(),
        Some("Failed to load comments: database unavailable")
    );
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn version_selection_keeps_the_two_latest_picks() {
    let api = FakeApi::new();
    let session = session(&api);

    assert_eq!(session.toggle_version(3).await, vec![3]);
    assert_eq!(session.toggle_version(1).await, vec![3, 1]);
    assert_eq!(session.toggle_version(2).await, vec![1, 2]);
    assert_eq!(session.toggle_version(1).await, vec![2]);
}

#[tokio::test]
async fn comparison_needs_exactly_two_versions_lower_first() {
    let api = FakeApi::new();
    api.versions.lock().unwrap().extend([version(1), version(2), version(3)]);
    let session = session(&api);
    assert_eq!(session.refresh_versions().await.expect("versions").len(), 3);

    session.toggle_version(3).await;
    assert!(matches!(
        session.compare_selected().await,
        Err(ClientError::Validation(ValidationError::VersionSelection))
    ));
    assert_eq!(api.count("compare_versions"), 0);

    session.toggle_version(1).await;
    let comparison = session.compare_selected().await.expect("compare");
    assert_eq!(comparison.version1.number, 1);
    assert_eq!(comparison.version2.number, 3);
    assert!(api.calls().contains(&"compare_versions:42:1-3".to_string()));
    assert_eq!(session.snapshot().await.comparison, Some(comparison));
}
