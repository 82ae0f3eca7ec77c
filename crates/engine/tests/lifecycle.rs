//! End-to-end lifecycle tests against the in-memory store.

mod common;

use anet_core::approval_step::StepOwner;
use anet_core::error::CoreError;
use anet_core::notification::{Notification, RollupEvent};
use anet_core::report::{
    ActionType, ApproveReport, CreateReport, RejectReport, ReportState, UpdateReport,
};
use anet_core::settings::DEFAULT_APPROVAL_ORGANIZATION;
use anet_engine::WorkflowConfig;
use assert_matches::assert_matches;

use common::*;

fn approve() -> ApproveReport {
    ApproveReport::default()
}

fn reject(comment: &str) -> RejectReport {
    RejectReport {
        comment: comment.to_string(),
        version: None,
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_two_step_org_chain_is_walked_to_approval() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;

    let view = h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    assert_eq!(view.report.state, ReportState::PendingApproval);
    assert_eq!(view.approval_step.map(|s| s.step_id), Some(STEP_EF1_REVIEW));
    assert_eq!(view.report.advisor_organization_id, Some(ORG_EF1_1));

    let view = h.engine.approve_report(S1_APPROVER, id, approve()).await.unwrap();
    assert_eq!(view.report.state, ReportState::PendingApproval);
    assert_eq!(view.approval_step.map(|s| s.step_id), Some(STEP_EF1_SIGNOFF));

    let view = h.engine.approve_report(S2_APPROVER, id, approve()).await.unwrap();
    assert_eq!(view.report.state, ReportState::Approved);
    assert_eq!(view.approval_step, None);

    let actions: Vec<_> = view.report.workflow.iter().map(|a| a.action_type).collect();
    assert_eq!(
        actions,
        vec![ActionType::Submit, ActionType::Approve, ActionType::Approve]
    );
}

#[tokio::test]
async fn test_cancelled_engagement_ends_cancelled_after_single_step() {
    let mut dir = base_directory();
    dir.remove_step(STEP_EF1_SIGNOFF);
    dir.step_mut(STEP_EF1_REVIEW).unwrap().next_step_id = None;
    let h = Harness::new(dir);

    let id = h
        .draft(CreateReport {
            cancelled_reason: Some("Cancelled by host".to_string()),
            ..past_engagement()
        })
        .await;
    h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    let view = h.engine.approve_report(S1_APPROVER, id, approve()).await.unwrap();

    assert_eq!(view.report.state, ReportState::Cancelled);
}

#[tokio::test]
async fn test_publish_then_admin_unpublish_returns_to_draft() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;
    h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    h.engine.approve_report(S1_APPROVER, id, approve()).await.unwrap();
    h.engine.approve_report(S2_APPROVER, id, approve()).await.unwrap();

    let published = h.engine.publish_report(ADMIN, id, None).await.unwrap();
    assert_eq!(published.report.state, ReportState::Published);
    assert_eq!(published.report.released_at, Some(now()));

    assert_matches!(
        h.engine.unpublish_report(S1_APPROVER, id, None).await,
        Err(CoreError::Forbidden(_))
    );
    let still = h.engine.get_report(id).await.unwrap();
    assert_eq!(still.report.state, ReportState::Published);
    assert_eq!(still.version, published.version);

    let before = published.report.workflow.len();
    let view = h.engine.unpublish_report(ADMIN, id, None).await.unwrap();
    assert_eq!(view.report.state, ReportState::Draft);
    assert_eq!(view.report.workflow.len(), before + 1);

    let rollups = h.notifier.take_rollups();
    assert_matches!(
        rollups.as_slice(),
        [
            RollupEvent::Published { report_id, advisor_organization_id: Some(ORG_EF1_1), .. },
            RollupEvent::Unpublished { .. },
        ] if *report_id == id
    );
}

// ---------------------------------------------------------------------------
// Empty sequences and the default organization
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_empty_sequence_goes_straight_to_approved() {
    let mut dir = base_directory();
    dir.remove_step(STEP_DEFAULT);
    let h = Harness::new(dir);

    let id = h
        .engine
        .create_report(
            EF2_AUTHOR,
            CreateReport {
                primary_advisor_id: Some(EF2_AUTHOR),
                ..past_engagement()
            },
        )
        .await
        .unwrap()
        .report
        .id;
    let view = h.engine.submit_report(EF2_AUTHOR, id, None).await.unwrap();

    assert_eq!(view.report.state, ReportState::Approved);
    assert!(view.report.stages.is_empty());
    assert!(h.notifier.take_notifications().is_empty());
}

#[tokio::test]
async fn test_empty_sequence_with_cancelled_reason_goes_to_cancelled() {
    let mut dir = base_directory();
    dir.remove_step(STEP_DEFAULT);
    let h = Harness::new(dir);

    let id = h
        .engine
        .create_report(
            EF2_AUTHOR,
            CreateReport {
                primary_advisor_id: Some(EF2_AUTHOR),
                cancelled_reason: Some("Weather".to_string()),
                ..past_engagement()
            },
        )
        .await
        .unwrap()
        .report
        .id;
    let view = h.engine.submit_report(EF2_AUTHOR, id, None).await.unwrap();
    assert_eq!(view.report.state, ReportState::Cancelled);
}

#[tokio::test]
async fn test_org_without_chain_in_ancestry_uses_default_organization() {
    let h = Harness::new(base_directory());
    let id = h
        .engine
        .create_report(
            EF2_AUTHOR,
            CreateReport {
                primary_advisor_id: Some(EF2_AUTHOR),
                ..past_engagement()
            },
        )
        .await
        .unwrap()
        .report
        .id;

    let view = h.engine.submit_report(EF2_AUTHOR, id, None).await.unwrap();
    assert_eq!(view.report.stages.len(), 1);
    assert_eq!(
        view.report.stages[0].owner,
        StepOwner::Organization(ORG_DEFAULT)
    );
    h.engine
        .approve_report(DEFAULT_APPROVER, id, approve())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_invalid_default_organization_fails_submit_and_keeps_draft() {
    let h = Harness::new(base_directory());
    h.reconfigure(|dir| dir.set_setting(DEFAULT_APPROVAL_ORGANIZATION, "4040"));
    let id = h
        .engine
        .create_report(
            EF2_AUTHOR,
            CreateReport {
                primary_advisor_id: Some(EF2_AUTHOR),
                ..past_engagement()
            },
        )
        .await
        .unwrap()
        .report
        .id;

    assert_matches!(
        h.engine.submit_report(EF2_AUTHOR, id, None).await,
        Err(CoreError::Configuration(_))
    );
    let view = h.engine.get_report(id).await.unwrap();
    assert_eq!(view.report.state, ReportState::Draft);
    assert_eq!(view.version, 1);
    assert!(view.report.workflow.is_empty());
}

// ---------------------------------------------------------------------------
// Rejection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_reject_and_resubmit_supersedes_previous_cycle() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;
    let first = h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    h.engine.approve_report(S1_APPROVER, id, approve()).await.unwrap();

    let rejected = h
        .engine
        .reject_report(S2_APPROVER, id, reject("Add the attendees"))
        .await
        .unwrap();
    assert_eq!(rejected.report.state, ReportState::Rejected);
    assert!(rejected.workflow.iter().all(|e| !e.is_pending()));

    let second = h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    assert_eq!(second.report.stages, first.report.stages);
    assert_eq!(second.workflow, first.workflow);
    assert_eq!(second.report.workflow.len(), 4);
}

#[tokio::test]
async fn test_reject_notifies_authors() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;
    h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    h.notifier.take_notifications();

    h.engine
        .reject_report(S1_APPROVER, id, reject("Wrong location"))
        .await
        .unwrap();
    assert_matches!(
        h.notifier.take_notifications().as_slice(),
        [Notification::ReportRejected { rejected_by: S1_APPROVER, recipients, .. }]
            if recipients == &vec![AUTHOR]
    );
}

#[tokio::test]
async fn test_reject_without_comment_is_refused() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;
    h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    assert_matches!(
        h.engine.reject_report(S1_APPROVER, id, reject("")).await,
        Err(CoreError::Validation(_))
    );
}

// ---------------------------------------------------------------------------
// Notifications and authorization
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_each_new_stage_notifies_its_live_approvers() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;
    h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    h.engine.approve_report(S1_APPROVER, id, approve()).await.unwrap();

    let notifications = h.notifier.take_notifications();
    let targets: Vec<_> = notifications
        .iter()
        .map(|n| match n {
            Notification::ApprovalNeeded {
                stage,
                approver_position_ids,
                ..
            } => (stage.step_id, approver_position_ids.clone()),
            other => panic!("unexpected notification {other:?}"),
        })
        .collect();
    assert_eq!(
        targets,
        vec![
            (STEP_EF1_REVIEW, vec![position_of(S1_APPROVER)]),
            (STEP_EF1_SIGNOFF, vec![position_of(S2_APPROVER)]),
        ]
    );
}

#[tokio::test]
async fn test_approval_by_non_approver_is_forbidden() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;
    h.engine.submit_report(AUTHOR, id, None).await.unwrap();

    for person in [S2_APPROVER, AUTHOR, DEFAULT_APPROVER] {
        assert_matches!(
            h.engine.approve_report(person, id, approve()).await,
            Err(CoreError::Forbidden(_))
        );
    }
    h.engine.approve_report(ADMIN, id, approve()).await.unwrap();
}

#[tokio::test]
async fn test_missing_report_is_not_found() {
    let h = Harness::new(base_directory());
    assert_matches!(
        h.engine.submit_report(AUTHOR, 404, None).await,
        Err(CoreError::NotFound { entity: "Report", id: 404 })
    );
}

#[tokio::test]
async fn test_submit_requires_engagement_date_unless_configured_off() {
    let input = CreateReport {
        engagement_date: None,
        ..past_engagement()
    };

    let h = Harness::new(base_directory());
    let id = h.draft(input.clone()).await;
    assert_matches!(
        h.engine.submit_report(AUTHOR, id, None).await,
        Err(CoreError::Validation(_))
    );

    let relaxed = WorkflowConfig {
        require_engagement_date: false,
        ..WorkflowConfig::default()
    };
    let h = Harness::with_config(base_directory(), relaxed);
    let id = h.draft(input).await;
    let view = h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    assert_eq!(view.report.state, ReportState::PendingApproval);
}

// ---------------------------------------------------------------------------
// Edits and deletion
// ---------------------------------------------------------------------------

fn retitle(intent: &str) -> UpdateReport {
    UpdateReport {
        intent: Some(intent.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_approver_edit_demotes_pending_report_and_tells_authors() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;
    h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    h.notifier.take_notifications();

    let view = h
        .engine
        .update_report(S1_APPROVER, id, retitle("Clarified intent"), None)
        .await
        .unwrap();
    assert_eq!(view.report.state, ReportState::Draft);
    assert_eq!(view.report.intent, "Clarified intent");
    assert_matches!(
        h.notifier.take_notifications().as_slice(),
        [Notification::ReportEdited { editor: S1_APPROVER, .. }]
    );
}

#[tokio::test]
async fn test_author_edit_keeps_pending_state() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;
    h.engine.submit_report(AUTHOR, id, None).await.unwrap();

    let view = h
        .engine
        .update_report(AUTHOR, id, retitle("Typo fix"), None)
        .await
        .unwrap();
    assert_eq!(view.report.state, ReportState::PendingApproval);
    assert_eq!(view.approval_step.map(|s| s.step_id), Some(STEP_EF1_REVIEW));
}

#[tokio::test]
async fn test_edit_by_unrelated_user_is_forbidden() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;
    assert_matches!(
        h.engine
            .update_report(EF2_AUTHOR, id, retitle("Hijack"), None)
            .await,
        Err(CoreError::Forbidden(_))
    );
}

#[tokio::test]
async fn test_author_may_delete_draft_only() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;
    assert_matches!(
        h.engine.delete_report(S1_APPROVER, id, None).await,
        Err(CoreError::Forbidden(_))
    );
    h.engine.delete_report(AUTHOR, id, None).await.unwrap();
    assert_matches!(
        h.engine.get_report(id).await,
        Err(CoreError::NotFound { .. })
    );

    let id = h.draft(past_engagement()).await;
    h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    assert_matches!(
        h.engine.delete_report(AUTHOR, id, None).await,
        Err(CoreError::Forbidden(_))
    );
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_stale_version_is_a_conflict() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;
    let submitted = h.engine.submit_report(AUTHOR, id, None).await.unwrap();

    assert_matches!(
        h.engine
            .update_report(AUTHOR, id, retitle("Old view"), Some(submitted.version - 1))
            .await,
        Err(CoreError::Conflict(_))
    );
    let view = h.engine.get_report(id).await.unwrap();
    assert_eq!(view.version, submitted.version);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_racing_approvals_have_exactly_one_winner() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;
    let version = h.engine.submit_report(AUTHOR, id, None).await.unwrap().version;

    let mut handles = Vec::new();
    for person in [S1_APPROVER, ADMIN] {
        let engine = h.engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .approve_report(
                    person,
                    id,
                    ApproveReport {
                        comment: None,
                        version: Some(version),
                    },
                )
                .await
        }));
    }

    let mut wins = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(CoreError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error {other}"),
        }
    }
    assert_eq!((wins, conflicts), (1, 1));

    let view = h.engine.get_report(id).await.unwrap();
    assert_eq!(view.version, version + 1);
    assert_eq!(view.approval_step.map(|s| s.step_id), Some(STEP_EF1_SIGNOFF));
}
