//! Stage sequences are fixed at submission while approvers are always
//! resolved from current configuration.

mod common;

use anet_core::approval_step::StageRef;
use anet_core::error::CoreError;
use anet_core::report::{ApproveReport, CreateReport, RejectReport, ReportState};
use anet_core::types::DbId;
use assert_matches::assert_matches;
use chrono::Duration;

use common::*;

fn with_task() -> CreateReport {
    CreateReport {
        task_ids: vec![TASK],
        ..past_engagement()
    }
}

fn step_ids(stages: &[StageRef]) -> Vec<DbId> {
    stages.iter().map(|s| s.step_id).collect()
}

async fn approve(h: &Harness, person: DbId, id: DbId) -> Result<ReportState, CoreError> {
    h.engine
        .approve_report(person, id, ApproveReport::default())
        .await
        .map(|view| view.report.state)
}

/// Submit and approve the two organizational stages so the report waits at
/// the first task stage.
async fn through_org_stages(h: &Harness, input: CreateReport) -> DbId {
    let id = h.draft(input).await;
    h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    approve(h, S1_APPROVER, id).await.unwrap();
    approve(h, S2_APPROVER, id).await.unwrap();
    id
}

#[tokio::test]
async fn test_restricted_stage_without_matching_approver_is_left_out() {
    let mut dir = base_directory();
    add_task_steps(&mut dir, &[TASK_APPROVER_OUT]);
    let h = Harness::new(dir);

    let id = h.draft(with_task()).await;
    let view = h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    assert_eq!(
        step_ids(&view.report.stages),
        vec![STEP_EF1_REVIEW, STEP_EF1_SIGNOFF, STEP_TASK_OPEN]
    );
}

#[tokio::test]
async fn test_stages_are_composed_org_then_task_then_location() {
    let mut dir = base_directory();
    add_task_steps(&mut dir, &[TASK_APPROVER_IN]);
    add_location_step(&mut dir);
    let h = Harness::new(dir);

    let id = h
        .draft(CreateReport {
            location_id: Some(LOCATION),
            ..with_task()
        })
        .await;
    let view = h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    assert_eq!(
        step_ids(&view.report.stages),
        vec![
            STEP_EF1_REVIEW,
            STEP_EF1_SIGNOFF,
            STEP_TASK_OPEN,
            STEP_TASK_RESTRICTED,
            STEP_LOCATION,
        ]
    );
    let pending: Vec<_> = view.workflow.iter().filter(|e| e.is_pending()).collect();
    assert_eq!(pending.len(), 5);
    assert_eq!(pending[4].step_name.as_deref(), Some("Site review"));
}

#[tokio::test]
async fn test_removing_restricted_approver_keeps_stage_with_no_approvers() {
    let mut dir = base_directory();
    add_task_steps(&mut dir, &[TASK_APPROVER_IN]);
    let h = Harness::new(dir);

    let id = through_org_stages(&h, with_task()).await;
    approve(&h, S1_APPROVER, id).await.unwrap();
    let before = h.engine.get_report(id).await.unwrap();
    assert_eq!(
        before.approval_step.map(|s| s.step_id),
        Some(STEP_TASK_RESTRICTED)
    );

    h.reconfigure(|dir| {
        dir.step_mut(STEP_TASK_RESTRICTED)
            .unwrap()
            .approver_position_ids = vec![position_of(TASK_APPROVER_OUT)];
    });

    let after = h.engine.get_report(id).await.unwrap();
    assert_eq!(after.report.stages, before.report.stages);
    let current = after.workflow.last().unwrap();
    assert!(current.is_pending());
    assert_eq!(current.step.map(|s| s.step_id), Some(STEP_TASK_RESTRICTED));
    assert!(current.approver_position_ids.is_empty());

    for person in [TASK_APPROVER_IN, TASK_APPROVER_OUT] {
        assert_matches!(approve(&h, person, id).await, Err(CoreError::Forbidden(_)));
    }
    assert_eq!(approve(&h, ADMIN, id).await.unwrap(), ReportState::Approved);
}

#[tokio::test]
async fn test_added_approver_can_act_without_changing_sequence() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;
    let submitted = h.engine.submit_report(AUTHOR, id, None).await.unwrap();

    assert_matches!(
        approve(&h, DEFAULT_APPROVER, id).await,
        Err(CoreError::Forbidden(_))
    );
    h.reconfigure(|dir| {
        dir.step_mut(STEP_EF1_REVIEW)
            .unwrap()
            .approver_position_ids
            .push(position_of(DEFAULT_APPROVER));
    });

    let view = h.engine.get_report(id).await.unwrap();
    assert_eq!(view.report.stages, submitted.report.stages);
    assert_eq!(
        view.workflow[1].approver_position_ids,
        vec![position_of(S1_APPROVER), position_of(DEFAULT_APPROVER)]
    );
    assert_eq!(
        approve(&h, DEFAULT_APPROVER, id).await.unwrap(),
        ReportState::PendingApproval
    );
}

#[tokio::test]
async fn test_new_position_holder_inherits_approval_right() {
    let h = Harness::new(base_directory());
    let id = h.draft(past_engagement()).await;
    h.engine.submit_report(AUTHOR, id, None).await.unwrap();

    h.reconfigure(|dir| {
        dir.position_mut(position_of(S1_APPROVER)).unwrap().person_id = Some(EF2_AUTHOR);
    });

    assert_matches!(
        approve(&h, S1_APPROVER, id).await,
        Err(CoreError::Forbidden(_))
    );
    approve(&h, EF2_AUTHOR, id).await.unwrap();
}

#[tokio::test]
async fn test_deleted_task_leaves_stages_for_administrators() {
    let mut dir = base_directory();
    add_task_steps(&mut dir, &[TASK_APPROVER_IN]);
    let h = Harness::new(dir);

    let id = through_org_stages(&h, with_task()).await;
    h.reconfigure(|dir| {
        dir.remove_task(TASK);
    });

    let view = h.engine.get_report(id).await.unwrap();
    assert_eq!(view.report.stages.len(), 4);
    let pending: Vec<_> = view.workflow.iter().filter(|e| e.is_pending()).collect();
    assert_eq!(pending.len(), 2);
    assert!(pending
        .iter()
        .all(|e| e.step_name.is_none() && e.approver_position_ids.is_empty()));

    assert_matches!(
        approve(&h, S1_APPROVER, id).await,
        Err(CoreError::Forbidden(_))
    );
    approve(&h, ADMIN, id).await.unwrap();
    assert_eq!(approve(&h, ADMIN, id).await.unwrap(), ReportState::Approved);
}

#[tokio::test]
async fn test_resubmission_recomposes_from_current_configuration() {
    let h = Harness::new(base_directory());
    let id = h
        .draft(CreateReport {
            location_id: Some(LOCATION),
            ..past_engagement()
        })
        .await;
    let first = h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    assert_eq!(first.report.stages.len(), 2);

    h.engine
        .reject_report(
            S1_APPROVER,
            id,
            RejectReport {
                comment: "Name the site".to_string(),
                version: None,
            },
        )
        .await
        .unwrap();
    h.reconfigure(add_location_step);

    let second = h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    assert_eq!(
        step_ids(&second.report.stages),
        vec![STEP_EF1_REVIEW, STEP_EF1_SIGNOFF, STEP_LOCATION]
    );
}

#[tokio::test]
async fn test_planned_engagement_uses_planning_chains_only() {
    let mut dir = base_directory();
    add_task_steps(&mut dir, &[TASK_APPROVER_IN]);
    add_location_step(&mut dir);
    let h = Harness::new(dir);

    let id = h
        .draft(CreateReport {
            task_ids: vec![TASK],
            location_id: Some(LOCATION),
            ..planned_engagement()
        })
        .await;
    let view = h.engine.submit_report(AUTHOR, id, None).await.unwrap();
    assert_eq!(step_ids(&view.report.stages), vec![STEP_TASK_PLANNING]);

    assert_eq!(
        approve(&h, S2_APPROVER, id).await.unwrap(),
        ReportState::Approved
    );
    assert_matches!(
        h.engine.publish_report(ADMIN, id, None).await,
        Err(CoreError::Forbidden(_))
    );

    h.clock.advance(Duration::days(6));
    let published = h.engine.publish_report(ADMIN, id, None).await.unwrap();
    assert_eq!(published.report.state, ReportState::Published);
}
