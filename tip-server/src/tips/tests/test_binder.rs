use super::*;
use crate::db::repository::template as template_repo;
use crate::tips::TipError;
use shared::models::{ClockInEvent, SplitMode, TemplateCreate, TemplateUpdate};

async fn seed_template(
    state: &crate::core::ServerState,
    name: &str,
    allowed_role_ids: Vec<i64>,
) -> i64 {
    template_repo::create(
        &state.pool,
        TemplateCreate {
            name: name.into(),
            allowed_role_ids,
            default_split_mode: SplitMode::Equal,
        },
    )
    .await
    .unwrap()
    .id
}

fn clock_in_event(employee_id: i64, role_id: i64, template_id: Option<i64>) -> ClockInEvent {
    ClockInEvent {
        employee_id,
        role_id,
        selected_template_id: template_id,
        at: None,
    }
}

#[tokio::test]
async fn clock_in_without_template_opens_a_shift_only() {
    let state = test_state().await;
    let outcome = state
        .binder
        .clock_in(&clock_in_event(ANA, ROLE_SERVER, None))
        .await
        .unwrap();
    assert!(outcome.group_id.is_none());
    assert!(outcome.pooling_error.is_none());
    assert!(state.groups.active_groups().await.unwrap().is_empty());
}

#[tokio::test]
async fn first_clock_in_creates_the_backing_group_second_joins_it() {
    let state = test_state().await;
    let template_id = seed_template(&state, "Floor pool", vec![]).await;

    let first = state
        .binder
        .clock_in(&clock_in_event(ANA, ROLE_SERVER, Some(template_id)))
        .await
        .unwrap();
    let group_id = first.group_id.expect("pooling assigned");

    let second = state
        .binder
        .clock_in(&clock_in_event(BEN, ROLE_SERVER, Some(template_id)))
        .await
        .unwrap();
    assert_eq!(second.group_id, Some(group_id));

    // One group, two segments (creation + join)
    assert_eq!(state.groups.active_groups().await.unwrap().len(), 1);
    let history = state.groups.group_history(group_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history.last().unwrap().members.len(), 2);
}

#[tokio::test]
async fn pooling_failure_never_blocks_the_clock_in() {
    let state = test_state().await;
    let template_id = seed_template(&state, "Floor pool", vec![]).await;

    // Ana is already pooled elsewhere
    state
        .groups
        .create_group(None, SplitMode::Equal, ANA)
        .await
        .unwrap();

    let outcome = state
        .binder
        .clock_in(&clock_in_event(ANA, ROLE_SERVER, Some(template_id)))
        .await
        .unwrap();

    // The shift exists; the pooling failure is reported, not raised
    assert!(outcome.shift_id > 0);
    assert!(outcome.group_id.is_none());
    let err = outcome.pooling_error.expect("pooling error surfaced");
    assert!(err.contains("already active"));
}

#[tokio::test]
async fn eligible_templates_filter_by_role() {
    let state = test_state().await;
    let servers_only = seed_template(&state, "Servers only", vec![ROLE_SERVER]).await;
    let open_to_all = seed_template(&state, "Whole floor", vec![]).await;

    let for_busser = state.binder.eligible_templates(ROLE_BUSSER).await.unwrap();
    assert_eq!(for_busser.len(), 1);
    assert_eq!(for_busser[0].id, open_to_all);

    let for_server = state.binder.eligible_templates(ROLE_SERVER).await.unwrap();
    let ids: Vec<i64> = for_server.iter().map(|t| t.id).collect();
    assert!(ids.contains(&servers_only));
    assert!(ids.contains(&open_to_all));
}

#[tokio::test]
async fn assignment_respects_template_state_and_role() {
    let state = test_state().await;
    let template_id = seed_template(&state, "Servers only", vec![ROLE_SERVER]).await;

    // Busser not allowed
    assert!(matches!(
        state.binder.assign_to_template(DANI, template_id).await,
        Err(TipError::RoleNotEligible { .. })
    ));

    // Deactivated template not assignable
    template_repo::update(
        &state.pool,
        template_id,
        TemplateUpdate {
            name: None,
            allowed_role_ids: None,
            default_split_mode: None,
            active: Some(false),
        },
    )
    .await
    .unwrap();
    assert!(matches!(
        state.binder.assign_to_template(ANA, template_id).await,
        Err(TipError::TemplateInactive(_))
    ));
}

#[tokio::test]
async fn closed_backing_group_is_replaced_on_next_clock_in() {
    let state = test_state().await;
    let template_id = seed_template(&state, "Floor pool", vec![]).await;

    let g1 = state.binder.assign_to_template(ANA, template_id).await.unwrap();
    state.groups.remove_member(g1, ANA).await.unwrap(); // closes g1

    let g2 = state.binder.assign_to_template(BEN, template_id).await.unwrap();
    assert_ne!(g1, g2);
    assert_eq!(state.groups.active_groups().await.unwrap().len(), 1);
}
