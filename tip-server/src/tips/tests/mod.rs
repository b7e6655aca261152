//! Engine integration tests
//!
//! Each test runs the real engines against an in-memory SQLite database
//! with the production migrations applied, seeded with a small staff.

mod test_adjustments;
mod test_binder;
mod test_groups;
mod test_ledger;
mod test_ownership;

use crate::core::{Config, ServerState};
use crate::db::DbService;
use crate::db::repository::employee as employee_repo;
use shared::models::{
    EmployeeUpsert, OrderSettlement, OwnershipMode, RoleUpsert, SettledItem,
};

// Roles
pub(crate) const ROLE_SERVER: i64 = 1;
pub(crate) const ROLE_BUSSER: i64 = 2;
pub(crate) const ROLE_HEAD_SERVER: i64 = 3;

// Staff
pub(crate) const ANA: i64 = 100; // server
pub(crate) const BEN: i64 = 200; // server
pub(crate) const CARLA: i64 = 300; // server
pub(crate) const DANI: i64 = 400; // busser
pub(crate) const EVA: i64 = 500; // head server (tip weight 1.5)
pub(crate) const FELIX: i64 = 600; // busser

pub(crate) async fn test_state() -> ServerState {
    let db = DbService::new_in_memory().await.expect("in-memory database");
    let state = ServerState::with_pool(Config::with_overrides("./target/test-work", 0), db.pool);
    seed_staff(&state).await;
    state
}

async fn seed_staff(state: &ServerState) {
    let mut conn = state.pool.acquire().await.expect("connection");

    let roles = [
        (ROLE_SERVER, "Server", 1.0),
        (ROLE_BUSSER, "Busser", 0.5),
        (ROLE_HEAD_SERVER, "Head Server", 1.5),
    ];
    for (id, name, tip_weight) in roles {
        employee_repo::upsert_role(
            &mut conn,
            &RoleUpsert {
                id,
                name: name.into(),
                tip_weight,
                active: true,
            },
        )
        .await
        .expect("seed role");
    }

    let staff = [
        (ANA, "Ana", ROLE_SERVER),
        (BEN, "Ben", ROLE_SERVER),
        (CARLA, "Carla", ROLE_SERVER),
        (DANI, "Dani", ROLE_BUSSER),
        (EVA, "Eva", ROLE_HEAD_SERVER),
        (FELIX, "Felix", ROLE_BUSSER),
    ];
    for (id, name, role_id) in staff {
        employee_repo::upsert_employee(
            &mut conn,
            &EmployeeUpsert {
                id,
                name: name.into(),
                role_id,
                active: true,
            },
        )
        .await
        .expect("seed employee");
    }
}

/// Single-item settlement owned by one employee
pub(crate) fn simple_settlement(order_id: i64, tip_cents: i64, owner: i64) -> OrderSettlement {
    OrderSettlement {
        order_id,
        tip_amount_cents: tip_cents,
        subtotal_cents: 10_000,
        items: vec![SettledItem {
            item_id: 1,
            amount_cents: 10_000,
            owner_employee_ids: vec![owner],
        }],
        table_id: None,
        creator_employee_id: owner,
        ownership_mode: OwnershipMode::ItemBased,
        settled_at: None,
    }
}

/// Two-item settlement split 70/30 between two owners
pub(crate) fn split_settlement(
    order_id: i64,
    tip_cents: i64,
    primary: i64,
    secondary: i64,
    mode: OwnershipMode,
    table_id: Option<i64>,
) -> OrderSettlement {
    OrderSettlement {
        order_id,
        tip_amount_cents: tip_cents,
        subtotal_cents: 10_000,
        items: vec![
            SettledItem {
                item_id: 1,
                amount_cents: 7_000,
                owner_employee_ids: vec![primary],
            },
            SettledItem {
                item_id: 2,
                amount_cents: 3_000,
                owner_employee_ids: vec![secondary],
            },
        ],
        table_id,
        creator_employee_id: primary,
        ownership_mode: mode,
        settled_at: None,
    }
}
