//! Employee and role fact repositories
//!
//! Read-only mirrors kept current by the staff-management collaborator.

use super::RepoResult;
use shared::models::{Employee, EmployeeUpsert, Role, RoleUpsert};
use sqlx::SqliteConnection;

pub async fn upsert_employee(
    conn: &mut SqliteConnection,
    data: &EmployeeUpsert,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO employee (id, name, role_id, active) VALUES (?, ?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, role_id = excluded.role_id, active = excluded.active",
    )
    .bind(data.id)
    .bind(&data.name)
    .bind(data.role_id)
    .bind(data.active)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_employee(
    conn: &mut SqliteConnection,
    id: i64,
) -> RepoResult<Option<Employee>> {
    let employee = sqlx::query_as::<_, Employee>(
        "SELECT id, name, role_id, active FROM employee WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(employee)
}

pub async fn upsert_role(conn: &mut SqliteConnection, data: &RoleUpsert) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO role (id, name, tip_weight, active) VALUES (?, ?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, tip_weight = excluded.tip_weight, active = excluded.active",
    )
    .bind(data.id)
    .bind(&data.name)
    .bind(data.tip_weight)
    .bind(data.active)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_role(conn: &mut SqliteConnection, id: i64) -> RepoResult<Option<Role>> {
    let role =
        sqlx::query_as::<_, Role>("SELECT id, name, tip_weight, active FROM role WHERE id = ?")
            .bind(id)
            .fetch_optional(conn)
            .await?;
    Ok(role)
}
