use shared::models::{Department, DepartmentCreate, DepartmentUpdate};
use shared::util::now_millis;
use sqlx::PgConnection;
use uuid::Uuid;

pub async fn find_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM departments WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_by_name(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM departments WHERE name = $1")
        .bind(name)
        .fetch_optional(conn)
        .await
}

pub async fn list(conn: &mut PgConnection) -> Result<Vec<Department>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM departments ORDER BY name")
        .fetch_all(conn)
        .await
}

pub async fn list_children(
    conn: &mut PgConnection,
    parent_id: Uuid,
) -> Result<Vec<Department>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM departments WHERE parent_id = $1 ORDER BY name")
        .bind(parent_id)
        .fetch_all(conn)
        .await
}

pub async fn find_managed_by(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM departments WHERE manager_id = $1")
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

pub async fn create(
    conn: &mut PgConnection,
    dept: &DepartmentCreate,
) -> Result<Department, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        "INSERT INTO departments (id, name, legal_entity_id, parent_id, manager_id, created_at, updated_at)
         VALUES ($1, $2, $3, $4, NULL, $5, $5)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&dept.name)
    .bind(dept.legal_entity_id)
    .bind(dept.parent_id)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    changes: &DepartmentUpdate,
) -> Result<Option<Department>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE departments SET
            name = COALESCE($2, name),
            parent_id = CASE WHEN $3 THEN $4 ELSE parent_id END,
            manager_id = CASE WHEN $5 THEN $6 ELSE manager_id END,
            updated_at = $7
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&changes.name)
    .bind(changes.parent_id.is_some())
    .bind(changes.parent_id.flatten())
    .bind(changes.manager_id.is_some())
    .bind(changes.manager_id.flatten())
    .bind(now_millis())
    .fetch_optional(conn)
    .await
}

pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM departments WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_children(conn: &mut PgConnection, id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM departments WHERE parent_id = $1")
        .bind(id)
        .fetch_one(conn)
        .await
}

pub async fn count_employees(conn: &mut PgConnection, id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE department_id = $1")
        .bind(id)
        .fetch_one(conn)
        .await
}

/// Walk down from `ancestor` through `parent_id` links looking for `child`.
///
/// `UNION` (not `UNION ALL`) stops the walk on rows already visited, so a
/// corrupted cyclic tree still terminates.
pub async fn is_descendant(
    conn: &mut PgConnection,
    child: Uuid,
    ancestor: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "WITH RECURSIVE subtree(id) AS (
             SELECT $2::uuid
             UNION
             SELECT d.id FROM departments d JOIN subtree s ON d.parent_id = s.id
         )
         SELECT EXISTS (SELECT 1 FROM subtree WHERE id = $1)",
    )
    .bind(child)
    .bind(ancestor)
    .fetch_one(conn)
    .await
}
