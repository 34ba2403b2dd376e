use shared::models::LegalEntity;
use shared::util::now_millis;
use sqlx::PgConnection;
use uuid::Uuid;

pub async fn find_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<LegalEntity>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM legal_entities WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_by_name(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Option<LegalEntity>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM legal_entities WHERE name = $1")
        .bind(name)
        .fetch_optional(conn)
        .await
}

pub async fn list(conn: &mut PgConnection) -> Result<Vec<LegalEntity>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM legal_entities ORDER BY name")
        .fetch_all(conn)
        .await
}

pub async fn create(conn: &mut PgConnection, name: &str) -> Result<LegalEntity, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        "INSERT INTO legal_entities (id, name, created_at, updated_at) VALUES ($1, $2, $3, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn rename(
    conn: &mut PgConnection,
    id: Uuid,
    name: &str,
) -> Result<Option<LegalEntity>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE legal_entities SET name = $2, updated_at = $3 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(name)
    .bind(now_millis())
    .fetch_optional(conn)
    .await
}

pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM legal_entities WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_departments(conn: &mut PgConnection, id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM departments WHERE legal_entity_id = $1")
        .bind(id)
        .fetch_one(conn)
        .await
}
