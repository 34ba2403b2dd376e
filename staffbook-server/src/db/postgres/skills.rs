use shared::models::Skill;
use shared::util::now_millis;
use sqlx::PgConnection;
use uuid::Uuid;

pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Skill>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM skills WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_by_name(
    conn: &mut PgConnection,
    name: &str,
) -> Result<Option<Skill>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM skills WHERE lower(name) = lower($1)")
        .bind(name)
        .fetch_optional(conn)
        .await
}

pub async fn find_by_names(
    conn: &mut PgConnection,
    names: &[String],
) -> Result<Vec<Skill>, sqlx::Error> {
    let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
    sqlx::query_as("SELECT * FROM skills WHERE lower(name) = ANY($1) ORDER BY lower(name)")
        .bind(lowered)
        .fetch_all(conn)
        .await
}

pub async fn list(conn: &mut PgConnection) -> Result<Vec<Skill>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM skills ORDER BY lower(name)")
        .fetch_all(conn)
        .await
}

pub async fn create(conn: &mut PgConnection, name: &str) -> Result<Skill, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        "INSERT INTO skills (id, name, created_at, updated_at) VALUES ($1, $2, $3, $3) RETURNING *",
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
) -> Result<Option<Skill>, sqlx::Error> {
    sqlx::query_as("UPDATE skills SET name = $2, updated_at = $3 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(name)
        .bind(now_millis())
        .fetch_optional(conn)
        .await
}

pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM skills WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
