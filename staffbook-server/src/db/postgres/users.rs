use shared::models::{NewUser, SearchQuery, Skill, User, UserAdminUpdate};
use shared::util::now_millis;
use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

const FUZZY_FIELD: &str = "lower(coalesce(u.first_name, '') || ' ' || coalesce(u.last_name, '') || ' ' || coalesce(u.position, '') || ' ' || coalesce(u.email, ''))";

pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn find_by_email(
    conn: &mut PgConnection,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(conn)
        .await
}

pub async fn list(conn: &mut PgConnection, active_only: bool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM users WHERE ($1 = FALSE OR is_active) ORDER BY last_name, first_name",
    )
    .bind(active_only)
    .fetch_all(conn)
    .await
}

pub async fn list_in_department(
    conn: &mut PgConnection,
    department_id: Uuid,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE department_id = $1 ORDER BY last_name, first_name")
        .bind(department_id)
        .fetch_all(conn)
        .await
}

pub async fn create(conn: &mut PgConnection, user: &NewUser) -> Result<User, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        "INSERT INTO users (id, first_name, last_name, email, password_hash, role, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, $7, $7)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.role)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    changes: &UserAdminUpdate,
) -> Result<Option<User>, sqlx::Error> {
    let profile = &changes.profile;
    sqlx::query_as(
        "UPDATE users SET
            first_name = COALESCE($2, first_name),
            last_name = COALESCE($3, last_name),
            email = COALESCE($4, email),
            position = COALESCE($5, position),
            department_id = CASE WHEN $6 THEN $7 ELSE department_id END,
            role = COALESCE($8, role),
            city = COALESCE($9, city),
            birthday = COALESCE($10, birthday),
            phone = COALESCE($11, phone),
            telegram = COALESCE($12, telegram),
            mattermost = COALESCE($13, mattermost),
            employee_status = COALESCE($14, employee_status),
            bio = COALESCE($15, bio),
            updated_at = $16
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(&changes.first_name)
    .bind(&changes.last_name)
    .bind(&changes.email)
    .bind(&changes.position)
    .bind(changes.department_id.is_some())
    .bind(changes.department_id.flatten())
    .bind(changes.role)
    .bind(&changes.city)
    .bind(changes.birthday)
    .bind(&profile.phone)
    .bind(&profile.telegram)
    .bind(&profile.mattermost)
    .bind(profile.employee_status)
    .bind(&profile.bio)
    .bind(now_millis())
    .fetch_optional(conn)
    .await
}

pub async fn deactivate(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("UPDATE users SET is_active = FALSE, updated_at = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(now_millis())
        .fetch_optional(conn)
        .await
}

pub async fn search(conn: &mut PgConnection, query: &SearchQuery) -> Result<Vec<User>, sqlx::Error> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
        "SELECT u.* FROM users u LEFT JOIN departments d ON d.id = u.department_id WHERE TRUE",
    );

    if !query.cities.is_empty() {
        let cities: Vec<String> = query.cities.iter().map(|c| c.to_lowercase()).collect();
        qb.push(" AND lower(u.city) = ANY(").push_bind(cities).push(")");
    }
    if !query.departments.is_empty() {
        qb.push(" AND u.department_id = ANY(")
            .push_bind(query.departments.clone())
            .push(")");
    }
    if !query.legal_entities.is_empty() {
        qb.push(" AND d.legal_entity_id = ANY(")
            .push_bind(query.legal_entities.clone())
            .push(")");
    }
    if !query.skills.is_empty() {
        let mut skills: Vec<String> = query.skills.iter().map(|s| s.to_lowercase()).collect();
        skills.sort();
        skills.dedup();
        let required = skills.len() as i64;
        qb.push(
            " AND (SELECT count(DISTINCT lower(s.name)) FROM user_skills_association us \
             JOIN skills s ON s.id = us.skill_id WHERE us.user_id = u.id AND lower(s.name) = ANY(",
        )
        .push_bind(skills)
        .push(")) = ")
        .push_bind(required);
    }

    match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => {
            qb.push(" ORDER BY similarity(")
                .push(FUZZY_FIELD)
                .push(", ")
                .push_bind(q.to_lowercase())
                .push(") DESC, u.last_name, u.first_name");
        }
        None => {
            qb.push(" ORDER BY u.last_name, u.first_name");
        }
    }

    qb.build_query_as().fetch_all(conn).await
}

pub async fn distinct_cities(conn: &mut PgConnection) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT city FROM (SELECT DISTINCT city FROM users WHERE city IS NOT NULL) c ORDER BY lower(city), city",
    )
    .fetch_all(conn)
    .await
}

pub async fn distinct_positions(conn: &mut PgConnection) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT position FROM (SELECT DISTINCT position FROM users WHERE position IS NOT NULL) p ORDER BY lower(position), position",
    )
    .fetch_all(conn)
    .await
}

#[derive(sqlx::FromRow)]
struct UserSkillRow {
    user_id: Uuid,
    #[sqlx(flatten)]
    skill: Skill,
}

pub async fn skills_of(
    conn: &mut PgConnection,
    user_ids: &[Uuid],
) -> Result<Vec<(Uuid, Skill)>, sqlx::Error> {
    let rows: Vec<UserSkillRow> = sqlx::query_as(
        "SELECT us.user_id, s.id, s.name, s.created_at, s.updated_at
         FROM user_skills_association us JOIN skills s ON s.id = us.skill_id
         WHERE us.user_id = ANY($1)
         ORDER BY lower(s.name)",
    )
    .bind(user_ids)
    .fetch_all(conn)
    .await?;
    Ok(rows.into_iter().map(|r| (r.user_id, r.skill)).collect())
}

pub async fn set_skills(
    conn: &mut PgConnection,
    user_id: Uuid,
    skill_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM user_skills_association WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO user_skills_association (user_id, skill_id)
         SELECT $1, unnest($2::uuid[])
         ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(skill_ids)
    .execute(&mut *conn)
    .await?;
    sqlx::query("UPDATE users SET updated_at = $2 WHERE id = $1")
        .bind(user_id)
        .bind(now_millis())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn set_current_avatar(
    conn: &mut PgConnection,
    user_id: Uuid,
    avatar_id: Option<Uuid>,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET current_avatar_id = $2, updated_at = $3 WHERE id = $1")
        .bind(user_id)
        .bind(avatar_id)
        .bind(now_millis())
        .execute(conn)
        .await?;
    Ok(())
}
