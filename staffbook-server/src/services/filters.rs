//! Search filter options

use shared::models::FilterOptions;

use crate::access::{self, Operation};
use crate::auth::CurrentUser;
use crate::error::ServiceResult;
use crate::state::AppState;

/// Distinct values the search UI offers as filters
pub async fn options(state: &AppState, actor: &CurrentUser) -> ServiceResult<FilterOptions> {
    access::authorize(actor, Operation::ReadDirectory)?;

    let mut tx = state.store.begin().await?;
    let cities = tx.distinct_cities().await?;
    let positions = tx.distinct_positions().await?;
    let skills = tx.list_skills().await?.into_iter().map(|s| s.name).collect();
    let legal_entities = tx
        .list_legal_entities()
        .await?
        .into_iter()
        .map(|e| e.name)
        .collect();
    let departments = tx
        .list_departments()
        .await?
        .into_iter()
        .map(|d| d.name)
        .collect();

    Ok(FilterOptions {
        cities,
        positions,
        skills,
        legal_entities,
        departments,
    })
}
