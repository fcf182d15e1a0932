use chrono::Utc;
use sea_orm::{EntityTrait, PaginatorTrait, QueryOrder, QuerySelect};

use crate::{
    entity::users::{Column, Entity as Users},
    error::AppResult,
    models::User,
    response::Meta,
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_users(state: &AppState, pagination: Pagination) -> AppResult<(Vec<User>, Meta)> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Users::find().order_by_asc(Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let users = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| User {
            id: u.id,
            username: u.username,
            email: u.email,
            created_at: u.created_at.with_timezone(&Utc),
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok((users, meta))
}
