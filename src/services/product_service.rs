use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    dto::products::{CreateProductRequest, ProductList},
    entity::products::{ActiveModel as ProductActive, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    models::Product,
    response::Meta,
    routes::params::Pagination,
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    pagination: Pagination,
) -> AppResult<(ProductList, Meta)> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Products::find().order_by_desc(Column::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok((ProductList { items }, meta))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<Product> {
    let product = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::ProductNotFound)?;
    Ok(product_from_entity(product))
}

pub async fn create_product(
    state: &AppState,
    payload: CreateProductRequest,
) -> AppResult<Product> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("Missing name".to_string()));
    }
    if payload.price < 0 {
        return Err(AppError::BadRequest("price must not be negative".to_string()));
    }
    if payload.available_quantity < 0 {
        return Err(AppError::BadRequest(
            "available_quantity must not be negative".to_string(),
        ));
    }

    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name),
        price: Set(payload.price),
        available_quantity: Set(payload.available_quantity),
        version: Set(1),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(product_id = %product.id, "product created");
    Ok(product_from_entity(product))
}

fn product_from_entity(model: ProductModel) -> Product {
    Product {
        id: model.id,
        name: model.name,
        price: model.price,
        available_quantity: model.available_quantity,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
