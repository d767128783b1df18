//! Item CRUD and listing endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::ItemId;
use domain::Item;
use ledger_store::{DEFAULT_LIMIT, LedgerStore, ListQuery, Sort};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<S: LedgerStore> {
    pub store: S,
}

// -- Request types --

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub stock_available: i64,
    #[serde(default)]
    pub stock_reserved: i64,
}

/// Partial update: absent fields leave the stored value untouched.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub name: Option<String>,
    pub stock_available: Option<i64>,
    pub stock_reserved: Option<i64>,
}

impl ItemPatch {
    fn apply(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(available) = self.stock_available {
            item.stock_available = available;
        }
        if let Some(reserved) = self.stock_reserved {
            item.stock_reserved = reserved;
        }
    }
}

#[derive(Deserialize, Default)]
pub struct ListParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub sort: Option<String>,
}

// -- Response types --

#[derive(Serialize)]
pub struct SearchResponse {
    pub offset: usize,
    pub limit: usize,
    pub total: usize,
    pub sort: String,
    pub data: Vec<Item>,
}

// -- Handlers --

/// POST /api/v1/items — create a ledger entry, answering with its id.
#[tracing::instrument(skip(state, req), fields(item_id = req.id))]
pub async fn create<S: LedgerStore>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<i64>), ApiError> {
    let item = Item::new(
        ItemId::new(req.id),
        req.name,
        req.stock_available,
        req.stock_reserved,
    );
    item.validate()?;

    let record = state.store.insert(item).await?;
    tracing::info!(item_id = %record.id(), "item created");

    Ok((StatusCode::CREATED, Json(record.id().as_i64())))
}

/// GET /api/v1/items/:id — fetch one ledger entry.
#[tracing::instrument(skip(state))]
pub async fn get_by_id<S: LedgerStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<Json<Item>, ApiError> {
    let record = state
        .store
        .find_by_id(ItemId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {id} not found")))?;

    Ok(Json(record.item))
}

/// PATCH /api/v1/items/:id — partial update; absent fields are kept.
#[tracing::instrument(skip(state, patch))]
pub async fn update<S: LedgerStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
    Json(patch): Json<ItemPatch>,
) -> Result<Json<Item>, ApiError> {
    let mut record = state
        .store
        .find_by_id(ItemId::new(id))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Item {id} not found")))?;

    patch.apply(&mut record.item);
    record.item.validate()?;

    let saved = state.store.save(record).await?;
    tracing::info!(item_id = %saved.id(), "item updated");

    Ok(Json(saved.item))
}

/// DELETE /api/v1/items/:id — remove a ledger entry.
#[tracing::instrument(skip(state))]
pub async fn delete<S: LedgerStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let item_id = ItemId::new(id);
    match state.store.delete(item_id).await {
        Ok(()) => {
            tracing::info!(%item_id, "item deleted");
            Ok(StatusCode::NO_CONTENT)
        }
        Err(ledger_store::LedgerError::NotFound(_)) => {
            Err(ApiError::NotFound(format!("Item {id} not found")))
        }
        Err(e) => Err(e.into()),
    }
}

/// GET /api/v1/items — offset/limit listing with a sort whitelist.
#[tracing::instrument(skip(state, params))]
pub async fn list<S: LedgerStore>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ListParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let sort = match &params.sort {
        Some(raw) => raw.parse::<Sort>()?,
        None => Sort::default(),
    };
    let query = ListQuery::new()
        .limit(params.limit.unwrap_or(DEFAULT_LIMIT))
        .offset(params.offset.unwrap_or(0))
        .sort(sort);

    let records = state.store.list(query.clone()).await?;
    let data: Vec<Item> = records.into_iter().map(|record| record.item).collect();

    Ok(Json(SearchResponse {
        offset: query.offset,
        limit: query.limit,
        total: data.len(),
        sort: sort.to_string(),
        data,
    }))
}
