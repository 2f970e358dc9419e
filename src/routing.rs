/* src/routing.rs */

use crate::{
    error::ResolveError,
    operations::{AFTER_TXID, Operation},
    payload::Payload,
    state::AppState,
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

type Resolved = Result<Payload, ResolveError>;

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

/// Query parameters understood by the address history route; anything else
/// is ignored.
#[derive(Deserialize)]
struct AddressTxsQuery {
    after_txid: Option<String>,
}

/// Maps inbound paths onto engine operations.
pub fn router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/blocks/tip/height", get(tip_height))
        .route("/block-height/{height}", get(block_hash))
        .route("/block/{hash}", get(block))
        .route("/tx/{txid}", get(transaction))
        .route("/address/{address}/utxo", get(address_utxo))
        .route("/address/{address}/txs", get(address_txs));

    Router::new()
        .nest("/api", api)
        .fallback(not_found)
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "detail": "Not Found" })),
    )
}

async fn tip_height(State(state): State<Arc<AppState>>) -> Resolved {
    state
        .engine
        .resolve(Operation::TipHeight, Vec::new(), BTreeMap::new())
        .await
}

async fn block_hash(State(state): State<Arc<AppState>>, Path(height): Path<String>) -> Resolved {
    single(&state, Operation::BlockHash, height).await
}

async fn block(State(state): State<Arc<AppState>>, Path(hash): Path<String>) -> Resolved {
    single(&state, Operation::Block, hash).await
}

async fn transaction(State(state): State<Arc<AppState>>, Path(txid): Path<String>) -> Resolved {
    single(&state, Operation::Transaction, txid).await
}

async fn address_utxo(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Resolved {
    single(&state, Operation::AddressUtxo, address).await
}

async fn address_txs(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Query(query): Query<AddressTxsQuery>,
) -> Resolved {
    let named = query
        .after_txid
        .map(|txid| (AFTER_TXID.to_owned(), txid))
        .into_iter()
        .collect();
    state
        .engine
        .resolve(Operation::AddressTxs, vec![address], named)
        .await
}

async fn single(state: &AppState, operation: Operation, arg: String) -> Resolved {
    state
        .engine
        .resolve(operation, vec![arg], BTreeMap::new())
        .await
}
