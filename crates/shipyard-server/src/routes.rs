//! HTTP routes
//!
//! | Method | Path                | Auth | Handler        |
//! |--------|---------------------|------|----------------|
//! | GET    | `/`                 | no   | [`root`]       |
//! | POST   | `/ships/`           | yes  | [`create_ship`]|
//! | GET    | `/ships/`           | yes  | [`search_ships`]|
//! | GET    | `/ships/{ship_id}`  | yes  | [`read_ship`]  |
//! | PUT    | `/ships/{ship_id}`  | yes  | [`update_ship`]|
//! | DELETE | `/ships/{ship_id}`  | yes  | [`delete_ship`]|
//!
//! `/ships` without the trailing slash is routed the same way.

use axum::{
    Extension, Json, Router,
    extract::{FromRequest, Path, Query, State},
    middleware,
    routing::get,
};
use serde_json::{Value, json};
use shipyard_auth::Principal;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::{ServerError, ServerResult};
use crate::middleware::{authentication_middleware, build_cors_layer, rate_limiting_middleware};
use crate::state::AppState;
use crate::store::{Ship, ShipQuery};

/// JSON body extractor whose rejections become 422 `{"detail": ...}`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ServerError))]
pub struct ShipBody<T>(pub T);

/// Build the application router
///
/// Layers, outermost first: CORS, request tracing, rate limiting. The ship
/// routes additionally require a valid bearer token.
pub fn router(state: AppState, allow_origins: &str) -> Router {
    let ships = Router::new()
        .route("/ships/", get(search_ships).post(create_ship))
        .route("/ships", get(search_ships).post(create_ship))
        .route(
            "/ships/{ship_id}",
            get(read_ship).put(update_ship).delete(delete_ship),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ));

    Router::new()
        .route("/", get(root))
        .merge(ships)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limiting_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(allow_origins))
        .with_state(state)
}

/// Liveness check
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Online" }))
}

/// Create a ship; its id must be unused
pub async fn create_ship(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ShipBody(ship): ShipBody<Ship>,
) -> ServerResult<Json<Ship>> {
    info!(principal = %principal, ship_id = %ship.id, "POST ship");
    Ok(Json(state.store.create(ship)?))
}

/// Fetch one ship
pub async fn read_ship(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(ship_id): Path<String>,
) -> ServerResult<Json<Ship>> {
    info!(principal = %principal, ship_id = %ship_id, "GET ship");
    Ok(Json(state.store.get(&ship_id)?))
}

/// Replace one ship
pub async fn update_ship(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(ship_id): Path<String>,
    ShipBody(ship): ShipBody<Ship>,
) -> ServerResult<Json<Ship>> {
    info!(principal = %principal, ship_id = %ship_id, "PUT ship");
    Ok(Json(state.store.update(&ship_id, ship)?))
}

/// Delete one ship; responds with JSON `null`
pub async fn delete_ship(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(ship_id): Path<String>,
) -> ServerResult<Json<Value>> {
    info!(principal = %principal, ship_id = %ship_id, "DELETE ship");
    state.store.delete(&ship_id)?;
    Ok(Json(Value::Null))
}

/// Filtered listing
pub async fn search_ships(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<ShipQuery>,
) -> Json<Vec<Ship>> {
    info!(
        principal = %principal,
        name = ?query.name,
        ship_type = ?query.ship_type,
        country = ?query.country,
        "Search ships"
    );
    Json(state.store.search(&query))
}
