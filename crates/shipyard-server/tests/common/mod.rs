//! Common test utilities for the HTTP API tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use shipyard_auth::{
    Principal, RateLimitConfig, RateLimiter, TokenAuthenticator, Unauthenticated,
};
use shipyard_server::{AppState, ShipStore, router};
use tower::ServiceExt;

pub const GOOD_TOKEN: &str = "good-token";
pub const PRINCIPAL: &str = "tester";

/// Accepts exactly [`GOOD_TOKEN`]
#[derive(Debug)]
pub struct StaticAuthenticator;

#[async_trait]
impl TokenAuthenticator for StaticAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Principal, Unauthenticated> {
        if token == GOOD_TOKEN {
            Ok(Principal::new(PRINCIPAL))
        } else {
            Err(Unauthenticated)
        }
    }
}

pub fn ship(id: &str, name: &str, ship_type: &str, country: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "type": ship_type,
        "launch_year": 1912,
        "country": country,
        "length": "269 m",
        "notable_events": ["Maiden voyage"],
    })
}

/// Three ships with distinct names, types and countries
pub fn fleet() -> Vec<shipyard_server::Ship> {
    [
        ship("1", "Titanic", "Ocean liner", "United Kingdom"),
        ship("2", "Bismarck", "Battleship", "Germany"),
        ship("3", "USS Enterprise", "Aircraft carrier", "United States"),
    ]
    .into_iter()
    .map(|value| serde_json::from_value(value).expect("ship json"))
    .collect()
}

/// Router backed by [`StaticAuthenticator`], the given ships and a limiter
/// allowing `limit` requests per minute
pub fn app_with(ships: Vec<shipyard_server::Ship>, limit: u32, allow_origins: &str) -> Router {
    let limiter = RateLimiter::new(
        RateLimitConfig::builder()
            .limit(limit, Duration::from_secs(60))
            .build(),
    );
    let state = AppState::new(
        Arc::new(ShipStore::with_ships(ships)),
        Arc::new(StaticAuthenticator),
        limiter,
    );
    router(state, allow_origins)
}

pub fn app() -> Router {
    app_with(fleet(), 1000, "*")
}

/// Build a request, authenticated when `token` is given
pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    request(method, uri, Some(GOOD_TOKEN), body)
}

/// Send one request through a clone of `app`
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.expect("infallible")
}

/// Collect a response body as JSON
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
