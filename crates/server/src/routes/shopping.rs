//! Public shopping routes, keyed by pincode.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;

use foodlane_core::{Food, Offer, Pincode, VendorId};

use crate::error::AppError;
use crate::models::RestaurantView;
use crate::services::{CatalogService, OfferService};
use crate::state::AppState;

/// Window used by the quick-delivery listing, in minutes.
const QUICK_READY_MINUTES: u32 = 30;

/// Build the public shopping router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/offers", get(offers))
        .route("/{pincode}", get(availability))
        .route("/top-restaurants/{pincode}", get(top_restaurants))
        .route("/foods-in-30-min/{pincode}", get(quick_foods))
        .route("/search/{pincode}", get(search))
        .route("/restaurant/{id}", get(restaurant))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

fn pincode(raw: &str) -> Result<Pincode, AppError> {
    Pincode::parse(raw).map_err(|e| AppError::BadRequest(e.to_string()))
}

fn non_empty<T>(items: Vec<T>, what: &str) -> Result<Json<Vec<T>>, AppError> {
    if items.is_empty() {
        return Err(AppError::NotFound(format!("No {what} found")));
    }
    Ok(Json(items))
}

async fn availability(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Vec<RestaurantView>>, AppError> {
    let restaurants = CatalogService::new(state.store())
        .availability(&pincode(&raw)?)
        .await?;
    non_empty(restaurants, "restaurants")
}

async fn top_restaurants(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Vec<RestaurantView>>, AppError> {
    let restaurants = CatalogService::new(state.store())
        .top_restaurants(&pincode(&raw)?)
        .await?;
    non_empty(restaurants, "restaurants")
}

async fn quick_foods(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Json<Vec<Food>>, AppError> {
    let foods = CatalogService::new(state.store())
        .foods_ready_within(&pincode(&raw)?, QUICK_READY_MINUTES)
        .await?;
    non_empty(foods, "food items")
}

async fn search(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Food>>, AppError> {
    let foods = CatalogService::new(state.store())
        .search(&pincode(&raw)?, query.q.as_deref())
        .await?;
    non_empty(foods, "food items")
}

async fn restaurant(
    State(state): State<AppState>,
    Path(id): Path<VendorId>,
) -> Result<Json<RestaurantView>, AppError> {
    let restaurant = CatalogService::new(state.store()).restaurant(id).await?;
    Ok(Json(restaurant))
}

/// Offers anyone can see: GENERIC ones only.
async fn offers(State(state): State<AppState>) -> Result<Json<Vec<Offer>>, AppError> {
    let offers = OfferService::new(state.store()).eligible(None).await?;
    Ok(Json(offers))
}
