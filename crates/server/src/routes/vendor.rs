//! Vendor routes: login, profile, catalog, orders and offers.

use std::collections::HashMap;
use std::str::FromStr;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::SET_COOKIE},
    response::IntoResponse,
    routing::{get, patch, post, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use foodlane_core::{NewFood, NewOffer, OfferId, OfferPatch, OrderId, OrderUpdate, VendorPatch};

use crate::error::AppError;
use crate::extract::JsonBody;
use crate::middleware::{VendorSession, auth_rate_limiter, session_cookie};
use crate::models::{OrderView, Principal, VendorView};
use crate::services::{AuthService, CatalogService, OfferService, OrderService, VendorService};
use crate::state::AppState;

/// Largest multipart upload accepted, in bytes.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Multipart field carrying image files.
const IMAGES_FIELD: &str = "images";

/// Build the `/vendor` router.
pub fn router(state: &AppState) -> Router<AppState> {
    let mut login = Router::new().route("/login", post(login));
    if state.config().rate_limit
        && let Some(limiter) = auth_rate_limiter()
    {
        login = login.layer(limiter);
    }

    let uploads = Router::new()
        .route("/coverimage", patch(add_cover_images))
        .route("/food", post(add_food))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    Router::new()
        .merge(login)
        .merge(uploads)
        .route("/profile", get(profile).patch(update_profile))
        .route("/service", patch(toggle_service))
        .route("/foods", get(foods))
        .route("/orders", get(orders))
        .route("/order/{id}", get(order))
        .route("/order/{id}/process", put(process_order))
        .route("/offers", get(offers))
        .route("/offer", post(add_offer))
        .route("/offer/{id}", put(edit_offer))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Multipart
// =============================================================================

/// A multipart body split into text fields and image files.
#[derive(Debug, Default)]
struct Upload {
    fields: HashMap<String, String>,
    files: Vec<(String, Bytes)>,
}

impl Upload {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut upload = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_owned();
            if name == IMAGES_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    upload.files.push((file_name, bytes));
                }
            } else {
                let text = field.text().await?;
                upload.fields.insert(name, text);
            }
        }
        Ok(upload)
    }

    fn text(&self, name: &str) -> String {
        self.fields.get(name).cloned().unwrap_or_default()
    }

    fn parsed<T: FromStr>(&self, name: &str) -> Result<Option<T>, AppError> {
        match self.fields.get(name).map(|value| value.trim()) {
            None | Some("") => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| AppError::BadRequest(format!("invalid {name}: {value}"))),
        }
    }

    fn new_food(&self) -> Result<NewFood, AppError> {
        let price: Decimal = self
            .parsed("price")?
            .ok_or_else(|| AppError::BadRequest("price is required".to_owned()))?;
        Ok(NewFood {
            name: self.text("name"),
            description: self.text("description"),
            category: self.text("category"),
            food_type: self.text("foodType"),
            ready_time: self.parsed("readyTime")?.unwrap_or_default(),
            price,
        })
    }

    /// Store every file and return the stored names in upload order. On a
    /// failed write the files stored so far are removed again.
    async fn save_images(self, state: &AppState) -> Result<Vec<String>, AppError> {
        let mut names = Vec::with_capacity(self.files.len());
        for (file_name, bytes) in &self.files {
            match state.images().save(file_name, bytes).await {
                Ok(name) => names.push(name),
                Err(e) => {
                    discard_images(state, &names).await;
                    return Err(e.into());
                }
            }
        }
        Ok(names)
    }
}

/// Remove images whose database record was never written.
async fn discard_images(state: &AppState, names: &[String]) {
    for name in names {
        if let Err(e) = state.images().remove(name).await {
            tracing::warn!(file = %name, error = %e, "Failed to remove orphaned image");
        }
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let vendor = AuthService::new(state.store(), state.otp_notifier())
        .login_vendor(&req.email, &req.password)
        .await?;

    let token = state.jwt().issue(&Principal::from_vendor(&vendor))?;
    let cookie = HeaderValue::from_str(&session_cookie(&token, &state))
        .map_err(|e| AppError::Internal(format!("session cookie: {e}")))?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);

    Ok((
        headers,
        Json(json!({
            "message": "Login successful",
            "vendor": VendorView::from(&vendor),
            "token": token,
        })),
    ))
}

async fn profile(
    State(state): State<AppState>,
    VendorSession(principal): VendorSession,
) -> Result<Json<VendorView>, AppError> {
    let vendor = VendorService::new(state.store())
        .profile(principal.vendor_id())
        .await?;
    Ok(Json(VendorView::from(&vendor)))
}

async fn update_profile(
    State(state): State<AppState>,
    VendorSession(principal): VendorSession,
    JsonBody(patch): JsonBody<VendorPatch>,
) -> Result<Json<VendorView>, AppError> {
    let vendor = VendorService::new(state.store())
        .update_profile(principal.vendor_id(), patch)
        .await?;
    Ok(Json(VendorView::from(&vendor)))
}

async fn add_cover_images(
    State(state): State<AppState>,
    VendorSession(principal): VendorSession,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let vendors = VendorService::new(state.store());
    // Resolve the vendor before writing any file.
    vendors.profile(principal.vendor_id()).await?;

    let images = Upload::read(multipart).await?.save_images(&state).await?;
    let vendor = match vendors
        .add_cover_images(principal.vendor_id(), images.clone())
        .await
    {
        Ok(vendor) => vendor,
        Err(e) => {
            discard_images(&state, &images).await;
            return Err(e.into());
        }
    };
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Cover images added",
            "vendor": VendorView::from(&vendor),
        })),
    ))
}

async fn toggle_service(
    State(state): State<AppState>,
    VendorSession(principal): VendorSession,
) -> Result<Json<VendorView>, AppError> {
    let vendor = VendorService::new(state.store())
        .toggle_service(principal.vendor_id())
        .await?;
    Ok(Json(VendorView::from(&vendor)))
}

async fn add_food(
    State(state): State<AppState>,
    VendorSession(principal): VendorSession,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    VendorService::new(state.store())
        .profile(principal.vendor_id())
        .await?;

    let upload = Upload::read(multipart).await?;
    let new_food = upload.new_food()?;
    new_food
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let images = upload.save_images(&state).await?;

    let (food, vendor) = match CatalogService::new(state.store())
        .add_food(principal.vendor_id(), new_food, images.clone())
        .await
    {
        Ok(added) => added,
        Err(e) => {
            discard_images(&state, &images).await;
            return Err(e.into());
        }
    };
    Ok(Json(json!({
        "message": "Food added",
        "food": food,
        "vendor": VendorView::from(&vendor),
    })))
}

async fn foods(
    State(state): State<AppState>,
    VendorSession(principal): VendorSession,
) -> Result<impl IntoResponse, AppError> {
    let foods = CatalogService::new(state.store())
        .foods_for_vendor(principal.vendor_id())
        .await?;
    if foods.is_empty() {
        return Err(AppError::NotFound("No food items found".to_owned()));
    }
    Ok(Json(foods))
}

async fn orders(
    State(state): State<AppState>,
    VendorSession(principal): VendorSession,
) -> Result<Json<Vec<OrderView>>, AppError> {
    let orders = OrderService::new(state.store())
        .list_for_vendor(principal.vendor_id())
        .await?;
    if orders.is_empty() {
        return Err(AppError::NotFound("No orders found".to_owned()));
    }
    Ok(Json(orders))
}

async fn order(
    State(state): State<AppState>,
    VendorSession(principal): VendorSession,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderView>, AppError> {
    let order = OrderService::new(state.store())
        .get_for_vendor(principal.vendor_id(), id)
        .await?;
    Ok(Json(order))
}

async fn process_order(
    State(state): State<AppState>,
    VendorSession(principal): VendorSession,
    Path(id): Path<OrderId>,
    JsonBody(update): JsonBody<OrderUpdate>,
) -> Result<Json<OrderView>, AppError> {
    let order = OrderService::new(state.store())
        .process(principal.vendor_id(), id, update)
        .await?;
    Ok(Json(order))
}

async fn offers(
    State(state): State<AppState>,
    VendorSession(principal): VendorSession,
) -> Result<impl IntoResponse, AppError> {
    let offers = OfferService::new(state.store())
        .eligible(Some(principal.vendor_id()))
        .await?;
    if offers.is_empty() {
        return Err(AppError::NotFound("No offers found".to_owned()));
    }
    Ok(Json(offers))
}

async fn add_offer(
    State(state): State<AppState>,
    VendorSession(principal): VendorSession,
    JsonBody(new): JsonBody<NewOffer>,
) -> Result<impl IntoResponse, AppError> {
    let offer = OfferService::new(state.store())
        .add_vendor_offer(principal.vendor_id(), new)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Offer created", "offer": offer })),
    ))
}

async fn edit_offer(
    State(state): State<AppState>,
    VendorSession(principal): VendorSession,
    Path(id): Path<OfferId>,
    JsonBody(patch): JsonBody<OfferPatch>,
) -> Result<impl IntoResponse, AppError> {
    let offer = OfferService::new(state.store())
        .edit_offer(principal.vendor_id(), id, patch)
        .await?;
    Ok(Json(json!({ "message": "Offer updated", "offer": offer })))
}
