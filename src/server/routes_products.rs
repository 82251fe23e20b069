//! Product and captured image API routes.
//!
//! Products are managed here, and `fetch-images` is the action that refreshes
//! a product's captured images from the image service.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use plcimages_common::{Error, ProductId};
use plcimages_db::models::{CapturedImage, Product};
use plcimages_db::pool::get_conn;
use plcimages_db::queries::{captured_images, products};
use serde::{Deserialize, Serialize};

use super::error::AppError;
use super::AppContext;
use crate::sync::SyncOutcome;

/// Create product-related routes.
pub fn product_routes() -> Router<AppContext> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:product_id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/products/:product_id/images", get(list_images))
        .route("/products/:product_id/fetch-images", post(fetch_images))
}

// ============================================================================
// Request / response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub part_number: Option<String>,
}

/// Body of `PATCH /products/{id}`; a null part number clears it.
#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub part_number: Option<String>,
}

/// A stored captured image with its display field.
#[derive(Debug, Serialize)]
pub struct CapturedImageResponse {
    #[serde(flatten)]
    pub image: CapturedImage,
    pub preview: String,
}

impl From<CapturedImage> for CapturedImageResponse {
    fn from(image: CapturedImage) -> Self {
        let preview = image.preview().to_string();
        Self { image, preview }
    }
}

#[derive(Debug, Serialize)]
pub struct FetchImagesResponse {
    pub outcome: SyncOutcome,
    pub images: Vec<CapturedImageResponse>,
}

fn parse_product_id(raw: &str) -> Result<ProductId, AppError> {
    raw.parse::<ProductId>()
        .map_err(|_| AppError(Error::invalid_input(format!("invalid product ID: {}", raw))))
}

fn not_found(id: ProductId) -> AppError {
    AppError(Error::not_found(format!("product {}", id)))
}

fn stored_images(ctx: &AppContext, id: ProductId) -> Result<Vec<CapturedImageResponse>, AppError> {
    let conn = get_conn(&ctx.db)?;
    let images = captured_images::list_for_product(&conn, id)?;
    Ok(images.into_iter().map(CapturedImageResponse::from).collect())
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_products(State(ctx): State<AppContext>) -> Result<Json<Vec<Product>>, AppError> {
    let conn = get_conn(&ctx.db)?;
    Ok(Json(products::list_products(&conn)?))
}

async fn create_product(
    State(ctx): State<AppContext>,
    Json(request): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, AppError> {
    let conn = get_conn(&ctx.db)?;
    let product = products::create_product(&conn, &request.name, request.part_number.as_deref())?;

    tracing::info!(product_id = %product.id, name = %product.name, "Created product");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(ctx): State<AppContext>,
    Path(product_id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let id = parse_product_id(&product_id)?;
    let conn = get_conn(&ctx.db)?;

    products::get_product(&conn, id)?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

async fn update_product(
    State(ctx): State<AppContext>,
    Path(product_id): Path<String>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<Product>, AppError> {
    let id = parse_product_id(&product_id)?;
    let conn = get_conn(&ctx.db)?;

    if !products::set_part_number(&conn, id, request.part_number.as_deref())? {
        return Err(not_found(id));
    }

    products::get_product(&conn, id)?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

async fn delete_product(
    State(ctx): State<AppContext>,
    Path(product_id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_product_id(&product_id)?;
    let conn = get_conn(&ctx.db)?;

    if products::delete_product(&conn, id)? {
        tracing::info!(product_id = %id, "Deleted product");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// List a product's captured images, newest capture first.
async fn list_images(
    State(ctx): State<AppContext>,
    Path(product_id): Path<String>,
) -> Result<Json<Vec<CapturedImageResponse>>, AppError> {
    let id = parse_product_id(&product_id)?;
    {
        let conn = get_conn(&ctx.db)?;
        if products::get_product(&conn, id)?.is_none() {
            return Err(not_found(id));
        }
    }

    Ok(Json(stored_images(&ctx, id)?))
}

/// Refresh a product's captured images from the image service.
///
/// Always answers 200 for an existing product: the outcome tells whether the
/// refresh worked, and `images` is what is stored afterwards.
async fn fetch_images(
    State(ctx): State<AppContext>,
    Path(product_id): Path<String>,
) -> Result<Json<FetchImagesResponse>, AppError> {
    let id = parse_product_id(&product_id)?;
    let outcome = ctx.sync.sync_product_by_id(id).await?;
    let images = stored_images(&ctx, id)?;

    Ok(Json(FetchImagesResponse { outcome, images }))
}
