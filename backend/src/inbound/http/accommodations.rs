//! Accommodation catalogue handler.
//!
//! ```text
//! GET /api/v1/accommodations
//! ```

use actix_web::{HttpResponse, get, web};

use crate::inbound::http::ApiResult;
use crate::inbound::http::registrations_dto::AccommodationResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// List accommodation options ordered by name.
#[utoipa::path(
    get,
    path = "/api/v1/accommodations",
    responses(
        (status = 200, description = "Accommodation options", body = [AccommodationResponse]),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["registrations"],
    operation_id = "listAccommodations",
    security([])
)]
#[get("/accommodations")]
pub async fn list_accommodations(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    let options = state.registration_query.accommodations().await?;
    let body: Vec<AccommodationResponse> = options
        .into_iter()
        .map(AccommodationResponse::from)
        .collect();
    Ok(HttpResponse::Ok()
        .insert_header(("Cache-Control", "public, max-age=300"))
        .json(body))
}
