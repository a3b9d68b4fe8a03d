//! Handlers scoped to the hotel addressed by the request host.

use axum::Json;
use hotelier_core::billing::HotelPolicy;
use hotelier_core::types::Timestamp;
use serde::Serialize;

use crate::error::AppResult;
use crate::middleware::tenant::CurrentTenant;
use crate::response::DataResponse;

/// Public view of a hotel and its billing policy.
#[derive(Debug, Serialize)]
pub struct HotelResponse {
    pub subdomain: String,
    pub name: String,
    pub policy: HotelPolicy,
    /// Logical database holding this hotel's data.
    pub database: String,
    pub connected_since: Timestamp,
}

/// GET /api/v1/hotel
pub async fn get_hotel(
    CurrentTenant(resolved): CurrentTenant,
) -> AppResult<Json<DataResponse<HotelResponse>>> {
    let tenant = &resolved.tenant;
    let policy = tenant.policy()?;

    Ok(Json(DataResponse {
        data: HotelResponse {
            subdomain: tenant.subdomain.clone(),
            name: tenant.name.clone(),
            policy,
            database: resolved.handle.database().to_string(),
            connected_since: resolved.handle.opened_at(),
        },
    }))
}
