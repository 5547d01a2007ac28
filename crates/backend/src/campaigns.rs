// =============================================================================
// AdPace Backend - Campaigns API
// =============================================================================
// CRUD endpoints for the campaign grid. The optimization pass itself lives in
// optimize.rs; these handlers never touch the output fields.
// =============================================================================

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::db::{CampaignInput, CampaignRow};
use crate::error::ApiError;
use crate::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    /// Client-side ids prefixed "new_" are grid placeholders; the server
    /// assigns a real id for those (and when no id is sent at all).
    pub id: Option<String>,
    #[serde(flatten)]
    pub input: CampaignInput,
}

#[derive(Debug, Deserialize)]
pub struct DeleteCampaignsQuery {
    pub all: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// All campaigns in upload order.
pub async fn get_campaigns(
    State(state): State<AppState>,
) -> Result<Json<Vec<CampaignRow>>, ApiError> {
    let campaigns = state.db.all_campaigns().await?;
    Ok(Json(campaigns))
}

/// Create a new campaign (manual grid row).
pub async fn create_campaign(
    State(state): State<AppState>,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<Json<CampaignRow>, ApiError> {
    if req.input.campaign_name.trim().is_empty() {
        return Err(ApiError::BadRequest("Campaign name is required".into()));
    }

    let id = match req.id {
        Some(id) if !id.is_empty() && !id.starts_with("new_") => id,
        _ => uuid::Uuid::new_v4().to_string(),
    };

    let campaign = state.db.create_campaign(&id, &req.input).await?;
    Ok(Json(campaign))
}

/// Update a single campaign (manual edit).
pub async fn update_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CampaignInput>,
) -> Result<Json<CampaignRow>, ApiError> {
    let updated = state
        .db
        .update_campaign(&id, &input)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Campaign {id} not found")))?;
    Ok(Json(updated))
}

/// Delete a single campaign.
pub async fn delete_campaign(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if !state.db.delete_campaign(&id).await? {
        return Err(ApiError::NotFound(format!("Campaign {id} not found")));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Delete every campaign (requires `?all=true`).
pub async fn delete_campaigns(
    State(state): State<AppState>,
    Query(query): Query<DeleteCampaignsQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if query.all.as_deref() != Some("true") {
        return Err(ApiError::BadRequest("Pass all=true to delete every campaign".into()));
    }
    let count = state.db.delete_all().await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "count": count,
    })))
}
