// =============================================================================
// AdPace Backend - Optimization Trigger
// =============================================================================
// POST /api/optimize runs one reallocation pass over the full campaign
// snapshot and persists every (new_daily_budget, new_target_cpa) pair as a
// single transaction. A failed write-back leaves nothing applied; rerunning
// the pass on the same snapshot yields the same result.
// =============================================================================

use axum::{extract::State, Json};

use adpace_engine::{run_optimization as run_pass, Campaign};

use crate::error::ApiError;
use crate::AppState;

/// Run the engine over the current snapshot and write the results back.
pub async fn run_optimization(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rows = state.db.all_campaigns().await?;
    let snapshot: Vec<Campaign> = rows.iter().map(|r| r.as_snapshot()).collect();

    let outcome = run_pass(&snapshot, &state.config.engine);

    for group in &outcome.groups {
        tracing::info!(
            label = %group.label,
            campaigns = group.campaigns,
            target = group.target_daily_spend,
            "optimized group"
        );
    }

    let count = state.db.apply_updates(&outcome.updates).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "count": count,
    })))
}
