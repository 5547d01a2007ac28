// =============================================================================
// AdPace Backend - Spreadsheet Import/Export
// =============================================================================
// CSV in, CSV out, using the legacy spreadsheet column contract. Import is
// tolerant of formatted numbers ("$1,234.50" parses as 1234.5, junk as 0) and
// skips rows without a campaign name or label. Export appends the two output
// columns of the last optimization pass.
// =============================================================================

use axum::{
    extract::{Multipart, State},
    http::header,
    response::IntoResponse,
    Json,
};
use csv::StringRecord;

use crate::db::CampaignInput;
use crate::error::ApiError;
use crate::AppState;

// =============================================================================
// Numeric Parsing
// =============================================================================

/// Parse a spreadsheet cell as a number, stripping currency symbols, commas
/// and other formatting. Unparsable cells become 0.
fn parse_number(value: &str) -> f64 {
    let clean: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    if clean.is_empty() {
        return 0.0;
    }
    clean.parse().unwrap_or(0.0)
}

/// Like [`parse_number`] but truncated to a whole amount, matching the
/// integer columns of the legacy sheet.
fn parse_integer(value: &str) -> f64 {
    parse_number(value).floor()
}

// =============================================================================
// CSV Parsing
// =============================================================================

fn column<'r>(headers: &StringRecord, record: &'r StringRecord, name: &str) -> &'r str {
    headers
        .iter()
        .position(|h| h == name)
        .and_then(|i| record.get(i))
        .unwrap_or("")
}

/// Parse an uploaded CSV into campaign inputs, in file order. Rows missing a
/// campaign name or label are skipped, as in the legacy importer.
fn parse_csv(data: &[u8]) -> Result<Vec<CampaignInput>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);
    let headers = reader.headers()?.clone();

    let mut inputs = Vec::new();
    for record in reader.records() {
        let record = record?;
        let campaign_name = column(&headers, &record, "Campaign name");
        let label = column(&headers, &record, "Labels on Campaign");
        if campaign_name.is_empty() || label.is_empty() {
            continue;
        }

        // The percentage column header changed across sheet versions
        let mtd = {
            let plain = column(&headers, &record, "MTD Cluster Spend");
            if plain.is_empty() {
                column(&headers, &record, "MTD Cluster Spend (%)")
            } else {
                plain
            }
        };

        inputs.push(CampaignInput {
            campaign_name: campaign_name.to_string(),
            label: label.to_string(),
            camp_budget: parse_integer(column(&headers, &record, "Camp. budget")),
            camp_cost: parse_integer(column(&headers, &record, "Camp. cost")),
            camp_3d_cost: parse_integer(column(&headers, &record, "Camp. 3D cost")),
            camp_conv: parse_integer(column(&headers, &record, "Camp. conv.")),
            camp_cpa: parse_number(column(&headers, &record, "Camp. CPA")),
            camp_tcpa: parse_number(column(&headers, &record, "Camp. tCPA")),
            mtd_cluster_spend_percent: parse_number(mtd),
            label_budget: parse_integer(column(&headers, &record, "Label budget")),
            label_cost: parse_integer(column(&headers, &record, "Label cost")),
            label_3d_cost: parse_integer(column(&headers, &record, "Label 3D cost")),
            label_conv: parse_integer(column(&headers, &record, "Label conv.")),
            label_remaining_budget: parse_number(column(
                &headers,
                &record,
                "Label remaining budget",
            )),
            label_kpi_value: parse_number(column(&headers, &record, "Label KPI value")),
            label_cpa: parse_number(column(&headers, &record, "Label CPA")),
        });
    }
    Ok(inputs)
}

// =============================================================================
// Handlers
// =============================================================================

/// Import a CSV upload, upserting every valid row.
pub async fn import_campaigns(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {e}")))?
    {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Invalid upload: {e}")))?;
            data = Some(bytes);
            break;
        }
    }
    let data = data.ok_or_else(|| ApiError::BadRequest("No file uploaded".into()))?;

    let inputs = parse_csv(&data)?;
    tracing::info!(rows = inputs.len(), "parsed campaign upload");

    let count = state.db.import_campaigns(&inputs).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "count": count,
    })))
}

/// Export every campaign as a CSV attachment, including the optimization
/// output columns.
pub async fn export_campaigns(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let campaigns = state.db.all_campaigns().await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "Campaign Name",
            "Labels on Campaign",
            "Camp. Budget",
            "Camp. Cost (MTD)",
            "Camp. 3D Cost",
            "Camp. Conv",
            "Camp. CPA",
            "Camp. tCPA",
            "MTD Cluster Spend (%)",
            "Label Budget",
            "Label Cost (MTD)",
            "Label 3D Cost",
            "Label Conv",
            "Label Remaining Budget (Daily)",
            "Label KPI Value",
            "Label CPA",
            "New Daily Budget",
            "New Target CPA",
        ])?;

    for c in &campaigns {
        writer.write_record([
            c.campaign_name.clone(),
            c.label.clone(),
            c.camp_budget.to_string(),
            c.camp_cost.to_string(),
            c.camp_3d_cost.to_string(),
            c.camp_conv.to_string(),
            c.camp_cpa.to_string(),
            c.camp_tcpa.to_string(),
            c.mtd_cluster_spend_percent.to_string(),
            c.label_budget.to_string(),
            c.label_cost.to_string(),
            c.label_3d_cost.to_string(),
            c.label_conv.to_string(),
            c.label_remaining_budget.to_string(),
            c.label_kpi_value.to_string(),
            c.label_cpa.to_string(),
            c.new_daily_budget.unwrap_or(0.0).to_string(),
            c.new_target_cpa.unwrap_or(0.0).to_string(),
        ])?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("CSV write failed: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"optimized_campaigns.csv\"",
            ),
        ],
        body,
    ))
}
