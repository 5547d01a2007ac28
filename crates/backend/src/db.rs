// =============================================================================
// AdPace Backend - Database Layer
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use adpace_engine::{Campaign, CampaignUpdate};

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

/// Campaign model. Campaign-level and label-level metrics mirror the
/// spreadsheet columns; `new_daily_budget` / `new_target_cpa` are the two
/// output fields written by an optimization pass.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CampaignRow {
    pub id: String,
    pub campaign_name: String,
    pub label: String,
    pub camp_budget: f64,
    pub camp_cost: f64,
    pub camp_3d_cost: f64,
    pub camp_conv: f64,
    pub camp_cpa: f64,
    pub camp_tcpa: f64,
    pub mtd_cluster_spend_percent: f64,
    pub label_budget: f64,
    pub label_cost: f64,
    pub label_3d_cost: f64,
    pub label_conv: f64,
    pub label_remaining_budget: f64,
    pub label_kpi_value: f64,
    pub label_cpa: f64,
    pub row_order: i64,
    pub new_daily_budget: Option<f64>,
    pub new_target_cpa: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable campaign fields, shared by create, update and import.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CampaignInput {
    pub campaign_name: String,
    pub label: String,
    #[serde(default)]
    pub camp_budget: f64,
    #[serde(default)]
    pub camp_cost: f64,
    #[serde(default)]
    pub camp_3d_cost: f64,
    #[serde(default)]
    pub camp_conv: f64,
    #[serde(default)]
    pub camp_cpa: f64,
    #[serde(default)]
    pub camp_tcpa: f64,
    #[serde(default)]
    pub mtd_cluster_spend_percent: f64,
    #[serde(default)]
    pub label_budget: f64,
    #[serde(default)]
    pub label_cost: f64,
    #[serde(default)]
    pub label_3d_cost: f64,
    #[serde(default)]
    pub label_conv: f64,
    #[serde(default)]
    pub label_remaining_budget: f64,
    #[serde(default)]
    pub label_kpi_value: f64,
    #[serde(default)]
    pub label_cpa: f64,
}

impl CampaignRow {
    /// The engine's view of this record.
    pub fn as_snapshot(&self) -> Campaign {
        Campaign {
            id: self.id.clone(),
            name: self.campaign_name.clone(),
            label: self.label.clone(),
            budget: self.camp_budget,
            cost: self.camp_cost,
            cost_3d: self.camp_3d_cost,
            conversions: self.camp_conv,
            cpa: self.camp_cpa,
            tcpa: self.camp_tcpa,
            label_budget: self.label_budget,
            label_remaining_budget: self.label_remaining_budget,
            label_kpi: self.label_kpi_value,
        }
    }
}

impl Database {
    /// Create a new database connection pool.
    pub async fn new(url: &str) -> Result<Self, sqlx::Error> {
        // Add create_if_missing option for SQLite
        let url_with_options = if url.starts_with("sqlite:") && !url.contains('?') {
            format!("{}?mode=rwc", url)
        } else if url.starts_with("sqlite:") && !url.contains("mode=") {
            format!("{}&mode=rwc", url)
        } else {
            url.to_string()
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url_with_options)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS campaigns (
                id TEXT PRIMARY KEY,
                campaign_name TEXT NOT NULL,
                label TEXT NOT NULL,
                camp_budget REAL NOT NULL DEFAULT 0,
                camp_cost REAL NOT NULL DEFAULT 0,
                camp_3d_cost REAL NOT NULL DEFAULT 0,
                camp_conv REAL NOT NULL DEFAULT 0,
                camp_cpa REAL NOT NULL DEFAULT 0,
                camp_tcpa REAL NOT NULL DEFAULT 0,
                mtd_cluster_spend_percent REAL NOT NULL DEFAULT 0,
                label_budget REAL NOT NULL DEFAULT 0,
                label_cost REAL NOT NULL DEFAULT 0,
                label_3d_cost REAL NOT NULL DEFAULT 0,
                label_conv REAL NOT NULL DEFAULT 0,
                label_remaining_budget REAL NOT NULL DEFAULT 0,
                label_kpi_value REAL NOT NULL DEFAULT 0,
                label_cpa REAL NOT NULL DEFAULT 0,
                row_order INTEGER NOT NULL DEFAULT 0,
                new_daily_budget REAL,
                new_target_cpa REAL,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(campaign_name, label)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_campaigns_label ON campaigns(label)")
            .execute(&self.pool)
            .await;
        let _ = sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_campaigns_row_order ON campaigns(row_order)",
        )
        .execute(&self.pool)
        .await;

        tracing::info!("Database migrations complete");
        Ok(())
    }

    /// All campaigns in upload order.
    pub async fn all_campaigns(&self) -> Result<Vec<CampaignRow>, sqlx::Error> {
        sqlx::query_as::<_, CampaignRow>("SELECT * FROM campaigns ORDER BY row_order ASC")
            .fetch_all(&self.pool)
            .await
    }

    /// Find campaign by ID.
    pub async fn find_campaign(&self, id: &str) -> Result<Option<CampaignRow>, sqlx::Error> {
        sqlx::query_as::<_, CampaignRow>("SELECT * FROM campaigns WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Create a new campaign at the end of the current row order.
    pub async fn create_campaign(
        &self,
        id: &str,
        input: &CampaignInput,
    ) -> Result<CampaignRow, sqlx::Error> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO campaigns (
                id, campaign_name, label,
                camp_budget, camp_cost, camp_3d_cost, camp_conv, camp_cpa, camp_tcpa,
                mtd_cluster_spend_percent,
                label_budget, label_cost, label_3d_cost, label_conv,
                label_remaining_budget, label_kpi_value, label_cpa,
                row_order, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
                (SELECT COALESCE(MAX(row_order) + 1, 0) FROM campaigns), ?, ?)
            "#,
        )
        .bind(id)
        .bind(&input.campaign_name)
        .bind(&input.label)
        .bind(input.camp_budget)
        .bind(input.camp_cost)
        .bind(input.camp_3d_cost)
        .bind(input.camp_conv)
        .bind(input.camp_cpa)
        .bind(input.camp_tcpa)
        .bind(input.mtd_cluster_spend_percent)
        .bind(input.label_budget)
        .bind(input.label_cost)
        .bind(input.label_3d_cost)
        .bind(input.label_conv)
        .bind(input.label_remaining_budget)
        .bind(input.label_kpi_value)
        .bind(input.label_cpa)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        self.find_campaign(id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Update all editable fields of a campaign (manual grid edit).
    pub async fn update_campaign(
        &self,
        id: &str,
        input: &CampaignInput,
    ) -> Result<Option<CampaignRow>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE campaigns SET
                campaign_name = ?, label = ?,
                camp_budget = ?, camp_cost = ?, camp_3d_cost = ?, camp_conv = ?,
                camp_cpa = ?, camp_tcpa = ?, mtd_cluster_spend_percent = ?,
                label_budget = ?, label_cost = ?, label_3d_cost = ?, label_conv = ?,
                label_remaining_budget = ?, label_kpi_value = ?, label_cpa = ?,
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(&input.campaign_name)
        .bind(&input.label)
        .bind(input.camp_budget)
        .bind(input.camp_cost)
        .bind(input.camp_3d_cost)
        .bind(input.camp_conv)
        .bind(input.camp_cpa)
        .bind(input.camp_tcpa)
        .bind(input.mtd_cluster_spend_percent)
        .bind(input.label_budget)
        .bind(input.label_cost)
        .bind(input.label_3d_cost)
        .bind(input.label_conv)
        .bind(input.label_remaining_budget)
        .bind(input.label_kpi_value)
        .bind(input.label_cpa)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_campaign(id).await
    }

    /// Delete one campaign. Returns whether a row was removed.
    pub async fn delete_campaign(&self, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every campaign.
    pub async fn delete_all(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM campaigns")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Bulk import from a spreadsheet: upsert keyed on (campaign_name, label)
    /// inside one transaction, preserving file order via row_order.
    pub async fn import_campaigns(&self, inputs: &[CampaignInput]) -> Result<usize, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().to_rfc3339();

        for (row_order, input) in inputs.iter().enumerate() {
            let id = uuid::Uuid::new_v4().to_string();
            sqlx::query(
                r#"
                INSERT INTO campaigns (
                    id, campaign_name, label,
                    camp_budget, camp_cost, camp_3d_cost, camp_conv, camp_cpa, camp_tcpa,
                    mtd_cluster_spend_percent,
                    label_budget, label_cost, label_3d_cost, label_conv,
                    label_remaining_budget, label_kpi_value, label_cpa,
                    row_order, created_at, updated_at
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(campaign_name, label) DO UPDATE SET
                    camp_budget = excluded.camp_budget,
                    camp_cost = excluded.camp_cost,
                    camp_3d_cost = excluded.camp_3d_cost,
                    camp_conv = excluded.camp_conv,
                    camp_cpa = excluded.camp_cpa,
                    camp_tcpa = excluded.camp_tcpa,
                    mtd_cluster_spend_percent = excluded.mtd_cluster_spend_percent,
                    label_budget = excluded.label_budget,
                    label_cost = excluded.label_cost,
                    label_3d_cost = excluded.label_3d_cost,
                    label_conv = excluded.label_conv,
                    label_remaining_budget = excluded.label_remaining_budget,
                    label_kpi_value = excluded.label_kpi_value,
                    label_cpa = excluded.label_cpa,
                    row_order = excluded.row_order,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(&id)
            .bind(&input.campaign_name)
            .bind(&input.label)
            .bind(input.camp_budget)
            .bind(input.camp_cost)
            .bind(input.camp_3d_cost)
            .bind(input.camp_conv)
            .bind(input.camp_cpa)
            .bind(input.camp_tcpa)
            .bind(input.mtd_cluster_spend_percent)
            .bind(input.label_budget)
            .bind(input.label_cost)
            .bind(input.label_3d_cost)
            .bind(input.label_conv)
            .bind(input.label_remaining_budget)
            .bind(input.label_kpi_value)
            .bind(input.label_cpa)
            .bind(row_order as i64)
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(inputs.len())
    }

    /// Write back one optimization pass as a single all-or-nothing batch. A
    /// failure rolls the whole pass back so a concurrent reader never sees a
    /// partially-updated group.
    pub async fn apply_updates(&self, updates: &[CampaignUpdate]) -> Result<usize, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for update in updates {
            sqlx::query(
                r#"
                UPDATE campaigns
                SET new_daily_budget = ?, new_target_cpa = ?, updated_at = datetime('now')
                WHERE id = ?
                "#,
            )
            .bind(update.new_daily_budget)
            .bind(update.new_target_cpa)
            .bind(&update.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(updates.len())
    }
}
