use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

// Database entity models
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Athlete {
    pub id: i64,
    pub name: String,
    #[sqlx(rename = "bodyWeight")]
    pub body_weight: Option<f64>,
    pub squat: Option<f64>,
    pub bench: Option<f64>,
    pub deadlift: Option<f64>,
    pub total: Option<f64>,
    pub ohp: Option<f64>,
    #[sqlx(rename = "inclineBench")]
    pub incline_bench: Option<f64>,
    pub rdl: Option<f64>,
    #[sqlx(rename = "revBandBench")]
    pub rev_band_bench: Option<f64>,
    #[sqlx(rename = "revBandSquat")]
    pub rev_band_squat: Option<f64>,
    #[sqlx(rename = "revBandDl")]
    pub rev_band_dl: Option<f64>,
    #[sqlx(rename = "slingshotBench")]
    pub slingshot_bench: Option<f64>,
    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}
