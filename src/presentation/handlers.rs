// HTTP request handlers
use crate::application::analysis_service::PlantAnalysis;
use crate::application::diagnosis_service::{DiagnosisRequest, DiagnosisResponse};
use crate::application::growth_log_service::GrowthLog;
use crate::application::growth_service::{GrowthInsight, MonthlyAnalysis};
use crate::application::plant_classifier::ClassifierChoice;
use crate::domain::error::ValidationError;
use crate::domain::growth::{validate_max_periods, PeriodUnit};
use crate::domain::plant::PlantIdentification;
use crate::domain::records::{validate_growth_entry, GrowthRecord};
use crate::infrastructure::http_response::ApiError;
use crate::presentation::app_state::AppState;
use crate::presentation::upload::UploadForm;
use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::sync::Arc;

const DEFAULT_MAX_PERIODS: u32 = 12;

#[derive(Debug, Deserialize)]
pub struct GrowthInsightQuery {
    pub period_unit: Option<String>,
    pub max_periods: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GrowthLogQuery {
    pub plant_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyAnalysisQuery {
    pub plant_name: String,
    pub max_months: Option<String>,
    pub data_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateGrowthRequest {
    pub plant_id: String,
    pub date: String,
    pub height: f64,
}

#[derive(Debug, Serialize)]
pub struct GrowthInsightResponse {
    pub identification: PlantIdentification,
    #[serde(flatten)]
    pub insight: GrowthInsight,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MonthlyAnalysisResponse {
    #[serde(flatten)]
    pub analysis: MonthlyAnalysis,
    pub success: bool,
    pub message: String,
}

/// Optional numeric query parameter, parsed here so bad input gets the
/// same JSON error body as every other validation failure
fn parse_periods(field: &'static str, value: Option<&str>) -> Result<u32, ValidationError> {
    let periods = match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => raw.parse::<u32>().map_err(|_| ValidationError::InvalidField {
            field,
            reason: format!("'{raw}' is not a whole number"),
        })?,
        None => DEFAULT_MAX_PERIODS,
    };
    validate_max_periods(periods)
}

fn file_hash(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Plant care API",
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/api/plant/test",
    }))
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "message": "Plant care API is running",
    }))
}

/// Reports which external models are wired in
pub async fn api_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let detector = state.diagnosis_service.is_available();
    Json(json!({
        "status": if detector { "healthy" } else { "degraded" },
        "models": {
            "disease_model_loaded": detector,
            "llm_enabled": state.advisor.is_enabled(),
        },
        "note": if detector {
            "All services are available"
        } else {
            "Disease detection is disabled until detector.url is configured"
        },
    }))
}

pub async fn plant_test() -> Json<Value> {
    Json(json!({
        "message": "Plant analysis API is running",
        "endpoints": {
            "v1": "/api/plant/analyze (primary classifier)",
            "auto": "/api/plant/analyze-auto (auto-selected classifier)",
            "v2": "/api/plant/analyze-v2 (PlantRecog)",
            "compare": "/api/plant/compare (both classifiers)",
            "growth_insight": "/api/plant/growth-insight",
            "monthly_data_analysis": "/api/plant/monthly-data-analysis",
        },
    }))
}

async fn analyze_with(
    state: &AppState,
    multipart: Multipart,
    choice: ClassifierChoice,
) -> Result<Json<PlantAnalysis>, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let upload = form.take_file()?;
    upload.validate_image(state.settings.server.max_upload_bytes)?;

    let analysis = state.analysis_service.analyze(upload.bytes, choice).await;
    Ok(Json(analysis))
}

pub async fn analyze(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<PlantAnalysis>, ApiError> {
    analyze_with(&state, multipart, ClassifierChoice::Primary).await
}

pub async fn analyze_auto(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<PlantAnalysis>, ApiError> {
    analyze_with(&state, multipart, ClassifierChoice::Auto).await
}

pub async fn analyze_v2(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<PlantAnalysis>, ApiError> {
    analyze_with(&state, multipart, ClassifierChoice::Secondary).await
}

pub async fn compare(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let upload = form.take_file()?;
    upload.validate_image(state.settings.server.max_upload_bytes)?;

    let models = state.classifier_service.compare(upload.bytes).await;
    Ok(Json(json!({
        "success": true,
        "message": "Both models finished their analysis",
        "models": models,
    })))
}

pub async fn growth_insight(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GrowthInsightQuery>,
    multipart: Multipart,
) -> Result<Json<GrowthInsightResponse>, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let upload = form.take_file()?;
    upload.validate_image(state.settings.server.max_upload_bytes)?;

    let unit: PeriodUnit = query.period_unit.as_deref().unwrap_or("month").parse()?;
    let max_periods = parse_periods("max_periods", query.max_periods.as_deref())?;

    let hash = file_hash(&upload.bytes);
    let identification = state
        .classifier_service
        .identify(upload.bytes, ClassifierChoice::Auto)
        .await;
    if identification.confidence < state.settings.classifier.low_confidence_threshold {
        return Err(ApiError::Unprocessable(
            "The plant could not be identified. Please upload a clearer image.".to_string(),
        ));
    }

    let insight = state
        .growth_service
        .growth_insight(&identification, Some(hash), unit, max_periods)
        .await?;

    let message = format!("Growth insight for {} is ready", identification.plant_name);
    Ok(Json(GrowthInsightResponse {
        identification,
        insight,
        success: true,
        message,
    }))
}

pub async fn update_growth(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateGrowthRequest>,
) -> Result<Json<Value>, ApiError> {
    let date = validate_growth_entry(&request.plant_id, &request.date, request.height)?;

    let record = GrowthRecord::new(date, request.height);
    match state
        .growth_log_service
        .record(request.plant_id.trim(), record)
        .await
    {
        Ok(()) => Ok(Json(json!({ "success": true, "msg": "Saved" }))),
        Err(e) => {
            tracing::error!(plant_id = %request.plant_id, error = %e, "Failed to save growth record");
            Ok(Json(json!({ "success": false, "msg": e.to_string() })))
        }
    }
}

pub async fn growth_insight_v2(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GrowthLogQuery>,
) -> Result<Json<Value>, ApiError> {
    let log: Option<GrowthLog> = state.growth_log_service.log(&query.plant_id).await?;
    let body = match log {
        Some(log) => {
            let mut body = serde_json::to_value(log)
                .map_err(|e| ApiError::Internal(format!("Failed to serialize growth log: {}", e)))?;
            body["success"] = Value::Bool(true);
            body
        }
        None => json!({ "success": false, "msg": "No records", "history": [] }),
    };
    Ok(Json(body))
}

pub async fn monthly_data_analysis(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MonthlyAnalysisQuery>,
) -> Result<Json<MonthlyAnalysisResponse>, ApiError> {
    let plant_name = query.plant_name.trim();
    if plant_name.is_empty() {
        return Err(ValidationError::MissingField("plant_name").into());
    }
    let max_months = parse_periods("max_months", query.max_months.as_deref())?;
    let data_id = query.data_id.as_deref().filter(|id| !id.trim().is_empty());

    let analysis = state
        .growth_service
        .monthly_analysis(plant_name, max_months, data_id)
        .await?;
    let message = format!(
        "Monthly data analysis for {} is ready",
        analysis.identification.plant_name
    );
    Ok(Json(MonthlyAnalysisResponse {
        analysis,
        success: true,
        message,
    }))
}

pub async fn detect(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<DiagnosisResponse>, ApiError> {
    let mut form = UploadForm::read(multipart).await?;
    let upload = form.take_file()?;
    let extension = upload.detect_extension()?;
    upload.validate_size(state.settings.server.max_upload_bytes)?;

    let conf_threshold = form
        .float("conf_threshold")?
        .unwrap_or(state.settings.detector.default_conf_threshold);
    if !(0.0..=1.0).contains(&conf_threshold) {
        return Err(ValidationError::InvalidField {
            field: "conf_threshold",
            reason: format!("must be between 0 and 1, got {conf_threshold}"),
        }
        .into());
    }
    let user_notes = form.text("user_notes").map(str::to_string);
    tracing::debug!(
        conf_threshold,
        has_notes = user_notes.is_some(),
        "Disease detection requested"
    );

    let response = state
        .diagnosis_service
        .diagnose(DiagnosisRequest {
            image: upload.bytes,
            extension,
            conf_threshold,
            user_notes,
        })
        .await?;
    Ok(Json(response))
}

pub async fn cleanup(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let report = state.diagnosis_service.cleanup().await?;
    Ok(Json(json!({ "success": true, "deleted": report })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_periods() {
        assert_eq!(parse_periods("max_periods", None), Ok(12));
        assert_eq!(parse_periods("max_periods", Some(" 24 ")), Ok(24));
        assert!(parse_periods("max_periods", Some("0")).is_err());
        assert!(matches!(
            parse_periods("max_periods", Some("ten")),
            Err(ValidationError::InvalidField { field: "max_periods", .. })
        ));
    }

    #[test]
    fn test_file_hash_is_hex_sha256() {
        assert_eq!(
            file_hash(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(file_hash(b"").len(), 64);
    }
}
