// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{sync::Arc, time::Duration};
use tracing_subscriber::EnvFilter;

use crate::application::advisor::PlantAdvisor;
use crate::application::analysis_service::AnalysisService;
use crate::application::diagnosis_service::DiagnosisService;
use crate::application::disease_detector::DiseaseDetector;
use crate::application::growth_log_service::GrowthLogService;
use crate::application::growth_service::GrowthService;
use crate::application::plant_classifier::{ClassifierService, PlantClassifier};
use crate::application::plant_repository::PlantRepository;
use crate::application::text_generator::{LlmRenderer, TextGenerator};
use crate::application::upload_store::UploadStore;
use crate::application::worker_pool::WorkerPool;
use crate::infrastructure::config::{load_settings, LlmSettings};
use crate::infrastructure::http_classifier::{ModelServerClassifier, PlantRecogClassifier};
use crate::infrastructure::http_detector::HttpDetector;
use crate::infrastructure::json_repository::JsonFileRepository;
use crate::infrastructure::openai_client::OpenAiClient;
use crate::presentation::app_state::AppState;
use crate::presentation::router::build_router;

fn build_advisor(llm: &LlmSettings) -> anyhow::Result<PlantAdvisor> {
    if !llm.is_usable() {
        tracing::warn!("LLM disabled or no API key configured, using template text only");
        return Ok(PlantAdvisor::new(
            LlmRenderer::disabled(),
            LlmRenderer::disabled(),
            llm.response_language.clone(),
        ));
    }

    let api_key = llm.api_key.clone().unwrap_or_default();
    let client: Arc<dyn TextGenerator> = Arc::new(OpenAiClient::new(
        &llm.base_url,
        api_key,
        llm.model.clone(),
        Duration::from_secs(llm.advice_timeout_secs),
    )?);
    tracing::info!(model = %llm.model, "LLM advisor enabled");

    let quick = LlmRenderer::new(client.clone(), Duration::from_secs(llm.timeout_secs))
        .with_sampling(llm.max_tokens, llm.temperature);
    let thorough = LlmRenderer::new(client, Duration::from_secs(llm.advice_timeout_secs))
        .with_sampling(llm.max_tokens, llm.temperature);
    Ok(PlantAdvisor::new(quick, thorough, llm.response_language.clone()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,plant_care=debug")),
        )
        .init();

    // Load configuration
    let settings = load_settings()?;

    // Create adapters (infrastructure layer)
    let advisor = build_advisor(&settings.llm)?;

    let classifier_timeout = Duration::from_secs(settings.classifier.request_timeout_secs);
    let primary: Arc<dyn PlantClassifier> = Arc::new(ModelServerClassifier::new(
        settings.classifier.primary_url.clone(),
        classifier_timeout,
    )?);
    let secondary: Arc<dyn PlantClassifier> = Arc::new(PlantRecogClassifier::new(
        settings.classifier.secondary_url.clone(),
        classifier_timeout,
    )?);

    let detector: Option<Arc<dyn DiseaseDetector>> = if settings.detector.is_configured() {
        Some(Arc::new(HttpDetector::new(
            settings.detector.url.clone(),
            Duration::from_secs(settings.detector.request_timeout_secs),
        )?))
    } else {
        tracing::warn!("No disease detector configured, /api/detect will answer 503");
        None
    };

    let repository: Arc<dyn PlantRepository> =
        Arc::new(JsonFileRepository::new(&settings.storage.data_dir));
    let pool = WorkerPool::new(settings.server.worker_threads);
    let uploads = UploadStore::new(&settings.server.upload_dir, &settings.server.results_dir);

    // Create services (application layer)
    let classifier_service = ClassifierService::new(
        primary,
        secondary,
        settings.classifier.auto_select_threshold,
        advisor.clone(),
        settings.classifier.translate_names,
    );
    let analysis_service = AnalysisService::new(
        classifier_service.clone(),
        advisor.clone(),
        pool.clone(),
        settings.classifier.low_confidence_threshold,
    );
    let growth_service = GrowthService::new(
        pool.clone(),
        advisor.clone(),
        repository.clone(),
        settings.llm.per_period_analysis,
    );
    let growth_log_service = GrowthLogService::new(repository);
    let diagnosis_service = DiagnosisService::new(detector, advisor.clone(), pool, uploads);

    // Create application state
    let addr = settings.server.bind_addr();
    let state = Arc::new(AppState {
        settings,
        advisor,
        classifier_service,
        analysis_service,
        growth_service,
        growth_log_service,
        diagnosis_service,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Starting plant-care service");

    axum::serve(listener, router).await?;

    Ok(())
}
