// Application layer - Use cases and the ports they depend on
pub mod advisor;
pub mod analysis_service;
pub mod diagnosis_service;
pub mod disease_detector;
pub mod growth_log_service;
pub mod growth_service;
pub mod plant_classifier;
pub mod plant_repository;
pub mod text_generator;
pub mod upload_store;
pub mod worker_pool;
