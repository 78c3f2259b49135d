// Infrastructure layer - External dependencies and adapters
pub mod config;
pub mod focus_render;
pub mod http_classifier;
pub mod http_detector;
pub mod http_response;
pub mod json_repository;
pub mod openai_client;
