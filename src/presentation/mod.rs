// Presentation layer - HTTP handlers, routing and request parsing
pub mod app_state;
pub mod handlers;
pub mod router;
pub mod upload;
