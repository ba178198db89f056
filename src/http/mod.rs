//! HTTP surface: health, info and the WebSocket endpoint

pub mod routes;

pub use routes::build_router;
