pub mod api;
pub mod config;
pub mod error;
pub mod geo;
pub mod geocoding;
pub mod location;
pub mod models;
pub mod observability;
pub mod state;
pub mod tracking;
