pub mod api_connection;
pub mod cli;
pub mod config;
pub mod errors;
pub mod extraction;
pub mod generation;
pub mod plan;
pub mod presentation;
pub mod store;
