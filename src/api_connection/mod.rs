pub mod connection;
pub mod endpoints;

pub use connection::{extract_json_content, ApiConnectionError, CompletionClient, Provider};
