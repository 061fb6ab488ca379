pub mod client;
pub mod client_config;
pub mod models;

pub use client::{OllamaClient, Transport, TransportFuture};
pub use client_config::{ClientConfig, DEFAULT_BASE_URL};
pub use models::*;
