// Library exports for the binary and integration tests
pub mod app_state;
pub mod auth;
pub mod browser;
pub mod config;
pub mod handlers;
pub mod server;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use app_state::AppState;
pub use auth::CredentialStore;
pub use browser::{BrowserController, Persistence, SessionState, TransferOrchestrator, View};
pub use config::{Config, GatewayConfig};
pub use storage::{InMemoryGateway, S3Gateway, StorageGateway};
pub use types::{BrowserError, BrowserResult, Credentials};

// Re-export server creation function
pub use server::create_app;
