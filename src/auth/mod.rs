mod middleware;
mod store;

pub use middleware::token_middleware;
pub use store::CredentialStore;
