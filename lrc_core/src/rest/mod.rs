pub mod api_path;
pub mod auth;
pub mod payload;
pub mod session;

pub use auth::{AuthArtifact, AuthStrategy};
pub use session::{ApiResponse, Session};
