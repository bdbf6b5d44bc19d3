pub mod api;
pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod feed;
pub mod models;
pub mod realtime;
pub mod session;

// Re-export commonly used items for the binary / tests
pub use controller::FeedController;
pub use error::ClientError;
pub use feed::{FeedEvent, FeedState};
pub use models::{Comment, FeedPage, Reply, SortKey};
pub use session::{Session, SessionStore};
