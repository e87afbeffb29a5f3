//! HTTP server for MealHub.
//!
//! Exposes meal and restaurant registration and listing, plus image upload,
//! as JSON endpoints over a shared [`MealHub`](mealhub_sdk::MealHub).

pub mod config;
pub mod error;
pub mod handler;
pub mod rejections;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{status_for, RejectedRequest, ServerError, ServerResult};
pub use handler::AppState;
pub use rejections::{InMemoryRejectionLog, NoOpRejectionLog, Rejection, RejectionLog};
pub use server::MealHubServer;
