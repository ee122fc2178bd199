

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use server::{build_pipeline, build_router, run_server};
