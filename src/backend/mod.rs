pub mod client;
pub mod error;
pub mod tmdb;
pub mod types;

pub use client::BackendClient;
pub use error::BackendError;
pub use tmdb::TmdbClient;
