//! Bybit API client module
//!
//! External collaborator that supplies the raw daily price series.

pub mod bybit;
pub mod error;

pub use bybit::BybitClient;
pub use error::{ApiError, ApiResult};
