pub mod config;
pub mod error;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod rate_limit_config;
pub mod rate_limiter;
pub mod response;
pub mod server;
pub mod store;
pub mod validation;

pub use config::Config;
pub use error::{ApiError, ApiResult, ParseError, StoreError, StoreResult};
pub use rate_limit_config::RateLimitConfig;
pub use rate_limiter::{FixedWindowRateLimiter, RateLimiter};
pub use response::ErrorResponse;
pub use server::create_app;
pub use store::{ProductStore, Storage};
