pub mod client;
pub mod dashboard;
pub mod display;
mod error;
pub mod settings;
pub mod worker;

pub use error::{Error, Result, RetryPolicy, is_rate_limited, retry_when, rpc_with_retry};
