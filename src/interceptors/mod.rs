//! Built-in interceptors.
//!
//! - [`LoggingInterceptor`]: structured `tracing` events for every stage
//! - [`HeaderInterceptor`]: static headers on every request
//! - [`TimingInterceptor`]: per-operation latency and error counts
//! - [`before_send_fn`], [`after_receive_fn`], [`on_error_fn`]: closure adapters

mod closures;
mod headers;
mod logging;
mod timing;

pub use closures::{
    AfterReceiveFn, BeforeSendFn, OnErrorFn, after_receive_fn, before_send_fn, on_error_fn,
};
pub use headers::HeaderInterceptor;
pub use logging::LoggingInterceptor;
pub use timing::{OperationTiming, STARTED_AT_KEY, TimingInterceptor, TimingStats};
