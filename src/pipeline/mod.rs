//! Interceptor capabilities and the request orchestrator.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ RequestPipeline::execute(ctx, executor)                      │
//! │                                                              │
//! │   BeforeSend 1 ──▶ BeforeSend 2 ──▶ ... ──▶ BeforeSend n     │
//! │                                                  │           │
//! │                                                  ▼           │
//! │                                       executor(ctx') once    │
//! │                                                  │           │
//! │   AfterReceive 1 ◀── AfterReceive 2 ◀── ... ◀────┘           │
//! │         │                                                    │
//! │         ▼                                                    │
//! │      Ok(T)                                                   │
//! │                                                              │
//! │   any Err ──▶ OnError 1, 2, ..., n (original ctx) ──▶ Err    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Before-send interceptors run in registration order and after-receive
//! interceptors in reverse, so the interceptor that touched the request last
//! sees the raw response first.

mod interceptor;
mod request_pipeline;
mod response;

pub use interceptor::{AfterReceive, BeforeSend, Interceptor, OnError};
pub use request_pipeline::{PipelineBuilder, RequestPipeline};
pub use response::Response;
