//! Per-invocation adapter: each function receives one HTTP-shaped event and
//! returns one response, sharing the request logic of `vision-service`.

pub mod event;
pub mod handlers;
pub mod runtime;

pub use event::{FunctionEvent, FunctionResponse};
