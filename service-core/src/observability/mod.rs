pub mod logging;

pub use logging::{init_stderr_tracing, init_tracing};
