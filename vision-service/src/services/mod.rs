pub mod gateway;
pub mod image_payload;
pub mod metrics;
pub mod providers;
pub mod store;

pub use gateway::AnalysisGateway;
pub use image_payload::ImagePayload;
pub use store::{AnalysisStore, Persistence};
