pub mod config;
pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{FloorplanError, Result};
pub use pipeline::{AnalyzeFloorplan, FloorplanAnalysis, FloorplanSample};
