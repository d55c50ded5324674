pub mod config;
mod orchestrator;
mod types;

pub use config::{DeblurConfig, OutputConfig};
pub use orchestrator::{run_pipeline, DepthDeblur};
pub use types::{DeblurOutput, NoOpReporter, PipelineStage, ProgressReporter};
