pub mod goal;
pub mod workflow;

pub use goal::{ClusterSummary, Goal, GoalOutput, PipelineRequest};
pub use workflow::SpectralPipeline;
