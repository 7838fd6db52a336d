pub mod config;
pub mod metrics;
pub mod project;
pub mod schedule;
pub mod scoring;

pub use config::{Config, ScanConfig};
pub use metrics::{
    group_chains, ResilienceScore, Scan, ScanMetrics, ScanStatus, Turn, TurnMetrics,
};
pub use project::{EvaluationMethod, ModelTarget, ProjectConfig, Query, QueryCategory};
pub use schedule::{Frequency, ScheduleSpec};
pub use scoring::ExtractedScores;
