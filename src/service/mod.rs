//! Service layer: scoring, scheduling and scan orchestration

pub mod evaluator;
pub mod invoker;
pub mod resilience;
pub mod scan;
pub mod schedule;

pub use invoker::OpenAiInvoker;
pub use scan::{ScanOrchestrator, ScanStore};
