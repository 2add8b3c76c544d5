pub mod change;
pub mod evaluator;
pub mod export;
pub mod extractor;
pub mod fmt;
pub mod report;
pub mod scheduler;
pub mod service;
pub mod setup;
pub mod stats;

pub use change::has_changed;
pub use evaluator::AlertEvaluator;
pub use export::export_alerts_csv;
pub use extractor::{extract_snapshot, locate_data, to_float};
pub use scheduler::ReportScheduler;
pub use service::{CheckService, CheckTaskHandle, CycleOutcome, ReadFailure, UnitReading};
pub use stats::{aggregate, UnitStats};
