pub mod alert;
pub mod history;
pub mod snapshot;

pub use alert::{AlertEvent, AlertKind, AlertSeverity};
pub use history::{AlertRecord, HistoryRecord};
pub use snapshot::{StateMap, UnitSnapshot, ONLINE_CODE, UNKNOWN_CODE};
