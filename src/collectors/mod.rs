/// Line classification into structured events
pub mod line_classifier;

/// Directory scanning over log files
pub mod log_scanner;

pub use line_classifier::LineClassifier;
pub use log_scanner::{FileScan, LogScanner, ScanResult, SkippedFile};
