/// JSON summary reports
pub mod report_writer;

pub use report_writer::{timestamp_suffix, ReportWriter};
