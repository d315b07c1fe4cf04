/// Configuration loading and validation
pub mod settings;

pub use settings::{
    AlertThresholds, Config, LoggingConfig, PathsConfig, PatternConfig, RetentionConfig,
    ScheduleConfig, SmtpConfig, VisualizationConfig,
};
