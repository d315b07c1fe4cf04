use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use log::{error, info, warn, LevelFilter};
use logscope::alerts::{AlertManager, EmailNotifier};
use logscope::analysis::{AnalysisCycle, CycleOutcome};
use logscope::collectors::{LineClassifier, LogScanner};
use logscope::config::Config;
use logscope::error::ConfigError;
use logscope::events::AnalysisSummary;
use logscope::generator::LogGenerator;
use logscope::maintenance::{cleanup_files, ensure_directories, retention_period};
use logscope::monitoring::SystemMetrics;
use logscope::reports::ReportWriter;
use logscope::service::LogAnalyzerService;
use logscope::visualization::Visualizer;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Command-line arguments for the log analyzer
#[derive(Parser)]
#[command(
    name = "logscope",
    about = "Periodic log analyzer - summaries, charts and email alerts from plain-text logs",
    long_about = "Scans a directory of .log files, classifies each line by severity, \
                  extracts response times, writes JSON summary reports and SVG charts, \
                  and emails alerts for error events."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true, help = "Enable verbose logging output")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one analysis cycle and print the summary
    Analyze(AnalyzeArgs),
    /// Run analysis on a schedule until interrupted
    Serve,
    /// Write a file of sample log entries
    Generate(GenerateArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Directory containing log files
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Directory for saving reports
    #[arg(long, value_name = "DIR")]
    report_dir: Option<PathBuf>,

    /// Directory for saving visualizations
    #[arg(long, value_name = "DIR")]
    vis_dir: Option<PathBuf>,

    /// Analyze logs since this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", value_parser = parse_since)]
    since: Option<NaiveDate>,

    /// Enable email alerts
    #[arg(long)]
    alert: bool,

    /// Show system metrics
    #[arg(long)]
    metrics: bool,

    /// Clean up old reports
    #[arg(long)]
    cleanup: bool,
}

#[derive(Args)]
struct GenerateArgs {
    /// Directory to store generated logs (defaults to the configured log directory)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Number of log entries to generate
    #[arg(long, default_value_t = 1000)]
    entries: usize,

    /// Number of days to spread the logs over
    #[arg(long, default_value_t = 1)]
    days: u32,
}

fn parse_since(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{}': {}", value, e))
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// # Returns
    ///
    /// `Ok(())` if all arguments are valid, `Err(String)` with error message otherwise
    fn validate(&self) -> Result<(), String> {
        // Missing files fall back to defaults in load_config
        if let Some(ref config_path) = self.config {
            if config_path.exists() && !config_path.is_file() {
                return Err(format!(
                    "Configuration path is not a file: {}",
                    config_path.display()
                ));
            }
        }

        if let Command::Analyze(args) = &self.command {
            if let Some(dir) = &args.log_dir {
                if dir.exists() && !dir.is_dir() {
                    return Err(format!("Log path is not a directory: {}", dir.display()));
                }
            }
        }

        Ok(())
    }
}

/// How the configuration was obtained, reported once logging is up
enum ConfigSource {
    Defaults,
    File(PathBuf),
    Unreadable(PathBuf, ConfigError),
    Invalid(PathBuf, ConfigError),
}

/// Load configuration, falling back to defaults when the file is missing or invalid
fn load_config(config_path: Option<&Path>) -> (Config, ConfigSource) {
    let Some(path) = config_path else {
        let mut config = Config::default();
        config.apply_env_overrides();
        return (config, ConfigSource::Defaults);
    };

    match Config::from_file(path) {
        Ok(config) => (config, ConfigSource::File(path.to_path_buf())),
        Err(e) => {
            let mut config = Config::default();
            config.apply_env_overrides();
            let source = match e {
                ConfigError::ReadError(_) => ConfigSource::Unreadable(path.to_path_buf(), e),
                e => ConfigSource::Invalid(path.to_path_buf(), e),
            };
            (config, source)
        }
    }
}

fn report_config_source(source: &ConfigSource) {
    match source {
        ConfigSource::Defaults => info!("Using default configuration"),
        ConfigSource::File(path) => info!("Loaded configuration from: {}", path.display()),
        ConfigSource::Unreadable(path, e) => warn!(
            "Configuration file '{}' not found or unreadable ({}), using defaults",
            path.display(),
            e
        ),
        ConfigSource::Invalid(path, e) => {
            error!("Configuration error in '{}': {}", path.display(), e);
            warn!("Using default configuration due to invalid config file");
        }
    }
}

/// Initialize env_logger, honouring RUST_LOG unless `verbose` is set
fn init_logging(verbose: bool, file: Option<&Path>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    if let Some(path) = file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.try_init().context("Failed to initialize logging")?;
    Ok(())
}

fn format_summary(summary: &AnalysisSummary) -> String {
    let avg = summary
        .avg_response_time
        .map(|avg| format!("{:.2}ms", avg))
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "Analysis Summary:\n\
         Total Logs: {}\n\
         Error Count: {}\n\
         Warning Count: {}\n\
         Info Count: {}\n\
         Average Response Time: {}",
        summary.total_logs, summary.error_count, summary.warning_count, summary.info_count, avg
    )
}

/// Create the working directories and run one cycle over the log directory
fn run_analysis(config: &Config, args: &AnalyzeArgs) -> Result<CycleOutcome> {
    ensure_directories(&config.paths).context("Failed to create working directories")?;

    let classifier =
        LineClassifier::new(&config.patterns).context("Failed to build line classifier")?;
    let mut cycle = AnalysisCycle::new(LogScanner::new(classifier))
        .with_report_writer(ReportWriter::new(&config.paths.reports_dir))
        .with_visualizer(Visualizer::new(
            &config.paths.visualizations_dir,
            config.visualization.clone(),
        ));
    if let Some(date) = args.since {
        cycle = cycle.with_since(date.and_time(chrono::NaiveTime::MIN));
    }
    if args.alert {
        cycle = cycle.with_alert_manager(AlertManager::new(
            Box::new(EmailNotifier::new(config.smtp.clone())),
            config.thresholds.clone(),
        ));
    }

    cycle
        .run_cycle(&config.paths.logs_dir)
        .context("Error during analysis")
}

fn analyze(mut config: Config, mut args: AnalyzeArgs) -> Result<()> {
    if let Some(dir) = args.log_dir.take() {
        config.paths.logs_dir = dir;
    }
    if let Some(dir) = args.report_dir.take() {
        config.paths.reports_dir = dir;
    }
    if let Some(dir) = args.vis_dir.take() {
        config.paths.visualizations_dir = dir;
    }

    if args.metrics {
        let metrics = SystemMetrics::collect(&config.paths.logs_dir);
        println!("\nSystem Metrics:\n{}", metrics);
        if metrics.disk_usage_exceeded(config.thresholds.disk_usage) {
            warn!(
                "Disk usage above {:.1}% threshold",
                config.thresholds.disk_usage
            );
        }
    }

    println!("\nAnalyzing logs...");
    let outcome = run_analysis(&config, &args)?;

    let report = match outcome {
        CycleOutcome::Empty => {
            println!("No logs found to analyze");
            return Ok(());
        }
        CycleOutcome::Completed(report) => report,
    };

    println!("\n{}", format_summary(&report.summary));
    if !report.skipped_files.is_empty() {
        println!("Skipped Files: {}", report.skipped_files.len());
    }
    if let Some(alerts) = report.alerts {
        println!(
            "\nAlerts: {} sent, {} skipped, {} failed",
            alerts.sent, alerts.skipped, alerts.failed
        );
    }

    if args.cleanup {
        let cleaned = cleanup_files(
            &config.paths.reports_dir,
            retention_period(config.retention.days),
        )
        .context("Error during cleanup")?;
        if cleaned > 0 {
            println!("\nCleaned up {} old files", cleaned);
        }
    }

    match report.report_path {
        Some(path) => println!("\nReport saved to: {}", path.display()),
        None => println!("\nReport could not be saved"),
    }
    println!(
        "Visualizations saved to: {}",
        config.paths.visualizations_dir.display()
    );
    Ok(())
}

fn serve(config: Config) -> Result<()> {
    let mut service =
        LogAnalyzerService::new(config).context("Failed to initialize log analyzer service")?;

    let (shutdown_sender, shutdown_receiver) = mpsc::channel();
    ctrlc::set_handler(move || {
        info!("Received interrupt signal (SIGINT), shutting down gracefully...");
        if let Err(e) = shutdown_sender.send(()) {
            error!("Failed to send shutdown signal: {}", e);
        }
    })
    .context("Error setting SIGINT handler for graceful shutdown")?;

    info!("Log analyzer service is running. Press Ctrl+C to stop.");
    let totals = service
        .run(&shutdown_receiver)
        .context("Log analyzer service failed")?;
    info!(
        "Service shutdown complete after {} cycles",
        totals.cycles_completed + totals.cycles_empty + totals.cycles_failed
    );
    Ok(())
}

fn generate(config: Config, args: GenerateArgs) -> Result<()> {
    let output_dir = args.output_dir.unwrap_or(config.paths.logs_dir);
    let path = LogGenerator::new(output_dir)
        .generate_recent(args.entries, args.days)
        .context("Error generating logs")?;
    println!("Generated {} log entries in {}", args.entries, path.display());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let (config, source) = load_config(cli.config.as_deref());
    init_logging(cli.verbose, config.logging.file.as_deref())?;
    report_config_source(&source);

    cli.validate()
        .map_err(|e| anyhow::anyhow!("Invalid arguments: {}", e))?;

    match cli.command {
        Command::Analyze(args) => analyze(config, args),
        Command::Serve => serve(config),
        Command::Generate(args) => generate(config, args),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze_cli(config: Option<PathBuf>, log_dir: Option<PathBuf>) -> Cli {
        Cli {
            config,
            verbose: false,
            command: Command::Analyze(AnalyzeArgs {
                log_dir,
                report_dir: None,
                vis_dir: None,
                since: None,
                alert: false,
                metrics: false,
                cleanup: false,
            }),
        }
    }

    #[test]
    fn test_cli_validation_with_existing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "[retention]\ndays = 3\n").unwrap();

        assert!(analyze_cli(Some(config_path), None).validate().is_ok());
    }

    #[test]
    fn test_cli_validation_with_missing_file() {
        let cli = analyze_cli(Some(PathBuf::from("/nonexistent/config.toml")), None);

        // Should not fail - missing files are handled gracefully
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_cli_validation_with_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = analyze_cli(Some(dir.path().to_path_buf()), None);

        // Should fail - directories are not valid config files
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_cli_validation_log_dir_is_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("app.log");
        std::fs::write(&file, "").unwrap();

        assert!(analyze_cli(None, Some(file)).validate().is_err());
    }

    #[test]
    fn test_parse_analyze_flags() {
        let cli = Cli::try_parse_from([
            "logscope",
            "analyze",
            "--log-dir",
            "/var/log/app",
            "--since",
            "2024-03-12",
            "--alert",
            "--cleanup",
        ])
        .unwrap();

        match cli.command {
            Command::Analyze(args) => {
                assert_eq!(args.log_dir, Some(PathBuf::from("/var/log/app")));
                assert_eq!(args.since, NaiveDate::from_ymd_opt(2024, 3, 12));
                assert!(args.alert);
                assert!(args.cleanup);
                assert!(!args.metrics);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_since() {
        let result = Cli::try_parse_from(["logscope", "analyze", "--since", "12/03/2024"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_generate_defaults() {
        let cli = Cli::try_parse_from(["logscope", "--verbose", "generate"]).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Generate(args) => {
                assert_eq!(args.entries, 1000);
                assert_eq!(args.days, 1);
                assert!(args.output_dir.is_none());
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let (config, source) = load_config(Some(Path::new("/nonexistent/config.toml")));
        assert!(matches!(source, ConfigSource::Unreadable(..)));
        assert_eq!(config.paths, Config::default().paths);
    }

    #[test]
    fn test_load_config_invalid_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[schedule]\nanalysis_interval_minutes = 0\n").unwrap();

        let (config, source) = load_config(Some(&path));
        assert!(matches!(source, ConfigSource::Invalid(..)));
        assert_eq!(config.schedule.analysis_interval_minutes, 60);
    }

    #[test]
    fn test_analysis_creates_directories_on_first_run() {
        let root = tempfile::TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.logs_dir = root.path().join("logs");
        config.paths.reports_dir = root.path().join("reports");
        config.paths.visualizations_dir = root.path().join("visualizations");

        let args = match analyze_cli(None, None).command {
            Command::Analyze(args) => args,
            _ => unreachable!(),
        };

        let outcome = run_analysis(&config, &args).unwrap();
        assert!(outcome.is_empty());
        assert!(config.paths.logs_dir.is_dir());
        assert!(config.paths.reports_dir.is_dir());
        assert!(config.paths.visualizations_dir.is_dir());
    }

    #[test]
    fn test_format_summary_without_response_times() {
        let summary = AnalysisSummary {
            total_logs: 2,
            error_count: 1,
            warning_count: 0,
            info_count: 1,
            avg_response_time: None,
            max_response_time: None,
            start_time: None,
            end_time: None,
        };
        let text = format_summary(&summary);
        assert!(text.contains("Total Logs: 2"));
        assert!(text.contains("Average Response Time: N/A"));
    }

    #[test]
    fn test_format_summary_rounds_average() {
        let summary = AnalysisSummary {
            total_logs: 1,
            error_count: 0,
            warning_count: 0,
            info_count: 1,
            avg_response_time: Some(3083.5666),
            max_response_time: Some(3083.5666),
            start_time: None,
            end_time: None,
        };
        assert!(format_summary(&summary).contains("Average Response Time: 3083.57ms"));
    }
}
