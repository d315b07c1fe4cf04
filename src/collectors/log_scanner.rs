use crate::collectors::LineClassifier;
use crate::error::ScanError;
use crate::events::LogEvent;
use log::{debug, error, info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Extension identifying log files in the scanned directory
pub const LOG_FILE_EXTENSION: &str = "log";

/// A log file left out of a scan, with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything a directory scan produced
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Classified events from every readable file, in file then line order
    pub events: Vec<LogEvent>,
    /// Number of files read to the end
    pub files_scanned: usize,
    /// Files that could not be opened or read
    pub skipped_files: Vec<SkippedFile>,
    /// Lines the classifier rejected
    pub dropped_lines: usize,
}

/// Events read from one file
#[derive(Debug, Default)]
pub struct FileScan {
    pub events: Vec<LogEvent>,
    pub dropped_lines: usize,
}

/// Reads `*.log` files from a directory and classifies every line
///
/// The directory itself must be readable; individual files that fail are
/// skipped and reported in [`ScanResult::skipped_files`].
#[derive(Debug, Clone)]
pub struct LogScanner {
    classifier: LineClassifier,
}

impl LogScanner {
    pub fn new(classifier: LineClassifier) -> Self {
        Self { classifier }
    }

    /// List log files directly inside `dir`, sorted by path
    ///
    /// Hidden files are ignored. Subdirectories are not descended into.
    ///
    /// # Errors
    ///
    /// Returns `ScanError::DirectoryMissing` if `dir` does not exist and
    /// `ScanError::DirectoryUnreadable` if it cannot be listed.
    pub fn list_log_files(dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !dir.exists() {
            return Err(ScanError::DirectoryMissing(dir.to_path_buf()));
        }

        let entries = std::fs::read_dir(dir).map_err(|source| ScanError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            if Self::is_log_file(&path) {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }

    fn is_log_file(path: &Path) -> bool {
        let hidden = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with('.'));
        !hidden
            && path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == LOG_FILE_EXTENSION)
    }

    /// Scan every log file in `dir`
    ///
    /// # Errors
    ///
    /// Only directory-level failures are returned; file and line failures are
    /// contained in the [`ScanResult`].
    pub fn scan_directory(&self, dir: &Path) -> Result<ScanResult, ScanError> {
        let files = Self::list_log_files(dir)?;
        info!("Scanning {} log files in {}", files.len(), dir.display());

        let mut result = ScanResult::default();
        for path in files {
            match self.scan_file(&path) {
                Ok(scan) => {
                    debug!(
                        "Read {} events from {} ({} dropped lines)",
                        scan.events.len(),
                        path.display(),
                        scan.dropped_lines
                    );
                    result.events.extend(scan.events);
                    result.dropped_lines += scan.dropped_lines;
                    result.files_scanned += 1;
                }
                Err(e) => {
                    error!("Error processing file {}: {}", path.display(), e);
                    result.skipped_files.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(result)
    }

    /// Read and classify a single file
    ///
    /// A read failure part way through discards the whole file.
    pub fn scan_file(&self, path: &Path) -> std::io::Result<FileScan> {
        let file = File::open(path)?;
        self.scan_reader(BufReader::new(file), path)
    }

    /// Classify every line from `reader`; `source` is only used for logging
    ///
    /// `\n`, `\r\n` and a bare `\r` all end a line.
    pub fn scan_reader<R: BufRead>(&self, reader: R, source: &Path) -> std::io::Result<FileScan> {
        let mut scan = FileScan::default();
        let mut line_number = 0;

        for chunk in reader.split(b'\n') {
            let chunk = String::from_utf8(chunk?)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            // A trailing `\r` is the first half of `\r\n` or a final bare `\r`
            let chunk = chunk.strip_suffix('\r').unwrap_or(&chunk);

            for line in chunk.split('\r') {
                line_number += 1;
                match self.classifier.classify(line) {
                    Ok(event) => scan.events.push(event),
                    Err(e) => {
                        // Malformed entries never halt the scan
                        debug!(
                            "Dropping line {} of {}: {}",
                            line_number,
                            source.display(),
                            e
                        );
                        scan.dropped_lines += 1;
                    }
                }
            }
        }

        Ok(scan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternConfig;
    use crate::events::Severity;
    use std::io::Cursor;
    use tempfile::TempDir;

    const SAMPLE_LOG: &str = "2024-03-12 01:15:23 INFO Server started successfully\n\
        2024-03-12 01:15:24 INFO Database connection established response_time=50.2\n\
        2024-03-12 01:16:30 WARNING High CPU usage detected response_time=1200.5\n\
        2024-03-12 01:17:45 ERROR Database connection failed response_time=8000.0";

    fn scanner() -> LogScanner {
        LogScanner::new(LineClassifier::new(&PatternConfig::default()).unwrap())
    }

    #[test]
    fn test_scan_directory_reads_sample() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("test.log"), SAMPLE_LOG).unwrap();

        let result = scanner().scan_directory(dir.path()).unwrap();
        assert_eq!(result.events.len(), 4);
        assert_eq!(result.files_scanned, 1);
        assert!(result.skipped_files.is_empty());

        let errors = result
            .events
            .iter()
            .filter(|e| e.severity == Severity::Error)
            .count();
        assert_eq!(errors, 1);
    }

    #[test]
    fn test_only_log_files_are_scanned() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("app.log"), "INFO one\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ERROR ignored\n").unwrap();
        std::fs::write(dir.path().join(".hidden.log"), "ERROR ignored\n").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("deep.log"), "ERROR ignored\n").unwrap();

        let files = LogScanner::list_log_files(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("app.log")]);

        let result = scanner().scan_directory(dir.path()).unwrap();
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].severity, Severity::Info);
    }

    #[test]
    fn test_files_are_read_in_sorted_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.log"), "second\n").unwrap();
        std::fs::write(dir.path().join("a.log"), "first\n").unwrap();

        let result = scanner().scan_directory(dir.path()).unwrap();
        let messages: Vec<_> = result.events.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let result = scanner().scan_directory(Path::new("/nonexistent/logscope/logs"));
        assert!(matches!(result, Err(ScanError::DirectoryMissing(_))));
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("good.log"), "ERROR boom\n").unwrap();
        // Invalid UTF-8 fails the line reader
        std::fs::write(dir.path().join("bad.log"), [b'o', b'k', b'\n', 0xFF, 0xFE, b'\n']).unwrap();

        let result = scanner().scan_directory(dir.path()).unwrap();
        assert_eq!(result.files_scanned, 1);
        assert_eq!(result.skipped_files.len(), 1);
        assert_eq!(result.skipped_files[0].path, dir.path().join("bad.log"));
        // The partially read file contributes nothing
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.events[0].message, "ERROR boom");
    }

    #[test]
    fn test_blank_lines_classify_as_info() {
        let scan = scanner()
            .scan_reader(Cursor::new("ERROR a\n\nINFO b\n"), Path::new("mem"))
            .unwrap();
        assert_eq!(scan.events.len(), 3);
        assert_eq!(scan.events[1].severity, Severity::Info);
        assert_eq!(scan.events[1].message, "");
    }

    #[test]
    fn test_bare_carriage_returns_end_lines() {
        let scan = scanner()
            .scan_reader(
                Cursor::new("ERROR a\rWARNING b\rINFO c\r"),
                Path::new("mem"),
            )
            .unwrap();
        let severities: Vec<_> = scan.events.iter().map(|e| e.severity).collect();
        assert_eq!(
            severities,
            vec![Severity::Error, Severity::Warning, Severity::Info]
        );
        assert_eq!(scan.events[1].message, "WARNING b");
    }

    #[test]
    fn test_mixed_line_endings() {
        let scan = scanner()
            .scan_reader(Cursor::new("ERROR a\r\nINFO b\nWARNING c\r\r\n"), Path::new("mem"))
            .unwrap();
        let messages: Vec<_> = scan.events.iter().map(|e| e.message.as_str()).collect();
        // `\r\r\n` is a bare `\r` followed by `\r\n`, leaving one blank line
        assert_eq!(messages, vec!["ERROR a", "INFO b", "WARNING c", ""]);
    }

    #[test]
    fn test_unparseable_lines_are_dropped() {
        let patterns = PatternConfig {
            response_time: r"latency=(\w+)".to_string(),
            ..PatternConfig::default()
        };
        let scanner = LogScanner::new(LineClassifier::new(&patterns).unwrap());
        let scan = scanner
            .scan_reader(
                Cursor::new("latency=12 ok\nlatency=slow\nINFO fine\n"),
                Path::new("mem"),
            )
            .unwrap();
        assert_eq!(scan.events.len(), 2);
        assert_eq!(scan.dropped_lines, 1);
        assert_eq!(scan.events[0].response_time, Some(12.0));
    }

    #[test]
    fn test_empty_directory_yields_no_events() {
        let dir = TempDir::new().unwrap();
        let result = scanner().scan_directory(dir.path()).unwrap();
        assert!(result.events.is_empty());
        assert_eq!(result.files_scanned, 0);
    }
}
