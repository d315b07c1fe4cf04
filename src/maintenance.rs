//! Output directory bootstrap and retention cleanup

use crate::config::PathsConfig;
use crate::error::MaintenanceError;
use log::{debug, info, warn};
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Seconds in one retention day
const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Convert a retention period in days to a maximum file age
pub fn retention_period(days: u32) -> Duration {
    Duration::from_secs(u64::from(days) * SECONDS_PER_DAY)
}

/// Create the log, report and visualization directories if missing
///
/// # Errors
///
/// Returns `MaintenanceError::CreateDirectory` for the first directory that
/// cannot be created.
pub fn ensure_directories(paths: &PathsConfig) -> Result<(), MaintenanceError> {
    for dir in [&paths.logs_dir, &paths.reports_dir, &paths.visualizations_dir] {
        std::fs::create_dir_all(dir).map_err(|source| MaintenanceError::CreateDirectory {
            path: dir.clone(),
            source,
        })?;
        debug!("Ensured directory exists: {}", dir.display());
    }
    Ok(())
}

/// Remove regular files in `dir` last modified more than `max_age` ago
///
/// A missing directory is created and nothing is removed. Files whose age
/// cannot be determined or that cannot be deleted are logged and kept.
///
/// # Returns
///
/// The number of files removed.
pub fn cleanup_files(dir: &Path, max_age: Duration) -> Result<usize, MaintenanceError> {
    cleanup_files_at(dir, max_age, SystemTime::now())
}

fn cleanup_files_at(dir: &Path, max_age: Duration, now: SystemTime) -> Result<usize, MaintenanceError> {
    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|source| MaintenanceError::CreateDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
        return Ok(0);
    }

    let entries = std::fs::read_dir(dir).map_err(|source| MaintenanceError::ListDirectory {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let modified = match entry.metadata().and_then(|m| {
            if m.is_file() {
                m.modified().map(Some)
            } else {
                Ok(None)
            }
        }) {
            Ok(Some(modified)) => modified,
            Ok(None) => continue,
            Err(e) => {
                warn!("Cannot read age of {}: {}", path.display(), e);
                continue;
            }
        };

        // Files stamped in the future have no age yet
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age <= max_age {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("Removed old file: {}", path.display());
                removed += 1;
            }
            Err(e) => warn!("Error removing file {}: {}", path.display(), e),
        }
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str, age: Duration) {
        let file = File::create(dir.join(name)).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    #[test]
    fn test_retention_period() {
        assert_eq!(retention_period(7), Duration::from_secs(604_800));
        assert_eq!(retention_period(0), Duration::ZERO);
    }

    #[test]
    fn test_ensure_directories_creates_all() {
        let root = TempDir::new().unwrap();
        let paths = PathsConfig {
            logs_dir: root.path().join("logs"),
            reports_dir: root.path().join("out/reports"),
            visualizations_dir: root.path().join("out/charts"),
        };

        ensure_directories(&paths).unwrap();
        assert!(paths.logs_dir.is_dir());
        assert!(paths.reports_dir.is_dir());
        assert!(paths.visualizations_dir.is_dir());

        // Idempotent
        ensure_directories(&paths).unwrap();
    }

    #[test]
    fn test_cleanup_removes_only_old_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "old.json", retention_period(8));
        touch(dir.path(), "fresh.json", retention_period(1));
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let removed = cleanup_files(dir.path(), retention_period(7)).unwrap();
        assert_eq!(removed, 1);
        assert!(!dir.path().join("old.json").exists());
        assert!(dir.path().join("fresh.json").exists());
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_cleanup_creates_missing_directory() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("reports");

        assert_eq!(cleanup_files(&dir, retention_period(7)).unwrap(), 0);
        assert!(dir.is_dir());
    }

    #[test]
    fn test_future_files_are_kept() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "new.svg", Duration::ZERO);

        let past = SystemTime::now() - retention_period(30);
        assert_eq!(cleanup_files_at(dir.path(), Duration::ZERO, past).unwrap(), 0);
    }
}
