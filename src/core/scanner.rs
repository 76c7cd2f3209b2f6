// src/core/scanner.rs
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::ScanConfig;
use super::model::{Dialect, SourceFile};

/// Depth-bounded directory walk producing candidate source files
pub struct SourceScanner {
    config: ScanConfig,
}

impl SourceScanner {
    pub fn new(config: &ScanConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Collect every allow-listed file under `root`.
    ///
    /// Unreadable entries are logged and skipped; the walk never aborts on them.
    /// Directories nested deeper than `max_depth` are treated as empty.
    pub fn scan<P: AsRef<Path>>(&self, root: P) -> Vec<SourceFile> {
        let root = root.as_ref();
        let mut files = Vec::new();

        // A directory at depth d is listed when d <= max_depth, so its files sit at d + 1.
        let walker = WalkDir::new(root)
            .follow_links(false)
            .max_depth(self.config.max_depth.saturating_add(1))
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_ignored(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let Some(dialect) = Dialect::from_path(entry.path()) else {
                continue;
            };

            match entry.metadata() {
                Ok(metadata) if metadata.len() > self.config.max_file_size => {
                    debug!(
                        "Skipping {} ({} bytes exceeds limit)",
                        entry.path().display(),
                        metadata.len()
                    );
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("Cannot stat {}: {}", entry.path().display(), e);
                    continue;
                }
            }

            files.push(SourceFile {
                path: entry.path().to_path_buf(),
                dialect,
            });
        }

        debug!("Scanned {} candidate files under {}", files.len(), root.display());
        files
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        // Never prune the root itself, even when it is named like an ignored directory
        if entry.depth() == 0 {
            return false;
        }

        let name = entry.file_name().to_string_lossy();

        if self.config.ignore_dot_prefixed && name.starts_with('.') {
            return true;
        }

        entry.file_type().is_dir() && self.config.ignored_directory_names.contains(name.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn relative(files: &[SourceFile], root: &Path) -> Vec<PathBuf> {
        files
            .iter()
            .map(|f| f.path.strip_prefix(root).unwrap().to_path_buf())
            .collect()
    }

    #[test]
    fn test_empty_directory() {
        let temp = TempDir::new().unwrap();
        let scanner = SourceScanner::new(&ScanConfig::default());
        assert!(scanner.scan(temp.path()).is_empty());
    }

    #[test]
    fn test_filters_by_extension_and_assigns_dialect() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "src/app.ts", "function main() {}");
        write(temp.path(), "src/tool.py", "def run():\n    pass\n");
        write(temp.path(), "scripts/deploy.rb", "def deploy\nend\n");
        write(temp.path(), "README.md", "# readme");

        let scanner = SourceScanner::new(&ScanConfig::default());
        let files = scanner.scan(temp.path());

        assert_eq!(files.len(), 3);
        let dialect_of = |name: &str| {
            files
                .iter()
                .find(|f| f.path.ends_with(name))
                .map(|f| f.dialect)
        };
        assert_eq!(dialect_of("app.ts"), Some(Dialect::Brace));
        assert_eq!(dialect_of("tool.py"), Some(Dialect::Indentation));
        assert_eq!(dialect_of("deploy.rb"), Some(Dialect::Generic));
    }

    #[test]
    fn test_ignored_directories_and_dot_prefixes() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "node_modules/lib/index.js", "function x() {}");
        write(temp.path(), ".git/hooks/pre-commit.sh", "echo");
        write(temp.path(), "src/.hidden.js", "function y() {}");
        write(temp.path(), "src/node_modules_shim.js", "function z() {}");

        let scanner = SourceScanner::new(&ScanConfig::default());
        let files = relative(&scanner.scan(temp.path()), temp.path());

        assert_eq!(files, vec![PathBuf::from("src/node_modules_shim.js")]);
    }

    #[test]
    fn test_dot_prefixes_kept_when_disabled() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), ".config/setup.js", "function setup() {}");

        let config = ScanConfig {
            ignore_dot_prefixed: false,
            ..ScanConfig::default()
        };
        let files = SourceScanner::new(&config).scan(temp.path());
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_depth_cap_treats_deep_directories_as_empty() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "top.js", "");
        write(temp.path(), "a/one.js", "");
        write(temp.path(), "a/b/two.js", "");
        write(temp.path(), "a/b/c/three.js", "");

        let config = ScanConfig {
            max_depth: 1,
            ..ScanConfig::default()
        };
        let files = relative(&SourceScanner::new(&config).scan(temp.path()), temp.path());

        assert_eq!(files, vec![PathBuf::from("a/one.js"), PathBuf::from("top.js")]);
    }

    #[test]
    fn test_order_is_deterministic() {
        let temp = TempDir::new().unwrap();
        for name in ["zeta.js", "alpha.js", "mid/beta.py"] {
            write(temp.path(), name, "");
        }
        let scanner = SourceScanner::new(&ScanConfig::default());
        let first = scanner.scan(temp.path());
        let second = scanner.scan(temp.path());
        assert_eq!(first, second);
    }

    #[test]
    fn test_oversized_files_skipped() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "big.js", &"x".repeat(64));
        write(temp.path(), "small.js", "x");

        let config = ScanConfig {
            max_file_size: 16,
            ..ScanConfig::default()
        };
        let files = relative(&SourceScanner::new(&config).scan(temp.path()), temp.path());
        assert_eq!(files, vec![PathBuf::from("small.js")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        write(temp.path(), "locked/secret.js", "function hidden() {}");
        write(temp.path(), "open/app.js", "function main() {}");
        let locked = temp.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not bind a privileged user
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let files = relative(&SourceScanner::new(&ScanConfig::default()).scan(temp.path()), temp.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(files, vec![PathBuf::from("open/app.js")]);
    }
}
