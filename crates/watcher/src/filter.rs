//! Path filtering for watch events
//!
//! Supports two sources of ignore patterns, both in gitignore syntax:
//! 1. The root's `.gitignore` (optional, disabled by default)
//! 2. Config-based patterns (additional custom patterns)
//!
//! With the default configuration nothing is filtered.

use crate::error::{Result, WatchError};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Ignore rule set for one watch root
pub struct PathFilter {
    /// Canonical watch root; patterns are anchored here
    root: PathBuf,

    /// Root `.gitignore` patterns (optional)
    gitignore: Option<Gitignore>,

    /// Patterns from config (optional)
    patterns: Option<Gitignore>,

    /// Configuration
    config: FilterConfig,
}

impl PathFilter {
    /// Build the filter for a watch root
    pub fn load(root: &Path, config: FilterConfig) -> Result<Self> {
        let mut filter = Self {
            root: root.to_path_buf(),
            gitignore: None,
            patterns: None,
            config,
        };

        filter.reload()?;
        Ok(filter)
    }

    /// Rebuild from the config and the root's `.gitignore` on disk
    ///
    /// On error the current rules are left in place.
    pub fn reload(&mut self) -> Result<()> {
        let mut gitignore = None;
        if self.config.use_gitignore {
            let gitignore_path = self.root.join(".gitignore");
            if gitignore_path.exists() {
                let mut builder = GitignoreBuilder::new(&self.root);
                if let Some(err) = builder.add(&gitignore_path) {
                    return Err(WatchError::Config(format!(
                        "invalid {}: {err}",
                        gitignore_path.display()
                    )));
                }
                gitignore = Some(build(&builder)?);
            }
        }

        let mut patterns = None;
        if !self.config.additional_patterns.is_empty() {
            let mut builder = GitignoreBuilder::new(&self.root);
            for pattern in &self.config.additional_patterns {
                builder
                    .add_line(None, pattern)
                    .map_err(|e| WatchError::Config(format!("invalid pattern {pattern:?}: {e}")))?;
            }
            patterns = Some(build(&builder)?);
        }

        self.gitignore = gitignore;
        self.patterns = patterns;
        Ok(())
    }

    /// Check if events for `path` should be dropped
    ///
    /// `path` may be absolute (under the root) or relative to the root. The
    /// root itself is never ignored.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        let relative = if path.is_absolute() {
            match path.strip_prefix(&self.root) {
                Ok(rel) => rel,
                Err(_) => return false,
            }
        } else {
            path
        };

        if relative.as_os_str().is_empty() {
            return false;
        }

        // Config patterns take precedence, so a `!keep.log` there re-includes
        // a path the .gitignore excludes.
        if let Some(ref patterns) = self.patterns {
            let matched = patterns.matched_path_or_any_parents(relative, is_dir);
            if matched.is_ignore() {
                return true;
            }
            if matched.is_whitelist() {
                return false;
            }
        }

        if let Some(ref gitignore) = self.gitignore {
            if gitignore
                .matched_path_or_any_parents(relative, is_dir)
                .is_ignore()
            {
                return true;
            }
        }

        false
    }

    /// Whether `path` is a file this filter reads its rules from
    pub fn is_source(&self, path: &Path) -> bool {
        self.config.use_gitignore && path == self.root.join(".gitignore")
    }

    /// Whether no pattern source is active
    pub fn is_empty(&self) -> bool {
        self.active_sources() == 0
    }

    /// Get number of active ignore sources
    pub fn active_sources(&self) -> usize {
        usize::from(self.gitignore.is_some()) + usize::from(self.patterns.is_some())
    }

    /// Get watch root
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn build(builder: &GitignoreBuilder) -> Result<Gitignore> {
    builder
        .build()
        .map_err(|e| WatchError::Config(e.to_string()))
}

/// Filter configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Apply the root's .gitignore (default: false)
    #[serde(default)]
    pub use_gitignore: bool,

    /// Additional gitignore-syntax patterns
    #[serde(default)]
    pub additional_patterns: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_filters_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let filter = PathFilter::load(temp_dir.path(), FilterConfig::default()).unwrap();

        assert!(filter.is_empty());
        assert!(!filter.is_ignored(Path::new(".git/config"), false));
        assert!(!filter.is_ignored(Path::new("src/main.rs"), false));
    }

    #[test]
    fn test_gitignore_parsing() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join(".gitignore"), "*.log\ntarget/\n*.tmp\n")?;

        let config = FilterConfig {
            use_gitignore: true,
            additional_patterns: vec![],
        };
        let filter = PathFilter::load(temp_dir.path(), config)?;

        assert!(filter.is_ignored(Path::new("test.log"), false));
        assert!(filter.is_ignored(Path::new("file.tmp"), false));
        assert!(filter.is_ignored(Path::new("target"), true));
        assert!(filter.is_ignored(Path::new("target/debug/app"), false));

        assert!(!filter.is_ignored(Path::new("src/main.rs"), false));
        assert!(!filter.is_ignored(Path::new("README.md"), false));
        Ok(())
    }

    #[test]
    fn test_gitignore_disabled() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join(".gitignore"), "*.log\n")?;

        let filter = PathFilter::load(temp_dir.path(), FilterConfig::default())?;
        assert!(!filter.is_ignored(Path::new("test.log"), false));
        Ok(())
    }

    #[test]
    fn test_additional_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let config = FilterConfig {
            use_gitignore: false,
            additional_patterns: vec!["*.swp".to_string(), "build/".to_string()],
        };
        let filter = PathFilter::load(temp_dir.path(), config).unwrap();

        assert_eq!(filter.active_sources(), 1);
        assert!(filter.is_ignored(Path::new("file.swp"), false));
        assert!(filter.is_ignored(Path::new("build"), true));
        assert!(filter.is_ignored(Path::new("build/output.txt"), false));
        assert!(!filter.is_ignored(Path::new("src/main.rs"), false));
    }

    #[test]
    fn test_patterns_override_gitignore() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join(".gitignore"), "*.log\n")?;

        let config = FilterConfig {
            use_gitignore: true,
            additional_patterns: vec!["!important.log".to_string()],
        };
        let filter = PathFilter::load(temp_dir.path(), config)?;

        assert_eq!(filter.active_sources(), 2);
        assert!(filter.is_ignored(Path::new("debug.log"), false));
        assert!(!filter.is_ignored(Path::new("important.log"), false));
        Ok(())
    }

    #[test]
    fn test_absolute_paths() {
        let temp_dir = TempDir::new().unwrap();
        let config = FilterConfig {
            use_gitignore: false,
            additional_patterns: vec!["*.log".to_string()],
        };
        let filter = PathFilter::load(temp_dir.path(), config).unwrap();

        assert!(filter.is_ignored(&temp_dir.path().join("a.log"), false));
        assert!(!filter.is_ignored(&temp_dir.path().join("a.txt"), false));
        // Outside the root and the root itself are never filtered
        assert!(!filter.is_ignored(Path::new("/elsewhere/a.log"), false));
        assert!(!filter.is_ignored(temp_dir.path(), true));
    }

    #[test]
    fn test_gitignore_is_a_source_only_when_enabled() {
        let temp_dir = TempDir::new().unwrap();
        let gitignore = temp_dir.path().join(".gitignore");

        let filter = PathFilter::load(temp_dir.path(), FilterConfig::default()).unwrap();
        assert!(!filter.is_source(&gitignore));

        let config = FilterConfig {
            use_gitignore: true,
            additional_patterns: vec![],
        };
        let filter = PathFilter::load(temp_dir.path(), config).unwrap();
        assert!(filter.is_source(&gitignore));
        assert!(!filter.is_source(&temp_dir.path().join("sub/.gitignore")));
    }

    #[test]
    fn test_reload_picks_up_new_gitignore() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config = FilterConfig {
            use_gitignore: true,
            additional_patterns: vec![],
        };
        let mut filter = PathFilter::load(temp_dir.path(), config)?;
        assert!(!filter.is_ignored(Path::new("test.log"), false));

        fs::write(temp_dir.path().join(".gitignore"), "*.log\n")?;
        filter.reload()?;

        assert!(filter.is_ignored(Path::new("test.log"), false));
        Ok(())
    }
}
