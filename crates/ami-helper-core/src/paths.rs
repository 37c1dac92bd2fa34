//! Standard paths used by ami-helper

use std::path::PathBuf;

/// Standard ami-helper paths
pub struct Paths {
    /// Config directory (~/.config/ami-helper)
    pub config: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}

impl Paths {
    pub fn new() -> Self {
        let config = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("ami-helper");

        Self { config }
    }

    /// Paths rooted somewhere other than the user's config directory
    pub fn with_config_dir(config: impl Into<PathBuf>) -> Self {
        Self {
            config: config.into(),
        }
    }

    /// Get the config file path
    pub fn config_file(&self) -> PathBuf {
        self.config.join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_under_config_dir() {
        let paths = Paths::with_config_dir("/tmp/ami-test");
        assert_eq!(paths.config_file(), PathBuf::from("/tmp/ami-test/config.toml"));
    }

    #[test]
    fn test_default_dir_name() {
        let paths = Paths::new();
        assert!(paths.config.ends_with("ami-helper"));
    }
}
