use std::{env, path::PathBuf};

/// Standard-library import search root.
pub const STDLIB_ENV: &str = "MODC_PATH";
/// Overrides the OS tag that picks `name.<os>.c` package members.
pub const TARGET_OS_ENV: &str = "MODC_TARGET_OS";
/// Backend C compiler.
pub const CC_ENV: &str = "CC";

/// Settings for one compilation run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub stdlib_root: Option<PathBuf>,
    pub target_os: String,
    pub cc: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stdlib_root: None,
            target_os: env::consts::OS.to_string(),
            cc: "gcc".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            stdlib_root: env::var_os(STDLIB_ENV)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
            target_os: env::var(TARGET_OS_ENV)
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.target_os),
            cc: env::var(CC_ENV)
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cc),
        };
        log::debug!("{:?}", config);
        config
    }

    pub fn with_stdlib_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.stdlib_root = Some(root.into());
        self
    }

    pub fn with_target_os(mut self, os: impl Into<String>) -> Self {
        self.target_os = os.into();
        self
    }
}
