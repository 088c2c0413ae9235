use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;
use crate::raw::RawRunConfig;

/// Validated run configuration, constructed once and passed into every
/// component. Nothing downstream reads process state directly.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub module_dir: PathBuf,
    pub location: String,
    pub name_prefix: String,
    pub binary: String,
    pub skip_provision: bool,
}

impl RunConfig {
    /// Defaults for driving a module without a config file (tests, CLI flags).
    pub fn for_module(module_dir: impl Into<PathBuf>) -> Self {
        Self {
            module_dir: module_dir.into(),
            location: "eastus".into(),
            name_prefix: "terravet".into(),
            binary: "terraform".into(),
            skip_provision: false,
        }
    }
}

/// Load and validate a `terravet.yml` run config.
///
/// `module_dir` is resolved relative to the config file's parent directory.
pub fn load_run_config(path: &Path) -> Result<RunConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    let raw: RawRunConfig = serde_yaml::from_str(&content).map_err(|e| ConfigError::YamlParse {
        path: path.display().to_string(),
        source: e,
    })?;

    if raw.module_dir.is_empty() {
        return Err(ConfigError::Invalid {
            path: path.display().to_string(),
            message: "module_dir must not be empty".into(),
        });
    }

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let module_dir = base.join(&raw.module_dir);
    debug!("loaded run config from {}", path.display());

    let binary = raw.binary.unwrap_or_else(|| "terraform".into());
    match binary.as_str() {
        "terraform" | "tofu" => {}
        other => {
            return Err(ConfigError::Invalid {
                path: path.display().to_string(),
                message: format!("unknown binary '{}'", other),
            });
        }
    }

    Ok(RunConfig {
        module_dir,
        location: raw.location.unwrap_or_else(|| "eastus".into()),
        name_prefix: raw.name_prefix.unwrap_or_else(|| "terravet".into()),
        binary,
        skip_provision: raw.skip_provision,
    })
}
