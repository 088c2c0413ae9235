use serde::{Deserialize, Serialize};

/// Raw YAML representation of a run config file (terravet.yml).
#[derive(Debug, Deserialize, Serialize)]
pub struct RawRunConfig {
    /// Path to the module under test, relative to the config file.
    pub module_dir: String,
    /// Azure region new resources land in.
    pub location: Option<String>,
    /// Prefix baked into every generated resource name.
    pub name_prefix: Option<String>,
    /// Override the IaC binary ("terraform" or "tofu"). Absent = terraform.
    pub binary: Option<String>,
    /// Default for skipping provisioning-dependent scenarios.
    #[serde(default)]
    pub skip_provision: bool,
}
