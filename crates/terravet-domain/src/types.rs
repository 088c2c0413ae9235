use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

// ── Variable values ──────────────────────────────────────────────────────────

/// A Terraform input variable value: scalar, list, or mapping.
///
/// Serializes to the JSON shape `terraform` expects in a `*.tfvars.json`
/// file, so an entire variable set is just `BTreeMap<String, VarValue>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VarValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<VarValue>),
    Map(BTreeMap<String, VarValue>),
}

impl VarValue {
    /// Convenience constructor for a list of strings.
    pub fn strings<I, S>(items: I) -> VarValue
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        VarValue::List(items.into_iter().map(|s| VarValue::Str(s.into())).collect())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            VarValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for VarValue {
    fn from(s: &str) -> Self {
        VarValue::Str(s.to_string())
    }
}

impl From<String> for VarValue {
    fn from(s: String) -> Self {
        VarValue::Str(s)
    }
}

impl From<bool> for VarValue {
    fn from(b: bool) -> Self {
        VarValue::Bool(b)
    }
}

impl From<i64> for VarValue {
    fn from(n: i64) -> Self {
        VarValue::Int(n)
    }
}

impl From<u16> for VarValue {
    fn from(n: u16) -> Self {
        VarValue::Int(i64::from(n))
    }
}

impl From<Vec<VarValue>> for VarValue {
    fn from(v: Vec<VarValue>) -> Self {
        VarValue::List(v)
    }
}

impl From<BTreeMap<String, VarValue>> for VarValue {
    fn from(m: BTreeMap<String, VarValue>) -> Self {
        VarValue::Map(m)
    }
}

// ── Scenario ──────────────────────────────────────────────────────────────────

/// What the live network must look like after a successful apply.
#[derive(Debug, Clone, PartialEq)]
pub struct Expectation {
    /// Declared address space, compared byte-for-byte against the live value.
    pub address_space: Vec<String>,
    /// Logical subnet names keyed in the `subnet_ids` output.
    pub subnet_names: Vec<String>,
    /// Logical NSG names keyed in the `nsg_ids` output.
    pub nsg_names: Vec<String>,
}

/// One complete verification run: inputs, unique identity, and the shape
/// the live state is required to have.
///
/// Immutable once built; a scenario is never shared between concurrent
/// runs — its `suffix` is what keeps parallel runs from colliding on
/// cloud-scoped names.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub module_dir: PathBuf,
    pub location: String,
    /// Collision-resistant token baked into every generated resource name.
    pub suffix: String,
    pub resource_group: String,
    pub vnet_name: String,
    pub vars: BTreeMap<String, VarValue>,
    pub expected: Expectation,
}

impl Scenario {
    /// Identity string attached to every failure so orphaned resources can
    /// be traced back to the run that created them.
    pub fn identity(&self) -> String {
        format!(
            "scenario={} suffix={} resource_group={}",
            self.name, self.suffix, self.resource_group
        )
    }
}
