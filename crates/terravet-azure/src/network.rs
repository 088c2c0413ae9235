use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::auth::TokenProvider;
use crate::error::VerifyError;

const API_VERSION: &str = "2023-09-01";

/// Per-call deadline. The suite must never hang on a slow control plane;
/// a timeout cancels only the fetch, nothing else.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

// ── Live model ────────────────────────────────────────────────────────────────

/// A virtual network as the control plane reports it right now —
/// independent of anything the provisioning tool recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualNetwork {
    pub name: String,
    pub location: String,
    pub address_space: Vec<String>,
    pub subnets: Vec<Subnet>,
    pub tags: BTreeMap<String, String>,
}

impl VirtualNetwork {
    pub fn subnet(&self, name: &str) -> Option<&Subnet> {
        self.subnets.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Subnet {
    pub name: String,
    pub address_prefixes: Vec<String>,
}

// ── Wire shapes ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVirtualNetwork {
    name: String,
    location: String,
    #[serde(default)]
    tags: BTreeMap<String, String>,
    properties: RawVnetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVnetProperties {
    address_space: RawAddressSpace,
    #[serde(default)]
    subnets: Vec<RawSubnet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAddressSpace {
    #[serde(default)]
    address_prefixes: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubnet {
    name: String,
    properties: RawSubnetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSubnetProperties {
    address_prefix: Option<String>,
    #[serde(default)]
    address_prefixes: Vec<String>,
}

impl From<RawVirtualNetwork> for VirtualNetwork {
    fn from(raw: RawVirtualNetwork) -> Self {
        let subnets = raw
            .properties
            .subnets
            .into_iter()
            .map(|s| {
                // ARM reports either the singular or the plural field.
                let mut prefixes = s.properties.address_prefixes;
                if prefixes.is_empty() {
                    prefixes.extend(s.properties.address_prefix);
                }
                Subnet { name: s.name, address_prefixes: prefixes }
            })
            .collect();

        VirtualNetwork {
            name: raw.name,
            location: raw.location,
            address_space: raw.properties.address_space.address_prefixes,
            subnets,
            tags: raw.tags,
        }
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Read-only client against the network control plane. The second,
/// independent path to ground truth: it never touches the provisioning
/// tool's state.
pub struct NetworkClient {
    subscription_id: String,
    client: reqwest::Client,
    token: Box<dyn TokenProvider>,
    management_base: String,
    timeout: Duration,
}

impl NetworkClient {
    pub fn new(subscription_id: impl Into<String>, token: Box<dyn TokenProvider>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            client: reqwest::Client::new(),
            token,
            management_base: "https://management.azure.com".into(),
            timeout: FETCH_TIMEOUT,
        }
    }

    /// Point at a different management endpoint. Used in tests.
    pub fn with_management_base(mut self, base: impl Into<String>) -> Self {
        self.management_base = base.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch the live virtual network by resource group and name.
    pub async fn get_virtual_network(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<VirtualNetwork, VerifyError> {
        let url = format!(
            "{}/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Network/virtualNetworks/{}?api-version={}",
            self.management_base, self.subscription_id, resource_group, name, API_VERSION,
        );
        debug!(url, "fetching live virtual network");

        let token = self.token.token().await?;
        let fetch = async {
            let resp = self
                .client
                .get(&url)
                .bearer_auth(&token)
                .send()
                .await
                .map_err(|e| VerifyError::Internal(format!("GET {}: {}", url, e)))?;

            let status = resp.status();
            let body: Value = resp
                .json()
                .await
                .map_err(|e| VerifyError::Internal(format!("decode {}: {}", url, e)))?;

            if status.as_u16() == 404 {
                return Err(VerifyError::NotFound {
                    resource_group: resource_group.to_string(),
                    name: name.to_string(),
                });
            }
            if !status.is_success() {
                let (code, message) = parse_arm_error(&body);
                return Err(VerifyError::Api { code, message });
            }

            let raw: RawVirtualNetwork = serde_json::from_value(body)
                .map_err(|e| VerifyError::Internal(format!("unexpected response shape: {}", e)))?;
            Ok(raw.into())
        };

        match tokio::time::timeout(self.timeout, fetch).await {
            Ok(result) => result,
            Err(_) => Err(VerifyError::Timeout(self.timeout.as_secs())),
        }
    }

    /// Existence probe: `Ok(false)` for a clean 404, errors otherwise
    /// propagate unchanged.
    pub async fn virtual_network_exists(
        &self,
        resource_group: &str,
        name: &str,
    ) -> Result<bool, VerifyError> {
        match self.get_virtual_network(resource_group, name).await {
            Ok(_) => Ok(true),
            Err(VerifyError::NotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn parse_arm_error(body: &Value) -> (String, String) {
    let err = body.get("error").unwrap_or(body);
    let code = err["code"].as_str().unwrap_or("Unknown").to_string();
    let message = err["message"].as_str().unwrap_or("unknown error").to_string();
    (code, message)
}
