use std::time::Duration;

use terravet_azure::{NetworkClient, VerifyError, VirtualNetwork};
use terravet_domain::Scenario;
use terravet_driver::ApplyOutputs;
use tracing::info;

use crate::error::HarnessError;

/// How long to keep re-polling a `NotFound` right after apply. ARM's
/// read path can lag the write path by a few seconds; anything beyond
/// this window is a genuine missing resource.
pub const VISIBILITY_ATTEMPTS: u32 = 5;
pub const VISIBILITY_DELAY: Duration = Duration::from_secs(6);

/// Fetch the live network, absorbing read-path lag: only `NotFound` is
/// re-polled, every other failure is fatal on first occurrence. Each
/// poll still carries the client's own bounded timeout.
pub async fn fetch_live_network(
    client: &NetworkClient,
    resource_group: &str,
    name: &str,
    attempts: u32,
    delay: Duration,
) -> Result<VirtualNetwork, VerifyError> {
    let mut attempt = 1;
    loop {
        match client.get_virtual_network(resource_group, name).await {
            Err(VerifyError::NotFound { .. }) if attempt < attempts => {
                info!(attempt, name, "live network not visible yet, re-polling");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// Assert the provisioning tool's declared outputs match the scenario's
/// intent: primary id non-empty, resource group echoed back, and the
/// subnet/NSG maps keyed exactly as declared.
pub fn check_outputs(scenario: &Scenario, outputs: &ApplyOutputs) -> Result<(), HarnessError> {
    let identity = scenario.identity();

    let vnet_id = outputs
        .scalar("vnet_id")
        .map_err(|e| HarnessError::driver(&identity, e))?;
    if vnet_id.is_empty() {
        return Err(HarnessError::Mismatch {
            identity,
            field: "vnet_id".into(),
            declared: "<non-empty id>".into(),
            live: String::new(),
        });
    }

    let rg = outputs
        .scalar("resource_group_name")
        .map_err(|e| HarnessError::driver(&identity, e))?;
    if rg != scenario.resource_group {
        return Err(HarnessError::Mismatch {
            identity,
            field: "resource_group_name".into(),
            declared: scenario.resource_group.clone(),
            live: rg.to_string(),
        });
    }

    let subnet_ids = outputs
        .map("subnet_ids")
        .map_err(|e| HarnessError::driver(&identity, e))?;
    if subnet_ids.len() != scenario.expected.subnet_names.len() {
        return Err(HarnessError::Mismatch {
            identity,
            field: "subnet_ids.len".into(),
            declared: scenario.expected.subnet_names.len().to_string(),
            live: subnet_ids.len().to_string(),
        });
    }
    for name in &scenario.expected.subnet_names {
        if !subnet_ids.contains_key(name) {
            return Err(HarnessError::Mismatch {
                identity,
                field: "subnet_ids".into(),
                declared: format!("key '{}'", name),
                live: "absent".into(),
            });
        }
    }

    let nsg_ids = outputs
        .map("nsg_ids")
        .map_err(|e| HarnessError::driver(&identity, e))?;
    for name in &scenario.expected.nsg_names {
        if !nsg_ids.contains_key(name) {
            return Err(HarnessError::Mismatch {
                identity,
                field: "nsg_ids".into(),
                declared: format!("key '{}'", name),
                live: "absent".into(),
            });
        }
    }

    Ok(())
}

/// Assert the control plane's view agrees with the scenario's intent.
/// The address space must round-trip byte-identically, and every
/// declared subnet must exist on the live object.
pub fn check_live_state(scenario: &Scenario, live: &VirtualNetwork) -> Result<(), HarnessError> {
    let identity = scenario.identity();

    if live.name != scenario.vnet_name {
        return Err(HarnessError::Mismatch {
            identity,
            field: "name".into(),
            declared: scenario.vnet_name.clone(),
            live: live.name.clone(),
        });
    }

    if live.address_space != scenario.expected.address_space {
        return Err(HarnessError::Mismatch {
            identity,
            field: "address_space".into(),
            declared: scenario.expected.address_space.join(","),
            live: live.address_space.join(","),
        });
    }

    for name in &scenario.expected.subnet_names {
        if live.subnet(name).is_none() {
            return Err(HarnessError::Mismatch {
                identity,
                field: "subnets".into(),
                declared: format!("subnet '{}'", name),
                live: "absent".into(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use terravet_azure::{StaticToken, Subnet};
    use terravet_config::RunConfig;
    use terravet_driver::OutputValue;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scenario() -> Scenario {
        let mut s = crate::builder::vnet_scenario(&RunConfig::for_module("modules/vnet")).unwrap();
        // Pin the generated identity so assertions are deterministic.
        s.resource_group = "rg-vet-abc123".into();
        s.vnet_name = "vnet-vet-abc123".into();
        s
    }

    fn good_outputs() -> ApplyOutputs {
        let mut outputs = ApplyOutputs::default();
        outputs.insert("vnet_id", OutputValue::Scalar("/subscriptions/s/vnet".into()));
        outputs.insert(
            "resource_group_name",
            OutputValue::Scalar("rg-vet-abc123".into()),
        );
        outputs.insert(
            "subnet_ids",
            OutputValue::Map(BTreeMap::from([
                ("snet-test-app".into(), "id-app".into()),
                ("snet-test-data".into(), "id-data".into()),
            ])),
        );
        outputs.insert(
            "nsg_ids",
            OutputValue::Map(BTreeMap::from([("nsg-test-app".into(), "id-nsg".into())])),
        );
        outputs
    }

    fn live_network() -> VirtualNetwork {
        VirtualNetwork {
            name: "vnet-vet-abc123".into(),
            location: "eastus".into(),
            address_space: vec!["10.99.0.0/16".into()],
            subnets: vec![
                Subnet { name: "snet-test-app".into(), address_prefixes: vec!["10.99.0.0/24".into()] },
                Subnet { name: "snet-test-data".into(), address_prefixes: vec!["10.99.1.0/24".into()] },
            ],
            tags: BTreeMap::new(),
        }
    }

    #[test]
    fn agreeing_sources_pass() {
        let s = scenario();
        check_outputs(&s, &good_outputs()).unwrap();
        check_live_state(&s, &live_network()).unwrap();
    }

    #[test]
    fn missing_output_is_fatal() {
        let s = scenario();
        let mut outputs = ApplyOutputs::default();
        outputs.insert(
            "resource_group_name",
            OutputValue::Scalar("rg-vet-abc123".into()),
        );
        let err = check_outputs(&s, &outputs).unwrap_err();
        assert!(matches!(err, HarnessError::Driver { .. }), "got: {err}");
    }

    #[test]
    fn subnet_count_mismatch_is_caught() {
        let s = scenario();
        let mut outputs = good_outputs();
        outputs.insert(
            "subnet_ids",
            OutputValue::Map(BTreeMap::from([("snet-test-app".into(), "id-app".into())])),
        );
        let err = check_outputs(&s, &outputs).unwrap_err();
        match err {
            HarnessError::Mismatch { field, declared, live, .. } => {
                assert_eq!(field, "subnet_ids.len");
                assert_eq!(declared, "2");
                assert_eq!(live, "1");
            }
            other => panic!("expected Mismatch, got {other}"),
        }
    }

    #[test]
    fn address_space_must_round_trip_byte_identical() {
        let s = scenario();
        let mut live = live_network();
        live.address_space = vec!["10.99.0.0/17".into()];
        let err = check_live_state(&s, &live).unwrap_err();
        assert!(matches!(err, HarnessError::Mismatch { .. }), "got: {err}");
    }

    #[test]
    fn live_name_disagreement_is_an_identity_mismatch() {
        let s = scenario();
        let mut live = live_network();
        live.name = "vnet-somebody-else".into();
        let err = check_live_state(&s, &live).unwrap_err();
        match err {
            HarnessError::Mismatch { field, .. } => assert_eq!(field, "name"),
            other => panic!("expected Mismatch, got {other}"),
        }
    }

    #[tokio::test]
    async fn visibility_window_absorbs_a_lagging_read_path() {
        let server = MockServer::start().await;
        // First read misses, second sees the network.
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": "ResourceNotFound", "message": "not yet" }
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "vnet-vet-abc123",
                "location": "eastus",
                "properties": { "addressSpace": { "addressPrefixes": ["10.99.0.0/16"] } }
            })))
            .mount(&server)
            .await;

        let client = NetworkClient::new("test-sub", Box::new(StaticToken("tok".into())))
            .with_management_base(server.uri());

        let vnet = fetch_live_network(
            &client,
            "rg-vet-abc123",
            "vnet-vet-abc123",
            3,
            Duration::from_millis(10),
        )
        .await
        .unwrap();
        assert_eq!(vnet.address_space, vec!["10.99.0.0/16"]);
    }

    #[tokio::test]
    async fn visibility_window_is_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": "ResourceNotFound", "message": "never" }
            })))
            .mount(&server)
            .await;

        let client = NetworkClient::new("test-sub", Box::new(StaticToken("tok".into())))
            .with_management_base(server.uri());

        let err = fetch_live_network(
            &client,
            "rg-vet-abc123",
            "vnet-vet-abc123",
            2,
            Duration::from_millis(10),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, VerifyError::NotFound { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn non_not_found_fetch_errors_are_fatal_on_first_occurrence() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": "AuthorizationFailed", "message": "denied" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = NetworkClient::new("test-sub", Box::new(StaticToken("tok".into())))
            .with_management_base(server.uri());

        let err = fetch_live_network(
            &client,
            "rg-vet-abc123",
            "vnet-vet-abc123",
            5,
            Duration::from_millis(10),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, VerifyError::Api { .. }), "got: {err}");
    }
}
