use std::collections::BTreeMap;

use terravet_config::RunConfig;
use terravet_domain::{
    unique_id, Access, Direction, DomainError, Expectation, Protocol, Scenario, SecurityRule,
    VarValue,
};

/// Assemble the standard verification scenario: one network, two subnets,
/// one NSG with an SSH allow rule attached to the app subnet, and a tag
/// set. Every generated name carries a fresh unique suffix so concurrent
/// runs never collide inside the shared subscription namespace.
pub fn vnet_scenario(cfg: &RunConfig) -> Result<Scenario, DomainError> {
    let suffix = unique_id();
    let resource_group = format!("rg-{}-{}", cfg.name_prefix, suffix);
    let vnet_name = format!("vnet-{}-{}", cfg.name_prefix, suffix);

    let mut vars: BTreeMap<String, VarValue> = BTreeMap::new();
    vars.insert("create_resource_group".into(), true.into());
    vars.insert("resource_group_name".into(), resource_group.as_str().into());
    vars.insert("location".into(), cfg.location.as_str().into());
    vars.insert("vnet_name".into(), vnet_name.as_str().into());
    vars.insert(
        "vnet_address_space".into(),
        VarValue::strings(["10.99.0.0/16"]),
    );

    let mut app_subnet = BTreeMap::new();
    app_subnet.insert(
        "address_prefixes".into(),
        VarValue::strings(["10.99.0.0/24"]),
    );
    app_subnet.insert(
        "service_endpoints".into(),
        VarValue::strings(["Microsoft.Storage"]),
    );
    let mut data_subnet = BTreeMap::new();
    data_subnet.insert(
        "address_prefixes".into(),
        VarValue::strings(["10.99.1.0/24"]),
    );
    let mut subnets = BTreeMap::new();
    subnets.insert("snet-test-app".into(), VarValue::Map(app_subnet));
    subnets.insert("snet-test-data".into(), VarValue::Map(data_subnet));
    vars.insert("subnets".into(), VarValue::Map(subnets));

    let allow_ssh = SecurityRule::new(
        "allow-ssh",
        100,
        Direction::Inbound,
        Access::Allow,
        Protocol::Tcp,
    )?
    .ports("*", "22")
    .prefixes("VirtualNetwork", "*");

    let mut nsg = BTreeMap::new();
    nsg.insert(
        "security_rules".into(),
        VarValue::List(vec![allow_ssh.to_var()]),
    );
    let mut nsgs = BTreeMap::new();
    nsgs.insert("nsg-test-app".into(), VarValue::Map(nsg));
    vars.insert("network_security_groups".into(), VarValue::Map(nsgs));

    let mut associations = BTreeMap::new();
    associations.insert("snet-test-app".into(), VarValue::from("nsg-test-app"));
    vars.insert("nsg_subnet_associations".into(), VarValue::Map(associations));

    let mut tags = BTreeMap::new();
    tags.insert("environment".into(), VarValue::from("terravet"));
    tags.insert("project".into(), VarValue::from("terravet"));
    tags.insert("owner".into(), VarValue::from("ci"));
    tags.insert("cost_center".into(), VarValue::from("CC-0000"));
    vars.insert("tags".into(), VarValue::Map(tags));

    Ok(Scenario {
        name: "vnet-standard".into(),
        module_dir: cfg.module_dir.clone(),
        location: cfg.location.clone(),
        suffix,
        resource_group,
        vnet_name,
        vars,
        expected: Expectation {
            address_space: vec!["10.99.0.0/16".into()],
            subnet_names: vec!["snet-test-app".into(), "snet-test-data".into()],
            nsg_names: vec!["nsg-test-app".into()],
        },
    })
}

/// The deliberately-invalid scenario: an empty address-space list, which
/// the module's own validation must reject at plan time. Nothing here is
/// ever applied, so the expectation is empty.
pub fn empty_address_space_scenario(cfg: &RunConfig) -> Scenario {
    let suffix = unique_id();
    let resource_group = format!("rg-{}-invalid-{}", cfg.name_prefix, suffix);
    let vnet_name = format!("vnet-{}-invalid-{}", cfg.name_prefix, suffix);

    let mut vars: BTreeMap<String, VarValue> = BTreeMap::new();
    vars.insert("create_resource_group".into(), true.into());
    vars.insert("resource_group_name".into(), resource_group.as_str().into());
    vars.insert("location".into(), cfg.location.as_str().into());
    vars.insert("vnet_name".into(), vnet_name.as_str().into());
    vars.insert("vnet_address_space".into(), VarValue::List(Vec::new()));

    Scenario {
        name: "vnet-empty-address-space".into(),
        module_dir: cfg.module_dir.clone(),
        location: cfg.location.clone(),
        suffix,
        resource_group,
        vnet_name,
        vars,
        expected: Expectation {
            address_space: Vec::new(),
            subnet_names: Vec::new(),
            nsg_names: Vec::new(),
        },
    }
}
