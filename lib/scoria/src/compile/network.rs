// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Compilers for the network resource kinds: NICs, public IPs, security
//! groups, and virtual networks.
//!
//! NICs and public IPs accept a batch count so a machine batch can pair with
//! a matching batch of per-instance network resources; the other kinds are
//! shared infrastructure and compile as single documents.

use std::collections::{BTreeMap, BTreeSet};

use scoria_api_types::properties::network::{
    DnsSettings, IpAllocationMethod, IpConfiguration,
    IpConfigurationProperties, NetworkInterfaceProperties,
    NetworkSecurityGroupProperties, PublicIpProperties, RuleAccess,
    RuleDirection, RuleProtocol, SecurityRule, SecurityRuleProperties, Subnet,
    SubnetProperties, VirtualNetworkProperties,
};
use scoria_api_types::properties::network::AddressSpace;
use scoria_api_types::{
    DependencyEdge, ExtendedLocation, ExtendedLocationType, Feature,
    Properties, ResourceDocument, ResourceKind, Sku, SubResource,
    VersionTable,
};

use crate::error::CompileError;
use crate::naming::Namer;
use crate::resolver::VersionResolver;

use super::require_nonempty;

/// A network interface document's inputs.
#[derive(Clone, Debug, Default)]
pub struct NicConfiguration {
    pub name: String,
    pub location: String,
    pub tags: BTreeMap<String, String>,
    pub version_table: VersionTable,

    /// Batch count. Values above one compile to a copy loop with indexed
    /// names, matching a machine batch of the same count.
    pub count: Option<u32>,

    pub subnet_id: String,
    pub private_ip_address: Option<String>,

    /// A public IP to associate. When the NIC is batched the referenced
    /// public IP is assumed batched under the same index.
    pub public_ip_name: Option<String>,

    pub load_balancer_backend_pool_ids: Vec<String>,
    pub load_balancer_nat_rule_ids: Vec<String>,
    pub application_gateway_backend_pool_ids: Vec<String>,
    pub application_security_group_ids: Vec<String>,

    pub network_security_group_id: Option<String>,
    pub accelerated_networking: Option<bool>,

    pub edge_zone: Option<String>,

    pub depends_on: Vec<DependencyEdge>,
}

pub(crate) fn compile_nic(
    config: &NicConfiguration,
) -> Result<ResourceDocument, CompileError> {
    require_nonempty(&config.name, "name", "a network interface")?;
    require_nonempty(&config.location, "location", "a network interface")?;
    require_nonempty(&config.subnet_id, "subnet_id", "a network interface")?;

    let namer = Namer::new(config.count);
    let mut resolver = VersionResolver::new(
        &config.version_table,
        ResourceKind::NetworkInterface,
    );

    resolver.require_if(
        config.accelerated_networking.is_some(),
        Feature::AcceleratedNetworking,
    );
    resolver.require_if(
        !config.application_security_group_ids.is_empty(),
        Feature::ApplicationSecurityGroups,
    );
    resolver.require_if(config.edge_zone.is_some(), Feature::EdgeZone);

    let mut depends_on = config.depends_on.clone();

    let public_ip_address = config.public_ip_name.as_deref().map(|ip_name| {
        let ip_expr = namer.name(ip_name);
        depends_on.push(DependencyEdge {
            kind: ResourceKind::PublicIpAddress,
            name: ip_expr.clone(),
        });
        SubResource::new(scoria_api_types::resource_id(
            ResourceKind::PublicIpAddress,
            &ip_expr,
        ))
    });

    let to_refs = |ids: &[String]| -> Vec<SubResource> {
        ids.iter().cloned().map(SubResource::new).collect()
    };

    let ip_configuration = IpConfiguration {
        name: namer.suffixed(&config.name, "-ipconfig"),
        properties: IpConfigurationProperties {
            subnet: Some(SubResource::new(config.subnet_id.clone())),
            private_ip_allocation_method: if config.private_ip_address.is_some()
            {
                IpAllocationMethod::Static
            } else {
                IpAllocationMethod::Dynamic
            },
            private_ip_address: config.private_ip_address.clone(),
            public_ip_address,
            load_balancer_backend_address_pools: to_refs(
                &config.load_balancer_backend_pool_ids,
            ),
            load_balancer_inbound_nat_rules: to_refs(
                &config.load_balancer_nat_rule_ids,
            ),
            application_gateway_backend_address_pools: to_refs(
                &config.application_gateway_backend_pool_ids,
            ),
            application_security_groups: to_refs(
                &config.application_security_group_ids,
            ),
        },
    };

    let properties = NetworkInterfaceProperties {
        ip_configurations: vec![ip_configuration],
        enable_accelerated_networking: config.accelerated_networking,
        network_security_group: config
            .network_security_group_id
            .clone()
            .map(SubResource::new),
    };

    let api_version = resolver.resolve()?;

    Ok(ResourceDocument {
        resource_type: ResourceKind::NetworkInterface,
        api_version,
        name: namer.name(config.name.as_str()),
        location: Some(config.location.clone()),
        tags: config.tags.clone(),
        depends_on,
        copy: namer.copy_directive(&format!("{}copy", config.name)),
        sku: None,
        account_kind: None,
        zones: Vec::new(),
        extended_location: edge_zone_location(&config.edge_zone),
        identity: None,
        properties: Properties::NetworkInterface(properties),
    })
}

/// A public IP address document's inputs.
#[derive(Clone, Debug, Default)]
pub struct PublicIpConfiguration {
    pub name: String,
    pub location: String,
    pub tags: BTreeMap<String, String>,
    pub version_table: VersionTable,

    pub count: Option<u32>,

    pub allocation_method: IpAllocationMethod,
    pub dns_name_label: Option<String>,

    /// "Basic" or "Standard". Standard is a versioned feature.
    pub sku: Option<String>,

    pub zones: Vec<String>,
    pub edge_zone: Option<String>,

    pub depends_on: Vec<DependencyEdge>,
}

pub(crate) fn compile_public_ip(
    config: &PublicIpConfiguration,
) -> Result<ResourceDocument, CompileError> {
    require_nonempty(&config.name, "name", "a public IP address")?;
    require_nonempty(&config.location, "location", "a public IP address")?;

    let namer = Namer::new(config.count);
    let mut resolver = VersionResolver::new(
        &config.version_table,
        ResourceKind::PublicIpAddress,
    );

    let standard_sku = config.sku.as_deref() == Some("Standard");
    resolver.require_if(standard_sku, Feature::StandardSku);
    resolver.require_if(!config.zones.is_empty(), Feature::AvailabilityZones);
    resolver.require_if(config.edge_zone.is_some(), Feature::EdgeZone);

    if let Some(sku) = config.sku.as_deref() {
        if sku != "Basic" && sku != "Standard" {
            return Err(CompileError::UnsupportedEnumValue {
                field: "sku",
                value: sku.to_string(),
                context: "a public IP address",
            });
        }
    }

    // A DNS label is a single hostname; stamping one onto every member of a
    // batch would collide in the zone.
    if namer.is_batch() && config.dns_name_label.is_some() {
        return Err(CompileError::ConfigurationAmbiguous(
            "dns_name_label",
            "count",
        ));
    }

    let properties = PublicIpProperties {
        public_ip_allocation_method: config.allocation_method,
        dns_settings: config.dns_name_label.clone().map(|domain_name_label| {
            DnsSettings { domain_name_label }
        }),
    };

    let api_version = resolver.resolve()?;

    Ok(ResourceDocument {
        resource_type: ResourceKind::PublicIpAddress,
        api_version,
        name: namer.name(config.name.as_str()),
        location: Some(config.location.clone()),
        tags: config.tags.clone(),
        depends_on: config.depends_on.clone(),
        copy: namer.copy_directive(&format!("{}copy", config.name)),
        sku: config.sku.clone().map(|name| Sku {
            name,
            tier: None,
            capacity: None,
        }),
        account_kind: None,
        zones: config.zones.clone(),
        extended_location: edge_zone_location(&config.edge_zone),
        identity: None,
        properties: Properties::PublicIpAddress(properties),
    })
}

/// One security rule's inputs.
#[derive(Clone, Debug)]
pub struct SecurityRuleOptions {
    pub name: String,
    pub protocol: RuleProtocol,
    pub destination_port_range: String,

    /// 100-4096 inclusive.
    pub priority: u32,

    pub access: RuleAccess,
    pub direction: RuleDirection,

    /// Defaults to "*" when absent.
    pub source_address_prefix: Option<String>,

    /// Defaults to "*" when absent.
    pub destination_address_prefix: Option<String>,
}

/// A network security group document's inputs.
#[derive(Clone, Debug, Default)]
pub struct NsgConfiguration {
    pub name: String,
    pub location: String,
    pub tags: BTreeMap<String, String>,
    pub version_table: VersionTable,

    pub rules: Vec<SecurityRuleOptions>,

    /// Convenience ports to open to inbound TCP from anywhere. Deduplicated,
    /// then each expands to an allow rule, priorities counting up from 900
    /// in port order so explicit rules at lower numbers still win. Explicit
    /// rules may not reuse a priority the expansion occupies.
    pub open_ports: Vec<u16>,

    pub depends_on: Vec<DependencyEdge>,
}

const RULE_PRIORITY_MIN: u32 = 100;
const RULE_PRIORITY_MAX: u32 = 4096;
const OPEN_PORT_PRIORITY_BASE: u32 = 900;

pub(crate) fn compile_nsg(
    config: &NsgConfiguration,
) -> Result<ResourceDocument, CompileError> {
    require_nonempty(&config.name, "name", "a network security group")?;
    require_nonempty(&config.location, "location", "a network security group")?;

    let resolver = VersionResolver::new(
        &config.version_table,
        ResourceKind::NetworkSecurityGroup,
    );

    let open_ports: BTreeSet<u16> =
        config.open_ports.iter().copied().collect();
    let open_port_priorities = OPEN_PORT_PRIORITY_BASE
        ..OPEN_PORT_PRIORITY_BASE + open_ports.len() as u32;

    let mut security_rules =
        Vec::with_capacity(config.rules.len() + open_ports.len());
    for (offset, port) in open_ports.iter().enumerate() {
        security_rules.push(SecurityRule {
            name: format!("open-port-{port}"),
            properties: SecurityRuleProperties {
                protocol: RuleProtocol::Tcp,
                source_port_range: "*".to_string(),
                destination_port_range: port.to_string(),
                source_address_prefix: "*".to_string(),
                destination_address_prefix: "*".to_string(),
                access: RuleAccess::Allow,
                priority: OPEN_PORT_PRIORITY_BASE + offset as u32,
                direction: RuleDirection::Inbound,
            },
        });
    }
    for rule in &config.rules {
        require_nonempty(&rule.name, "name", "a security rule")?;
        if rule.priority < RULE_PRIORITY_MIN
            || rule.priority > RULE_PRIORITY_MAX
        {
            return Err(CompileError::UnsupportedEnumValue {
                field: "priority",
                value: rule.priority.to_string(),
                context: "a security rule",
            });
        }
        if open_port_priorities.contains(&rule.priority) {
            return Err(CompileError::UnsupportedEnumValue {
                field: "priority",
                value: rule.priority.to_string(),
                context: "a security rule sharing a priority with an \
                          open-port rule",
            });
        }
        security_rules.push(SecurityRule {
            name: rule.name.clone(),
            properties: SecurityRuleProperties {
                protocol: rule.protocol,
                source_port_range: "*".to_string(),
                destination_port_range: rule.destination_port_range.clone(),
                source_address_prefix: rule
                    .source_address_prefix
                    .clone()
                    .unwrap_or_else(|| "*".to_string()),
                destination_address_prefix: rule
                    .destination_address_prefix
                    .clone()
                    .unwrap_or_else(|| "*".to_string()),
                access: rule.access,
                priority: rule.priority,
                direction: rule.direction,
            },
        });
    }

    let api_version = resolver.resolve()?;

    Ok(ResourceDocument {
        resource_type: ResourceKind::NetworkSecurityGroup,
        api_version,
        name: scoria_api_types::NameExpr::literal(config.name.clone()),
        location: Some(config.location.clone()),
        tags: config.tags.clone(),
        depends_on: config.depends_on.clone(),
        copy: None,
        sku: None,
        account_kind: None,
        zones: Vec::new(),
        extended_location: None,
        identity: None,
        properties: Properties::NetworkSecurityGroup(
            NetworkSecurityGroupProperties { security_rules },
        ),
    })
}

/// One subnet's inputs.
#[derive(Clone, Debug, Default)]
pub struct SubnetOptions {
    pub name: String,
    pub address_prefix: String,
    pub network_security_group_id: Option<String>,
}

/// A virtual network document's inputs.
#[derive(Clone, Debug, Default)]
pub struct VirtualNetworkConfiguration {
    pub name: String,
    pub location: String,
    pub tags: BTreeMap<String, String>,
    pub version_table: VersionTable,

    pub address_prefixes: Vec<String>,
    pub subnets: Vec<SubnetOptions>,

    pub edge_zone: Option<String>,

    pub depends_on: Vec<DependencyEdge>,
}

pub(crate) fn compile_virtual_network(
    config: &VirtualNetworkConfiguration,
) -> Result<ResourceDocument, CompileError> {
    require_nonempty(&config.name, "name", "a virtual network")?;
    require_nonempty(&config.location, "location", "a virtual network")?;
    if config.address_prefixes.is_empty() {
        return Err(CompileError::ConfigurationIncomplete {
            field: "address_prefixes",
            context: "a virtual network",
        });
    }

    let mut resolver = VersionResolver::new(
        &config.version_table,
        ResourceKind::VirtualNetwork,
    );
    resolver.require_if(config.edge_zone.is_some(), Feature::EdgeZone);

    let mut subnets = Vec::with_capacity(config.subnets.len());
    for subnet in &config.subnets {
        require_nonempty(&subnet.name, "name", "a subnet")?;
        require_nonempty(&subnet.address_prefix, "address_prefix", "a subnet")?;
        subnets.push(Subnet {
            name: subnet.name.clone(),
            properties: SubnetProperties {
                address_prefix: subnet.address_prefix.clone(),
                network_security_group: subnet
                    .network_security_group_id
                    .clone()
                    .map(SubResource::new),
            },
        });
    }

    let api_version = resolver.resolve()?;

    Ok(ResourceDocument {
        resource_type: ResourceKind::VirtualNetwork,
        api_version,
        name: scoria_api_types::NameExpr::literal(config.name.clone()),
        location: Some(config.location.clone()),
        tags: config.tags.clone(),
        depends_on: config.depends_on.clone(),
        copy: None,
        sku: None,
        account_kind: None,
        zones: Vec::new(),
        extended_location: edge_zone_location(&config.edge_zone),
        identity: None,
        properties: Properties::VirtualNetwork(VirtualNetworkProperties {
            address_space: AddressSpace {
                address_prefixes: config.address_prefixes.clone(),
            },
            subnets,
        }),
    })
}

fn edge_zone_location(
    edge_zone: &Option<String>,
) -> Option<ExtendedLocation> {
    edge_zone.clone().map(|name| ExtendedLocation {
        name,
        location_type: ExtendedLocationType::EdgeZone,
    })
}
