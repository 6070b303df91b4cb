// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Compilers for the two load-balancing kinds.
//!
//! Both document shapes are webs of named children (frontends, pools,
//! listeners) that reference each other by child resource ID. The compilers
//! mint the child names from the document name, then wire every reference to
//! the minted name, so a compiled document is always internally consistent.

use std::collections::BTreeMap;

use scoria_api_types::properties::network::{
    ApplicationGatewayProperties, ApplicationGatewaySku, BackendAddress,
    BackendAddressPool, BackendHttpSettings, BackendHttpSettingsProperties,
    CookieBasedAffinity, FrontendIpConfiguration,
    FrontendIpConfigurationProperties, FrontendPort, FrontendPortProperties,
    GatewayBackendAddressPool, GatewayBackendAddressPoolProperties,
    GatewayIpConfiguration, GatewayIpConfigurationProperties, HttpListener,
    HttpListenerProperties, HttpProtocol, InboundNatPool,
    InboundNatPoolProperties, IpAllocationMethod, LoadBalancerProperties,
    RequestRoutingRule, RequestRoutingRuleProperties, RoutingRuleType,
    TransportProtocol,
};
use scoria_api_types::{
    child_resource_id, DependencyEdge, ExtendedLocation,
    ExtendedLocationType, Feature, NameExpr, Properties, ResourceDocument,
    ResourceKind, Sku, SubResource, VersionTable,
};

use crate::error::CompileError;
use crate::resolver::VersionResolver;

use super::require_nonempty;

/// One NAT pool's inputs: a frontend port range mapped onto one backend port
/// across the balanced set.
#[derive(Clone, Debug)]
pub struct NatPoolOptions {
    pub name: String,
    pub protocol: TransportProtocol,
    pub frontend_port_range_start: u16,
    pub frontend_port_range_end: u16,
    pub backend_port: u16,
}

/// A load balancer document's inputs.
#[derive(Clone, Debug, Default)]
pub struct LoadBalancerConfiguration {
    pub name: String,
    pub location: String,
    pub tags: BTreeMap<String, String>,
    pub version_table: VersionTable,

    /// Public frontend. Exactly one of this and `frontend_subnet_id`.
    pub frontend_public_ip_id: Option<String>,

    /// Internal frontend. Exactly one of this and `frontend_public_ip_id`.
    pub frontend_subnet_id: Option<String>,

    pub frontend_private_ip_address: Option<String>,

    pub backend_pool_name: Option<String>,
    pub nat_pools: Vec<NatPoolOptions>,

    /// "Basic" or "Standard".
    pub sku: Option<String>,

    pub edge_zone: Option<String>,

    pub depends_on: Vec<DependencyEdge>,
}

const FRONTEND_NAME: &str = "loadBalancerFrontEnd";

pub(crate) fn compile_load_balancer(
    config: &LoadBalancerConfiguration,
) -> Result<ResourceDocument, CompileError> {
    require_nonempty(&config.name, "name", "a load balancer")?;
    require_nonempty(&config.location, "location", "a load balancer")?;

    let mut resolver =
        VersionResolver::new(&config.version_table, ResourceKind::LoadBalancer);
    resolver.require_if(
        config.sku.as_deref() == Some("Standard"),
        Feature::StandardSku,
    );
    resolver.require_if(config.edge_zone.is_some(), Feature::EdgeZone);

    if let Some(sku) = config.sku.as_deref() {
        if sku != "Basic" && sku != "Standard" {
            return Err(CompileError::UnsupportedEnumValue {
                field: "sku",
                value: sku.to_string(),
                context: "a load balancer",
            });
        }
    }

    let frontend_properties = match (
        config.frontend_public_ip_id.as_deref(),
        config.frontend_subnet_id.as_deref(),
    ) {
        (Some(_), Some(_)) => {
            return Err(CompileError::ConfigurationAmbiguous(
                "frontend_public_ip_id",
                "frontend_subnet_id",
            ));
        }
        (None, None) => {
            return Err(CompileError::ConfigurationIncomplete {
                field: "frontend_public_ip_id",
                context: "a load balancer frontend",
            });
        }
        (Some(public_ip_id), None) => FrontendIpConfigurationProperties {
            public_ip_address: Some(SubResource::new(public_ip_id)),
            subnet: None,
            private_ip_address: None,
            private_ip_allocation_method: None,
        },
        (None, Some(subnet_id)) => FrontendIpConfigurationProperties {
            public_ip_address: None,
            subnet: Some(SubResource::new(subnet_id)),
            private_ip_address: config.frontend_private_ip_address.clone(),
            private_ip_allocation_method: Some(
                if config.frontend_private_ip_address.is_some() {
                    IpAllocationMethod::Static
                } else {
                    IpAllocationMethod::Dynamic
                },
            ),
        },
    };

    let frontend_ref = SubResource::new(child_resource_id(
        ResourceKind::LoadBalancer,
        &config.name,
        &format!("/frontendIPConfigurations/{FRONTEND_NAME}"),
    ));

    let backend_pool_name = config
        .backend_pool_name
        .clone()
        .unwrap_or_else(|| format!("{}bepool", config.name));

    let mut inbound_nat_pools = Vec::with_capacity(config.nat_pools.len());
    for pool in &config.nat_pools {
        require_nonempty(&pool.name, "name", "an inbound NAT pool")?;
        if pool.frontend_port_range_end < pool.frontend_port_range_start {
            return Err(CompileError::ConfigurationInconsistent {
                list: "nat_pool_frontend_port_range",
                expected: pool.frontend_port_range_start as usize,
                actual: pool.frontend_port_range_end as usize,
            });
        }
        inbound_nat_pools.push(InboundNatPool {
            name: pool.name.clone(),
            properties: InboundNatPoolProperties {
                frontend_ip_configuration: frontend_ref.clone(),
                protocol: pool.protocol,
                frontend_port_range_start: pool.frontend_port_range_start,
                frontend_port_range_end: pool.frontend_port_range_end,
                backend_port: pool.backend_port,
            },
        });
    }

    let properties = LoadBalancerProperties {
        frontend_ip_configurations: vec![FrontendIpConfiguration {
            name: FRONTEND_NAME.to_string(),
            properties: frontend_properties,
        }],
        backend_address_pools: vec![BackendAddressPool {
            name: backend_pool_name,
        }],
        inbound_nat_pools,
    };

    let api_version = resolver.resolve()?;

    Ok(ResourceDocument {
        resource_type: ResourceKind::LoadBalancer,
        api_version,
        name: NameExpr::literal(config.name.clone()),
        location: Some(config.location.clone()),
        tags: config.tags.clone(),
        depends_on: config.depends_on.clone(),
        copy: None,
        sku: config.sku.clone().map(|name| Sku {
            name,
            tier: None,
            capacity: None,
        }),
        account_kind: None,
        zones: Vec::new(),
        extended_location: config.edge_zone.clone().map(|name| {
            ExtendedLocation {
                name,
                location_type: ExtendedLocationType::EdgeZone,
            }
        }),
        identity: None,
        properties: Properties::LoadBalancer(properties),
    })
}

/// An application gateway document's inputs.
#[derive(Clone, Debug, Default)]
pub struct ApplicationGatewayConfiguration {
    pub name: String,
    pub location: String,
    pub tags: BTreeMap<String, String>,
    pub version_table: VersionTable,

    /// E.g. "Standard_Small" or "Standard_v2"; the tier is derived from it.
    pub sku_name: String,
    pub capacity: Option<u32>,

    /// The gateway's own subnet.
    pub subnet_id: String,

    /// Public frontend. Exactly one of this and `frontend_private_ip`.
    pub frontend_public_ip_id: Option<String>,

    /// Internal frontend address on the gateway subnet.
    pub frontend_private_ip: Option<String>,

    pub frontend_port: u16,
    pub backend_port: u16,
    pub http_protocol: HttpProtocol,
    pub cookie_based_affinity: CookieBasedAffinity,

    pub backend_addresses: Vec<String>,

    pub depends_on: Vec<DependencyEdge>,
}

pub(crate) fn compile_application_gateway(
    config: &ApplicationGatewayConfiguration,
) -> Result<ResourceDocument, CompileError> {
    require_nonempty(&config.name, "name", "an application gateway")?;
    require_nonempty(&config.location, "location", "an application gateway")?;
    require_nonempty(&config.sku_name, "sku_name", "an application gateway")?;
    require_nonempty(&config.subnet_id, "subnet_id", "an application gateway")?;

    let resolver = VersionResolver::new(
        &config.version_table,
        ResourceKind::ApplicationGateway,
    );

    let frontend_properties = match (
        config.frontend_public_ip_id.as_deref(),
        config.frontend_private_ip.as_deref(),
    ) {
        (Some(_), Some(_)) => {
            return Err(CompileError::ConfigurationAmbiguous(
                "frontend_public_ip_id",
                "frontend_private_ip",
            ));
        }
        (None, None) => {
            return Err(CompileError::ConfigurationIncomplete {
                field: "frontend_public_ip_id",
                context: "an application gateway frontend",
            });
        }
        (Some(public_ip_id), None) => FrontendIpConfigurationProperties {
            public_ip_address: Some(SubResource::new(public_ip_id)),
            subnet: None,
            private_ip_address: None,
            private_ip_allocation_method: None,
        },
        (None, Some(private_ip)) => FrontendIpConfigurationProperties {
            public_ip_address: None,
            subnet: Some(SubResource::new(config.subnet_id.clone())),
            private_ip_address: Some(private_ip.to_string()),
            private_ip_allocation_method: Some(IpAllocationMethod::Static),
        },
    };

    let tier = config
        .sku_name
        .split('_')
        .next()
        .unwrap_or(&config.sku_name)
        .to_string();

    let child = |path: &str| {
        SubResource::new(child_resource_id(
            ResourceKind::ApplicationGateway,
            &config.name,
            path,
        ))
    };

    let frontend_name = format!("{}FrontendIP", config.name);
    let port_name = format!("{}FrontendPort", config.name);
    let pool_name = format!("{}Pool", config.name);
    let settings_name = format!("{}HttpSettings", config.name);
    let listener_name = format!("{}HttpListener", config.name);

    let properties = ApplicationGatewayProperties {
        sku: ApplicationGatewaySku {
            name: config.sku_name.clone(),
            tier,
            capacity: config.capacity,
        },
        gateway_ip_configurations: vec![GatewayIpConfiguration {
            name: format!("{}GatewayIP", config.name),
            properties: GatewayIpConfigurationProperties {
                subnet: SubResource::new(config.subnet_id.clone()),
            },
        }],
        frontend_ip_configurations: vec![FrontendIpConfiguration {
            name: frontend_name.clone(),
            properties: frontend_properties,
        }],
        frontend_ports: vec![FrontendPort {
            name: port_name.clone(),
            properties: FrontendPortProperties { port: config.frontend_port },
        }],
        backend_address_pools: vec![GatewayBackendAddressPool {
            name: pool_name.clone(),
            properties: GatewayBackendAddressPoolProperties {
                backend_addresses: config
                    .backend_addresses
                    .iter()
                    .cloned()
                    .map(|ip_address| BackendAddress { ip_address })
                    .collect(),
            },
        }],
        backend_http_settings_collection: vec![BackendHttpSettings {
            name: settings_name.clone(),
            properties: BackendHttpSettingsProperties {
                port: config.backend_port,
                protocol: config.http_protocol,
                cookie_based_affinity: config.cookie_based_affinity,
            },
        }],
        http_listeners: vec![HttpListener {
            name: listener_name.clone(),
            properties: HttpListenerProperties {
                frontend_ip_configuration: child(&format!(
                    "/frontendIPConfigurations/{frontend_name}"
                )),
                frontend_port: child(&format!("/frontendPorts/{port_name}")),
                protocol: config.http_protocol,
            },
        }],
        request_routing_rules: vec![RequestRoutingRule {
            name: format!("{}Rule", config.name),
            properties: RequestRoutingRuleProperties {
                rule_type: RoutingRuleType::Basic,
                http_listener: child(&format!(
                    "/httpListeners/{listener_name}"
                )),
                backend_address_pool: child(&format!(
                    "/backendAddressPools/{pool_name}"
                )),
                backend_http_settings: child(&format!(
                    "/backendHttpSettingsCollection/{settings_name}"
                )),
            },
        }],
    };

    let api_version = resolver.resolve()?;

    Ok(ResourceDocument {
        resource_type: ResourceKind::ApplicationGateway,
        api_version,
        name: NameExpr::literal(config.name.clone()),
        location: Some(config.location.clone()),
        tags: config.tags.clone(),
        depends_on: config.depends_on.clone(),
        copy: None,
        sku: None,
        account_kind: None,
        zones: Vec::new(),
        extended_location: None,
        identity: None,
        properties: Properties::ApplicationGateway(properties),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn base_lb() -> LoadBalancerConfiguration {
        LoadBalancerConfiguration {
            name: "lb1".to_string(),
            location: "westus2".to_string(),
            frontend_public_ip_id: Some("/publicIPs/ip1".to_string()),
            ..Default::default()
        }
    }

    fn lb_properties(doc: &ResourceDocument) -> &LoadBalancerProperties {
        match &doc.properties {
            Properties::LoadBalancer(props) => props,
            other => panic!("expected load balancer properties, got {other:?}"),
        }
    }

    #[test]
    fn dual_frontends_are_ambiguous() {
        let mut config = base_lb();
        config.frontend_subnet_id = Some("/vnets/v/subnets/s".to_string());
        assert_eq!(
            compile_load_balancer(&config),
            Err(CompileError::ConfigurationAmbiguous(
                "frontend_public_ip_id",
                "frontend_subnet_id",
            ))
        );
    }

    #[test]
    fn missing_frontend_is_incomplete() {
        let mut config = base_lb();
        config.frontend_public_ip_id = None;
        assert_eq!(
            compile_load_balancer(&config),
            Err(CompileError::ConfigurationIncomplete {
                field: "frontend_public_ip_id",
                context: "a load balancer frontend",
            })
        );
    }

    #[test]
    fn internal_frontend_with_static_address() {
        let mut config = base_lb();
        config.frontend_public_ip_id = None;
        config.frontend_subnet_id = Some("/vnets/v/subnets/s".to_string());
        config.frontend_private_ip_address = Some("10.0.0.4".to_string());

        let doc = compile_load_balancer(&config).unwrap();
        let frontend =
            &lb_properties(&doc).frontend_ip_configurations[0].properties;
        assert_eq!(
            frontend.private_ip_allocation_method,
            Some(IpAllocationMethod::Static)
        );
        assert_eq!(frontend.private_ip_address.as_deref(), Some("10.0.0.4"));
    }

    #[test]
    fn nat_pools_reference_the_frontend() {
        let mut config = base_lb();
        config.nat_pools = vec![NatPoolOptions {
            name: "ssh".to_string(),
            protocol: TransportProtocol::Tcp,
            frontend_port_range_start: 50000,
            frontend_port_range_end: 50099,
            backend_port: 22,
        }];

        let doc = compile_load_balancer(&config).unwrap();
        let props = lb_properties(&doc);
        let frontend_ref = &props.inbound_nat_pools[0]
            .properties
            .frontend_ip_configuration
            .id;
        assert!(frontend_ref.contains("resourceId"));
        assert!(frontend_ref
            .contains("/frontendIPConfigurations/loadBalancerFrontEnd"));
    }

    #[test]
    fn inverted_nat_port_range_is_inconsistent() {
        let mut config = base_lb();
        config.nat_pools = vec![NatPoolOptions {
            name: "ssh".to_string(),
            protocol: TransportProtocol::Tcp,
            frontend_port_range_start: 50099,
            frontend_port_range_end: 50000,
            backend_port: 22,
        }];
        assert!(matches!(
            compile_load_balancer(&config),
            Err(CompileError::ConfigurationInconsistent { .. })
        ));
    }

    fn base_gateway() -> ApplicationGatewayConfiguration {
        ApplicationGatewayConfiguration {
            name: "gw1".to_string(),
            location: "westus2".to_string(),
            sku_name: "Standard_Small".to_string(),
            capacity: Some(2),
            subnet_id: "/vnets/v/subnets/gw".to_string(),
            frontend_public_ip_id: Some("/publicIPs/ip1".to_string()),
            frontend_port: 80,
            backend_port: 80,
            http_protocol: HttpProtocol::Http,
            cookie_based_affinity: CookieBasedAffinity::Disabled,
            backend_addresses: vec!["10.0.0.4".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn gateway_children_are_cross_wired() {
        let doc = compile_application_gateway(&base_gateway()).unwrap();
        let props = match &doc.properties {
            Properties::ApplicationGateway(props) => props,
            other => panic!("expected gateway properties, got {other:?}"),
        };

        assert_eq!(props.sku.tier, "Standard");
        let rule = &props.request_routing_rules[0].properties;
        assert!(rule.http_listener.id.contains("/httpListeners/"));
        assert!(rule
            .backend_address_pool
            .id
            .contains("/backendAddressPools/"));
        let listener = &props.http_listeners[0].properties;
        assert!(listener
            .frontend_ip_configuration
            .id
            .contains("/frontendIPConfigurations/"));
        assert!(listener.frontend_port.id.contains("/frontendPorts/"));
    }

    #[test]
    fn gateway_frontend_is_exclusive() {
        let mut config = base_gateway();
        config.frontend_private_ip = Some("10.0.0.10".to_string());
        assert_eq!(
            compile_application_gateway(&config),
            Err(CompileError::ConfigurationAmbiguous(
                "frontend_public_ip_id",
                "frontend_private_ip",
            ))
        );
    }
}
