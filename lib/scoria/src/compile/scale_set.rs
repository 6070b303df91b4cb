// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The scale set compiler.
//!
//! Scale sets embed a per-instance machine template; the storage, OS, and
//! security sub-shapes are the ones the VM compiler uses, assembled here into
//! a `virtualMachineProfile` instead of top-level properties. Batch fan-out
//! is the engine's business (the SKU capacity), so scale sets never carry a
//! copy directive.

use std::collections::BTreeMap;

use scoria_api_types::properties::compute::{
    AutomaticRepairsPolicy, OrchestrationMode, RollingUpgradePolicy,
    ScaleInPolicy, ScaleInRule, ScaleSetHardwareProfile,
    ScaleSetIpConfiguration, ScaleSetIpConfigurationProperties,
    ScaleSetNetworkProfile, ScaleSetNicConfiguration, ScaleSetNicProperties,
    ScaleSetProperties, SpotRestorePolicy, UpgradeMode, UpgradePolicy,
    VirtualMachineProfile, VmSizeProperties,
};
use scoria_api_types::{
    ApiVersion, DependencyEdge, ExtendedLocation, ExtendedLocationType,
    Feature, Properties, ResourceDocument, ResourceKind, Sku, SubResource,
    VersionTable,
};

use crate::error::CompileError;
use crate::naming::Namer;
use crate::resolver::VersionResolver;
use crate::storage_profile::StorageSourceOptions;

use super::common::{
    IdentityOptions, OsProfileOptions, SecurityProfileOptions, SpotOptions,
};
use super::require_nonempty;

/// Everything needed to compile one scale set document.
#[derive(Clone, Debug, Default)]
pub struct ScaleSetConfiguration {
    pub name: String,
    pub location: String,
    pub tags: BTreeMap<String, String>,
    pub version_table: VersionTable,

    pub vm_size: String,
    pub instance_count: u32,

    pub storage: StorageSourceOptions,
    pub os_profile: OsProfileOptions,
    pub security: SecurityProfileOptions,
    pub identity: IdentityOptions,
    pub spot: SpotOptions,

    pub upgrade_policy_mode: Option<UpgradeMode>,
    pub rolling_upgrade: Option<RollingUpgradeOptions>,

    pub orchestration_mode: Option<OrchestrationMode>,

    /// Required for Flexible orchestration, where instance NICs are managed
    /// through the network control plane directly.
    pub network_api_version: Option<ApiVersion>,

    pub spot_restore_enabled: Option<bool>,
    pub spot_restore_timeout: Option<String>,

    pub automatic_repairs_grace_period: Option<String>,
    pub scale_in_rules: Vec<ScaleInRule>,

    pub overprovision: Option<bool>,
    pub single_placement_group: Option<bool>,
    pub zone_balance: Option<bool>,
    pub platform_fault_domain_count: Option<u32>,

    pub subnet_id: Option<String>,
    pub backend_pool_ids: Vec<String>,
    pub inbound_nat_pool_ids: Vec<String>,
    pub application_gateway_backend_pool_ids: Vec<String>,
    pub application_security_group_ids: Vec<String>,
    pub network_security_group_id: Option<String>,
    pub accelerated_networking: Option<bool>,
    pub health_probe_id: Option<String>,

    pub zones: Vec<String>,
    pub edge_zone: Option<String>,

    pub vcpus_available: Option<u32>,
    pub vcpus_per_core: Option<u32>,
    pub license_type: Option<String>,
    pub user_data: Option<String>,

    pub depends_on: Vec<DependencyEdge>,
}

impl ScaleSetConfiguration {
    fn guest_os(
        &self,
    ) -> Option<scoria_api_types::properties::compute::OsType> {
        use scoria_api_types::properties::compute::OsType;
        self.storage.os_type.or_else(|| {
            self.storage.marketplace_image.as_ref().map(|image| {
                let windows = image.offer.to_lowercase().contains("windows")
                    || image.publisher.to_lowercase().contains("windows");
                if windows {
                    OsType::Windows
                } else {
                    OsType::Linux
                }
            })
        })
    }
}

/// Rolling-upgrade sub-policy fields.
#[derive(Clone, Debug, Default)]
pub struct RollingUpgradeOptions {
    pub max_batch_instance_percent: Option<u32>,
    pub max_unhealthy_instance_percent: Option<u32>,
    pub max_unhealthy_upgraded_instance_percent: Option<u32>,
    pub pause_time_between_batches: Option<String>,
    pub prioritize_unhealthy_instances: Option<bool>,
    pub max_surge: Option<bool>,
}

pub(crate) fn compile(
    config: &ScaleSetConfiguration,
) -> Result<ResourceDocument, CompileError> {
    require_nonempty(&config.name, "name", "a scale set")?;
    require_nonempty(&config.location, "location", "a scale set")?;
    require_nonempty(&config.vm_size, "vm_size", "a scale set")?;

    // Instance names inside the template are expanded by the scale set
    // engine itself, never by a copy loop.
    let namer = Namer::new(None);
    let mut resolver = VersionResolver::new(
        &config.version_table,
        ResourceKind::VirtualMachineScaleSet,
    );

    let flexible =
        config.orchestration_mode == Some(OrchestrationMode::Flexible);
    if flexible && config.network_api_version.is_none() {
        return Err(CompileError::ConfigurationIncomplete {
            field: "network_api_version",
            context: "a Flexible-orchestration scale set",
        });
    }

    resolver.require_if(
        config.orchestration_mode.is_some(),
        Feature::FlexibleOrchestration,
    );
    resolver.require_if(
        config.network_api_version.is_some(),
        Feature::NetworkApiVersion,
    );
    resolver.require_if(
        config.spot_restore_enabled.is_some(),
        Feature::SpotRestorePolicy,
    );
    resolver
        .require_if(!config.scale_in_rules.is_empty(), Feature::ScaleInPolicy);
    resolver
        .require_if(!config.zones.is_empty(), Feature::AvailabilityZones);
    resolver.require_if(config.edge_zone.is_some(), Feature::EdgeZone);
    resolver.require_if(
        config.accelerated_networking.is_some(),
        Feature::AcceleratedNetworking,
    );
    resolver.require_if(
        !config.application_security_group_ids.is_empty(),
        Feature::ApplicationSecurityGroups,
    );

    let upgrade_policy = config.upgrade_policy_mode.map(|mode| {
        let rolling_upgrade_policy = config.rolling_upgrade.as_ref().map(
            |rolling| RollingUpgradePolicy {
                max_batch_instance_percent: rolling.max_batch_instance_percent,
                max_unhealthy_instance_percent: rolling
                    .max_unhealthy_instance_percent,
                max_unhealthy_upgraded_instance_percent: rolling
                    .max_unhealthy_upgraded_instance_percent,
                pause_time_between_batches: rolling
                    .pause_time_between_batches
                    .clone(),
                prioritize_unhealthy_instances: rolling
                    .prioritize_unhealthy_instances,
                max_surge: rolling.max_surge,
            },
        );
        UpgradePolicy { mode, rolling_upgrade_policy }
    });
    resolver.require_if(
        upgrade_policy
            .as_ref()
            .is_some_and(|p| p.rolling_upgrade_policy.is_some()),
        Feature::RollingUpgradePolicy,
    );

    let (_variant, storage_profile) =
        config.storage.build(&config.name, &namer, &mut resolver)?;

    let os_profile = config.os_profile.build(
        config.guest_os(),
        &config.name,
        &namer,
        &mut resolver,
    )?;
    let security_profile = config.security.build(&mut resolver);
    config.spot.claim(&mut resolver);

    let vm_size_properties = (config.vcpus_available.is_some()
        || config.vcpus_per_core.is_some())
    .then(|| VmSizeProperties {
        vcpus_available: config.vcpus_available,
        vcpus_per_core: config.vcpus_per_core,
    });
    resolver
        .require_if(vm_size_properties.is_some(), Feature::VmSizeProperties);

    let network_profile = build_network_profile(config)?;

    let virtual_machine_profile = VirtualMachineProfile {
        os_profile: Some(os_profile),
        storage_profile: Some(storage_profile),
        network_profile: Some(network_profile),
        security_profile,
        diagnostics_profile: None,
        hardware_profile: vm_size_properties
            .map(|p| ScaleSetHardwareProfile { vm_size_properties: Some(p) }),
        priority: config.spot.priority,
        eviction_policy: config.spot.eviction_policy,
        billing_profile: config.spot.billing_profile(),
        license_type: config.license_type.clone(),
        user_data: config.user_data.clone(),
    };

    let properties = ScaleSetProperties {
        overprovision: config.overprovision,
        upgrade_policy,
        single_placement_group: config.single_placement_group,
        zone_balance: config.zone_balance,
        platform_fault_domain_count: config.platform_fault_domain_count,
        orchestration_mode: config.orchestration_mode,
        spot_restore_policy: config.spot_restore_enabled.map(|enabled| {
            SpotRestorePolicy {
                enabled,
                restore_timeout: config.spot_restore_timeout.clone(),
            }
        }),
        automatic_repairs_policy: config
            .automatic_repairs_grace_period
            .clone()
            .map(|grace_period| AutomaticRepairsPolicy {
                enabled: true,
                grace_period: Some(grace_period),
            }),
        scale_in_policy: (!config.scale_in_rules.is_empty())
            .then(|| ScaleInPolicy { rules: config.scale_in_rules.clone() }),
        virtual_machine_profile: Some(virtual_machine_profile),
    };

    let api_version = resolver.resolve()?;

    Ok(ResourceDocument {
        resource_type: ResourceKind::VirtualMachineScaleSet,
        api_version,
        name: namer.name(config.name.as_str()),
        location: Some(config.location.clone()),
        tags: config.tags.clone(),
        depends_on: config.depends_on.clone(),
        copy: None,
        sku: Some(Sku {
            name: config.vm_size.clone(),
            tier: Some("Standard".to_string()),
            capacity: Some(config.instance_count),
        }),
        account_kind: None,
        zones: config.zones.clone(),
        extended_location: config.edge_zone.clone().map(|name| {
            ExtendedLocation {
                name,
                location_type: ExtendedLocationType::EdgeZone,
            }
        }),
        identity: config.identity.build(),
        properties: Properties::ScaleSet(Box::new(properties)),
    })
}

fn build_network_profile(
    config: &ScaleSetConfiguration,
) -> Result<ScaleSetNetworkProfile, CompileError> {
    let subnet_id = config.subnet_id.as_deref().ok_or(
        CompileError::ConfigurationIncomplete {
            field: "subnet_id",
            context: "a scale set network profile",
        },
    )?;

    let to_refs = |ids: &[String]| -> Vec<SubResource> {
        ids.iter().cloned().map(SubResource::new).collect()
    };

    let ip_configuration = ScaleSetIpConfiguration {
        name: scoria_api_types::NameExpr::literal(format!(
            "{}-ipconfig",
            config.name
        )),
        properties: ScaleSetIpConfigurationProperties {
            subnet: Some(SubResource::new(subnet_id)),
            load_balancer_backend_address_pools: to_refs(
                &config.backend_pool_ids,
            ),
            load_balancer_inbound_nat_pools: to_refs(
                &config.inbound_nat_pool_ids,
            ),
            application_gateway_backend_address_pools: to_refs(
                &config.application_gateway_backend_pool_ids,
            ),
            application_security_groups: to_refs(
                &config.application_security_group_ids,
            ),
        },
    };

    let nic_configuration = ScaleSetNicConfiguration {
        name: scoria_api_types::NameExpr::literal(format!(
            "{}-nic",
            config.name
        )),
        properties: ScaleSetNicProperties {
            primary: true,
            enable_accelerated_networking: config.accelerated_networking,
            network_security_group: config
                .network_security_group_id
                .clone()
                .map(SubResource::new),
            ip_configurations: vec![ip_configuration],
        },
    };

    Ok(ScaleSetNetworkProfile {
        health_probe: config.health_probe_id.clone().map(SubResource::new),
        network_api_version: config.network_api_version,
        network_interface_configurations: vec![nic_configuration],
    })
}

#[cfg(test)]
mod test {
    use crate::storage_profile::MarketplaceImage;

    use super::*;

    fn base_config() -> ScaleSetConfiguration {
        ScaleSetConfiguration {
            name: "vmss1".to_string(),
            location: "westus2".to_string(),
            vm_size: "Standard_D2s_v3".to_string(),
            instance_count: 3,
            storage: StorageSourceOptions {
                marketplace_image: Some(MarketplaceImage {
                    publisher: "Canonical".to_string(),
                    offer: "UbuntuServer".to_string(),
                    sku: "22_04-lts".to_string(),
                    version: "latest".to_string(),
                }),
                ..Default::default()
            },
            os_profile: OsProfileOptions {
                admin_username: Some("azureuser".to_string()),
                admin_password_parameter: Some("adminPassword".to_string()),
                ..Default::default()
            },
            subnet_id: Some("/vnets/vnet1/subnets/default".to_string()),
            ..Default::default()
        }
    }

    fn vmss_properties(doc: &ResourceDocument) -> &ScaleSetProperties {
        match &doc.properties {
            Properties::ScaleSet(props) => props,
            other => panic!("expected scale set properties, got {other:?}"),
        }
    }

    #[test]
    fn sku_carries_size_and_capacity() {
        let doc = compile(&base_config()).unwrap();
        let sku = doc.sku.as_ref().unwrap();
        assert_eq!(sku.name, "Standard_D2s_v3");
        assert_eq!(sku.capacity, Some(3));
        assert!(doc.copy.is_none());
    }

    #[test]
    fn flexible_orchestration_requires_network_api_version() {
        let mut config = base_config();
        config.orchestration_mode = Some(OrchestrationMode::Flexible);

        assert_eq!(
            compile(&config),
            Err(CompileError::ConfigurationIncomplete {
                field: "network_api_version",
                context: "a Flexible-orchestration scale set",
            })
        );

        config.network_api_version = Some("2021-03-01".parse().unwrap());
        let doc = compile(&config).unwrap();
        assert!(
            doc.api_version
                >= config
                    .version_table
                    .feature_minimum(Feature::FlexibleOrchestration)
                    .unwrap()
        );
    }

    #[test]
    fn rolling_upgrade_fields_are_gated() {
        let mut config = base_config();
        config.upgrade_policy_mode = Some(UpgradeMode::Rolling);
        config.rolling_upgrade = Some(RollingUpgradeOptions {
            max_batch_instance_percent: Some(20),
            prioritize_unhealthy_instances: Some(true),
            ..Default::default()
        });

        let doc = compile(&config).unwrap();
        let policy = vmss_properties(&doc).upgrade_policy.as_ref().unwrap();
        assert_eq!(policy.mode, UpgradeMode::Rolling);
        assert_eq!(
            policy
                .rolling_upgrade_policy
                .as_ref()
                .unwrap()
                .max_batch_instance_percent,
            Some(20)
        );
        assert!(
            doc.api_version
                >= config
                    .version_table
                    .feature_minimum(Feature::RollingUpgradePolicy)
                    .unwrap()
        );
    }

    #[test]
    fn spot_restore_policy_is_gated() {
        let mut config = base_config();
        config.spot_restore_enabled = Some(true);
        config.spot_restore_timeout = Some("PT1H".to_string());

        let doc = compile(&config).unwrap();
        let policy =
            vmss_properties(&doc).spot_restore_policy.as_ref().unwrap();
        assert!(policy.enabled);
        assert!(
            doc.api_version
                >= config
                    .version_table
                    .feature_minimum(Feature::SpotRestorePolicy)
                    .unwrap()
        );
    }

    #[test]
    fn missing_subnet_is_incomplete() {
        let mut config = base_config();
        config.subnet_id = None;
        assert_eq!(
            compile(&config),
            Err(CompileError::ConfigurationIncomplete {
                field: "subnet_id",
                context: "a scale set network profile",
            })
        );
    }
}
