// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The virtual machine compiler.

use std::collections::BTreeMap;

use scoria_api_types::properties::compute::{
    AdditionalCapabilities, BootDiagnostics, Caching,
    CapacityReservationProfile, CreateOption, DataDisk, DiagnosticsProfile,
    HardwareProfile, ManagedDiskParameters, NetworkProfile, NicReference,
    NicReferenceProperties, OsType, VirtualHardDisk, VirtualMachineProperties,
    VmSizeProperties,
};
use scoria_api_types::{
    resource_id, DependencyEdge, ExtendedLocation, ExtendedLocationType,
    Feature, Properties, ResourceDocument, ResourceKind, SubResource,
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

/// One data disk. Disks either attach an existing managed disk or create an
/// empty one of a given size.
#[derive(Clone, Debug, Default)]
pub struct DataDiskOptions {
    /// Logical unit number; defaults to the disk's position in the list.
    pub lun: Option<u32>,

    pub name: Option<String>,
    pub size_gb: Option<u32>,
    pub attach_disk_id: Option<String>,
    pub caching: Option<Caching>,
    pub write_accelerator: bool,
}

/// A reference to a sibling NIC document by name.
#[derive(Clone, Debug)]
pub struct NicAttachment {
    pub name: String,
    pub primary: bool,
}

/// Everything needed to compile one virtual machine document.
#[derive(Clone, Debug, Default)]
pub struct VmConfiguration {
    pub name: String,
    pub location: String,
    pub tags: BTreeMap<String, String>,

    /// The feature-gating table for the target schema vintage.
    pub version_table: VersionTable,

    /// Instantiate the document this many times. Values above 1 attach a
    /// parallel copy directive and switch every engine-dereferenced name to
    /// its indexed form.
    pub count: Option<u32>,

    pub size: String,
    pub storage: StorageSourceOptions,

    pub data_disks: Vec<DataDiskOptions>,

    /// Positional side lists; when non-empty, each must have exactly one
    /// entry per data disk.
    pub data_disk_encryption_set_ids: Vec<String>,
    pub data_disk_iops: Vec<u32>,
    pub data_disk_mbps: Vec<u32>,

    pub os_profile: OsProfileOptions,
    pub security: SecurityProfileOptions,
    pub identity: IdentityOptions,
    pub spot: SpotOptions,

    /// Sibling NIC documents this machine attaches, in order.
    pub nics: Vec<NicAttachment>,

    pub availability_set_id: Option<String>,
    pub zone: Option<String>,
    pub edge_zone: Option<String>,

    pub ultra_ssd_enabled: Option<bool>,
    pub enable_hibernation: Option<bool>,
    pub capacity_reservation_group_id: Option<String>,
    pub dedicated_host_id: Option<String>,
    pub dedicated_host_group_id: Option<String>,
    pub license_type: Option<String>,
    pub boot_diagnostics_storage_uri: Option<String>,
    pub user_data: Option<String>,

    pub vcpus_available: Option<u32>,
    pub vcpus_per_core: Option<u32>,

    /// Additional dependency edges beyond the attached NICs.
    pub depends_on: Vec<DependencyEdge>,
}

impl VmConfiguration {
    /// The guest OS, when it can be determined. Marketplace images name
    /// their OS through the publisher/offer coordinate; other sources rely
    /// on an explicit `os_type`.
    fn guest_os(&self) -> Option<OsType> {
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

pub(crate) fn compile(
    config: &VmConfiguration,
) -> Result<ResourceDocument, CompileError> {
    require_nonempty(&config.name, "name", "a virtual machine")?;
    require_nonempty(&config.location, "location", "a virtual machine")?;
    require_nonempty(&config.size, "size", "a virtual machine")?;

    let namer = Namer::new(config.count);
    let mut resolver =
        VersionResolver::new(&config.version_table, ResourceKind::VirtualMachine);

    let (variant, mut storage_profile) =
        config.storage.build(&config.name, &namer, &mut resolver)?;
    storage_profile.data_disks = build_data_disks(config, &namer, &mut resolver)?;

    // Specialized machines carry their OS state on the attached disk; an OS
    // profile would be rejected by the engine.
    let os_profile = if variant.attaches_existing_disk() {
        None
    } else {
        Some(config.os_profile.build(
            config.guest_os(),
            &config.name,
            &namer,
            &mut resolver,
        )?)
    };

    let security_profile = config.security.build(&mut resolver);
    config.spot.claim(&mut resolver);

    let network_profile = (!config.nics.is_empty()).then(|| NetworkProfile {
        network_interfaces: config
            .nics
            .iter()
            .map(|nic| NicReference {
                id: resource_id(
                    ResourceKind::NetworkInterface,
                    &namer.name(nic.name.as_str()),
                ),
                properties: (config.nics.len() > 1).then(|| {
                    NicReferenceProperties { primary: nic.primary }
                }),
            })
            .collect(),
    });

    let mut depends_on = config.depends_on.clone();
    depends_on.extend(config.nics.iter().map(|nic| DependencyEdge {
        kind: ResourceKind::NetworkInterface,
        name: namer.name(nic.name.as_str()),
    }));

    let additional_capabilities = (config.ultra_ssd_enabled.is_some()
        || config.enable_hibernation.is_some())
    .then(|| AdditionalCapabilities {
        ultra_ssd_enabled: config.ultra_ssd_enabled,
        hibernation_enabled: config.enable_hibernation,
    });

    let vm_size_properties = (config.vcpus_available.is_some()
        || config.vcpus_per_core.is_some())
    .then(|| VmSizeProperties {
        vcpus_available: config.vcpus_available,
        vcpus_per_core: config.vcpus_per_core,
    });

    resolver.require_if(config.ultra_ssd_enabled.is_some(), Feature::UltraSsd);
    resolver
        .require_if(config.enable_hibernation.is_some(), Feature::Hibernation);
    resolver.require_if(
        config.capacity_reservation_group_id.is_some(),
        Feature::CapacityReservation,
    );
    resolver.require_if(
        config.dedicated_host_id.is_some()
            || config.dedicated_host_group_id.is_some(),
        Feature::DedicatedHost,
    );
    resolver
        .require_if(vm_size_properties.is_some(), Feature::VmSizeProperties);
    resolver.require_if(config.zone.is_some(), Feature::AvailabilityZones);
    resolver.require_if(config.edge_zone.is_some(), Feature::EdgeZone);

    let properties = VirtualMachineProperties {
        hardware_profile: HardwareProfile {
            vm_size: config.size.clone(),
            vm_size_properties,
        },
        storage_profile,
        os_profile,
        network_profile,
        security_profile,
        additional_capabilities,
        diagnostics_profile: config.boot_diagnostics_storage_uri.as_ref().map(
            |uri| DiagnosticsProfile {
                boot_diagnostics: BootDiagnostics {
                    enabled: true,
                    storage_uri: Some(uri.clone()),
                },
            },
        ),
        availability_set: config
            .availability_set_id
            .clone()
            .map(SubResource::new),
        capacity_reservation: config
            .capacity_reservation_group_id
            .clone()
            .map(|id| CapacityReservationProfile {
                capacity_reservation_group: SubResource::new(id),
            }),
        host: config.dedicated_host_id.clone().map(SubResource::new),
        host_group: config.dedicated_host_group_id.clone().map(SubResource::new),
        priority: config.spot.priority,
        eviction_policy: config.spot.eviction_policy,
        billing_profile: config.spot.billing_profile(),
        license_type: config.license_type.clone(),
        user_data: config.user_data.clone(),
    };

    // All flags have been inspected; only now is the declared version fixed.
    let api_version = resolver.resolve()?;

    Ok(ResourceDocument {
        resource_type: ResourceKind::VirtualMachine,
        api_version,
        name: namer.name(config.name.as_str()),
        location: Some(config.location.clone()),
        tags: config.tags.clone(),
        depends_on,
        copy: namer.copy_directive(&format!("{}copy", config.name)),
        sku: None,
        account_kind: None,
        zones: config.zone.clone().into_iter().collect(),
        extended_location: config.edge_zone.clone().map(|name| {
            ExtendedLocation {
                name,
                location_type: ExtendedLocationType::EdgeZone,
            }
        }),
        identity: config.identity.build(),
        properties: Properties::VirtualMachine(Box::new(properties)),
    })
}

fn build_data_disks(
    config: &VmConfiguration,
    namer: &Namer,
    resolver: &mut VersionResolver<'_>,
) -> Result<Vec<DataDisk>, CompileError> {
    let disk_count = config.data_disks.len();
    for (list, len) in [
        (
            "data_disk_encryption_set_ids",
            config.data_disk_encryption_set_ids.len(),
        ),
        ("data_disk_iops", config.data_disk_iops.len()),
        ("data_disk_mbps", config.data_disk_mbps.len()),
    ] {
        if len != 0 && len != disk_count {
            return Err(CompileError::ConfigurationInconsistent {
                list,
                expected: disk_count,
                actual: len,
            });
        }
    }

    let unmanaged = config.storage.use_unmanaged_disk;
    if unmanaged && !config.data_disk_encryption_set_ids.is_empty() {
        return Err(CompileError::ConfigurationAmbiguous(
            "use_unmanaged_disk",
            "data_disk_encryption_set_ids",
        ));
    }

    resolver.require_if(
        !config.data_disk_encryption_set_ids.is_empty(),
        Feature::DiskEncryptionSet,
    );
    // Per-disk IOPS/throughput settings only exist on ultra disks.
    resolver.require_if(
        !config.data_disk_iops.is_empty() || !config.data_disk_mbps.is_empty(),
        Feature::UltraSsd,
    );

    let mut disks = Vec::with_capacity(disk_count);
    for (index, disk) in config.data_disks.iter().enumerate() {
        let name = disk
            .name
            .clone()
            .unwrap_or_else(|| format!("{}-datadisk-{index}", config.name));

        let (create_option, vhd, managed_disk) =
            match (&disk.attach_disk_id, unmanaged) {
                (Some(_), true) => {
                    return Err(CompileError::ConfigurationAmbiguous(
                        "use_unmanaged_disk",
                        "attach_disk_id",
                    ));
                }
                (Some(id), false) => (
                    CreateOption::Attach,
                    None,
                    Some(ManagedDiskParameters {
                        id: Some(id.clone()),
                        storage_account_type: None,
                        disk_encryption_set: config
                            .data_disk_encryption_set_ids
                            .get(index)
                            .cloned()
                            .map(SubResource::new),
                    }),
                ),
                (None, _) => {
                    if disk.size_gb.is_none() {
                        return Err(CompileError::ConfigurationIncomplete {
                            field: "size_gb",
                            context: "an empty data disk",
                        });
                    }

                    let vhd = unmanaged
                        .then(|| -> Result<_, CompileError> {
                            let container = config
                                .storage
                                .os_vhd_container_uri
                                .as_deref()
                                .ok_or(
                                    CompileError::ConfigurationIncomplete {
                                        field: "os_vhd_container_uri",
                                        context: "an unmanaged data disk",
                                    },
                                )?;
                            Ok(VirtualHardDisk {
                                uri: namer.suffixed(
                                    format!(
                                        "{}/{name}",
                                        container.trim_end_matches('/')
                                    ),
                                    ".vhd",
                                ),
                            })
                        })
                        .transpose()?;

                    let managed_disk = (!unmanaged)
                        .then(|| {
                            let managed = ManagedDiskParameters {
                                id: None,
                                storage_account_type: None,
                                disk_encryption_set: config
                                    .data_disk_encryption_set_ids
                                    .get(index)
                                    .cloned()
                                    .map(SubResource::new),
                            };
                            (managed != ManagedDiskParameters::default())
                                .then_some(managed)
                        })
                        .flatten();

                    (CreateOption::Empty, vhd, managed_disk)
                }
            };

        disks.push(DataDisk {
            lun: disk.lun.unwrap_or(index as u32),
            name: Some(namer.name(name.as_str())),
            create_option,
            caching: disk.caching,
            vhd,
            managed_disk,
            disk_size_gb: disk.size_gb,
            disk_iops_read_write: config.data_disk_iops.get(index).copied(),
            disk_mbps_read_write: config.data_disk_mbps.get(index).copied(),
            write_accelerator_enabled: disk.write_accelerator.then_some(true),
        });
    }

    if disks.iter().any(|d| d.write_accelerator_enabled == Some(true)) {
        resolver.require(Feature::WriteAccelerator);
    }

    Ok(disks)
}

#[cfg(test)]
mod test {
    use scoria_api_types::properties::compute::PatchMode;

    use crate::storage_profile::MarketplaceImage;

    use super::*;

    fn ubuntu() -> MarketplaceImage {
        MarketplaceImage {
            publisher: "Canonical".to_string(),
            offer: "UbuntuServer".to_string(),
            sku: "22_04-lts".to_string(),
            version: "latest".to_string(),
        }
    }

    fn base_config() -> VmConfiguration {
        VmConfiguration {
            name: "vm1".to_string(),
            location: "westus2".to_string(),
            size: "Standard_D2s_v3".to_string(),
            storage: StorageSourceOptions {
                marketplace_image: Some(ubuntu()),
                ..Default::default()
            },
            os_profile: OsProfileOptions {
                admin_username: Some("azureuser".to_string()),
                admin_password_parameter: Some("adminPassword".to_string()),
                ..Default::default()
            },
            nics: vec![NicAttachment {
                name: "vm1-nic".to_string(),
                primary: true,
            }],
            ..Default::default()
        }
    }

    fn vm_properties(doc: &ResourceDocument) -> &VirtualMachineProperties {
        match &doc.properties {
            Properties::VirtualMachine(props) => props,
            other => panic!("expected VM properties, got {other:?}"),
        }
    }

    #[test]
    fn compile_is_deterministic() {
        let config = base_config();
        assert_eq!(compile(&config).unwrap(), compile(&config).unwrap());
    }

    #[test]
    fn baseline_version_with_no_features() {
        let config = base_config();
        let doc = compile(&config).unwrap();
        assert_eq!(
            doc.api_version,
            config.version_table.baseline(ResourceKind::VirtualMachine)
        );
    }

    #[test]
    fn no_security_toggles_no_security_profile() {
        let doc = compile(&base_config()).unwrap();
        assert!(vm_properties(&doc).security_profile.is_none());
    }

    #[test]
    fn secure_boot_bumps_version_and_keeps_vtpm_unset() {
        let mut config = base_config();
        config.os_profile.patch_mode = Some(PatchMode::AutomaticByPlatform);
        config.security.enable_secure_boot = Some(true);

        let doc = compile(&config).unwrap();
        let props = vm_properties(&doc);

        let linux = props
            .os_profile
            .as_ref()
            .unwrap()
            .linux_configuration
            .as_ref()
            .unwrap();
        assert_eq!(
            linux.patch_settings.as_ref().unwrap().patch_mode,
            PatchMode::AutomaticByPlatform
        );

        let uefi = props
            .security_profile
            .as_ref()
            .unwrap()
            .uefi_settings
            .as_ref()
            .unwrap();
        assert_eq!(uefi.secure_boot_enabled, Some(true));
        assert_eq!(uefi.v_tpm_enabled, None);

        assert!(
            doc.api_version
                >= config
                    .version_table
                    .feature_minimum(Feature::TrustedLaunch)
                    .unwrap()
        );
    }

    #[test]
    fn manual_patch_mode_is_windows_only() {
        let mut config = base_config();
        config.storage.marketplace_image = Some(MarketplaceImage {
            publisher: "MicrosoftWindowsServer".to_string(),
            offer: "WindowsServer".to_string(),
            sku: "2022-datacenter".to_string(),
            version: "latest".to_string(),
        });
        config.os_profile.patch_mode = Some(PatchMode::Manual);
        assert!(compile(&config).is_ok());

        let mut linux = base_config();
        linux.os_profile.patch_mode = Some(PatchMode::Manual);
        assert!(matches!(
            compile(&linux),
            Err(CompileError::UnsupportedEnumValue { .. })
        ));
    }

    #[test]
    fn encryption_set_side_list_applies_positionally() {
        let mut config = base_config();
        config.data_disks = vec![
            DataDiskOptions { size_gb: Some(64), ..Default::default() },
            DataDiskOptions { size_gb: Some(128), ..Default::default() },
        ];
        config.data_disk_encryption_set_ids =
            vec!["/des/set0".to_string(), "/des/set1".to_string()];

        let doc = compile(&config).unwrap();
        let disks = &vm_properties(&doc).storage_profile.data_disks;
        for (i, disk) in disks.iter().enumerate() {
            assert_eq!(disk.lun, i as u32);
            assert_eq!(
                disk.managed_disk
                    .as_ref()
                    .unwrap()
                    .disk_encryption_set
                    .as_ref()
                    .unwrap()
                    .id,
                format!("/des/set{i}")
            );
        }

        assert!(
            doc.api_version
                >= config
                    .version_table
                    .feature_minimum(Feature::DiskEncryptionSet)
                    .unwrap()
        );
    }

    #[test]
    fn encryption_set_side_list_covers_attached_disks() {
        let mut config = base_config();
        config.data_disks = vec![
            DataDiskOptions { size_gb: Some(64), ..Default::default() },
            DataDiskOptions {
                attach_disk_id: Some("/disks/existing1".to_string()),
                ..Default::default()
            },
        ];
        config.data_disk_encryption_set_ids =
            vec!["/des/set0".to_string(), "/des/set1".to_string()];

        let doc = compile(&config).unwrap();
        let disks = &vm_properties(&doc).storage_profile.data_disks;
        assert_eq!(disks[1].create_option, CreateOption::Attach);
        assert_eq!(
            disks[1]
                .managed_disk
                .as_ref()
                .unwrap()
                .disk_encryption_set
                .as_ref()
                .unwrap()
                .id,
            "/des/set1"
        );
        assert_eq!(
            disks[0]
                .managed_disk
                .as_ref()
                .unwrap()
                .disk_encryption_set
                .as_ref()
                .unwrap()
                .id,
            "/des/set0"
        );
    }

    #[test]
    fn mismatched_side_list_lengths_fail() {
        let mut config = base_config();
        config.data_disks =
            vec![DataDiskOptions { size_gb: Some(64), ..Default::default() }];
        config.data_disk_iops = vec![1000, 2000];

        assert_eq!(
            compile(&config),
            Err(CompileError::ConfigurationInconsistent {
                list: "data_disk_iops",
                expected: 1,
                actual: 2,
            })
        );
    }

    #[test]
    fn count_rewrites_every_dereferenced_name() {
        for count in [2u32, 5] {
            let mut config = base_config();
            config.count = Some(count);

            let doc = compile(&config).unwrap();
            let copy = doc.copy.as_ref().unwrap();
            assert_eq!(copy.count, count);

            assert!(doc.name.is_indexed());
            let props = vm_properties(&doc);
            assert!(props
                .os_profile
                .as_ref()
                .unwrap()
                .computer_name
                .as_ref()
                .unwrap()
                .is_indexed());

            let nic_ref =
                &props.network_profile.as_ref().unwrap().network_interfaces[0];
            assert!(nic_ref.id.contains("copyIndex()"));

            let edge = serde_json::to_value(&doc.depends_on[0]).unwrap();
            assert!(edge.as_str().unwrap().contains("copyIndex()"));
        }
    }

    #[test]
    fn attached_disk_machines_have_no_os_profile() {
        let mut config = base_config();
        config.storage = StorageSourceOptions {
            attach_os_disk_id: Some("/disks/disk1".to_string()),
            os_type: Some(OsType::Linux),
            ..Default::default()
        };

        let doc = compile(&config).unwrap();
        assert!(vm_properties(&doc).os_profile.is_none());
    }

    #[test]
    fn edge_zone_placement_is_gated_and_emitted() {
        let mut config = base_config();
        config.edge_zone = Some("losangeles".to_string());

        let doc = compile(&config).unwrap();
        assert_eq!(doc.extended_location.as_ref().unwrap().name, "losangeles");
        assert!(
            doc.api_version
                >= config
                    .version_table
                    .feature_minimum(Feature::EdgeZone)
                    .unwrap()
        );
    }

    #[test]
    fn missing_size_is_incomplete() {
        let mut config = base_config();
        config.size = String::new();
        assert_eq!(
            compile(&config),
            Err(CompileError::ConfigurationIncomplete {
                field: "size",
                context: "a virtual machine",
            })
        );
    }
}
