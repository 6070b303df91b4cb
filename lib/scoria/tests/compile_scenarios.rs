// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end compilation scenarios, asserted against the serialized wire
//! form of the produced documents.

use serde_json::{json, Value};

use scoria::compile::network::{
    NicConfiguration, PublicIpConfiguration, SubnetOptions,
    VirtualNetworkConfiguration,
};
use scoria::compile::vm::{NicAttachment, VmConfiguration};
use scoria::compile::ScaleSetConfiguration;
use scoria::compile::common::OsProfileOptions;
use scoria::storage_profile::{MarketplaceImage, StorageSourceOptions};
use scoria::ResourceConfiguration;

fn ubuntu() -> MarketplaceImage {
    MarketplaceImage {
        publisher: "Canonical".to_string(),
        offer: "UbuntuServer".to_string(),
        sku: "22_04-lts".to_string(),
        version: "latest".to_string(),
    }
}

fn linux_vm() -> VmConfiguration {
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

fn to_json(config: &ResourceConfiguration) -> Value {
    let doc = config.compile().expect("configuration should compile");
    serde_json::to_value(&doc).expect("document should serialize")
}

#[test]
fn linux_vm_wire_shape() {
    let value =
        to_json(&ResourceConfiguration::VirtualMachine(Box::new(linux_vm())));

    assert_eq!(value["type"], "Microsoft.Compute/virtualMachines");
    assert_eq!(value["name"], "vm1");
    assert_eq!(value["apiVersion"], "2022-08-01");
    assert_eq!(
        value["properties"]["hardwareProfile"]["vmSize"],
        "Standard_D2s_v3"
    );
    assert_eq!(
        value["properties"]["storageProfile"]["imageReference"],
        json!({
            "publisher": "Canonical",
            "offer": "UbuntuServer",
            "sku": "22_04-lts",
            "version": "latest",
        })
    );

    // The password rides as a deployment-parameter reference, never inline.
    assert_eq!(
        value["properties"]["osProfile"]["adminPassword"],
        "[parameters('adminPassword')]"
    );

    // No toggles set, so the security sub-tree is absent, not empty.
    assert!(value["properties"].get("securityProfile").is_none());

    assert_eq!(
        value["dependsOn"],
        json!(["Microsoft.Network/networkInterfaces/vm1-nic"])
    );
}

#[test]
fn trusted_launch_linux_vm_raises_version_and_nests_uefi_settings() {
    let mut config = linux_vm();
    config.os_profile.ssh_public_keys =
        vec!["ssh-ed25519 AAAA...".to_string()];
    config.os_profile.admin_password_parameter = None;
    config.os_profile.patch_mode = Some(
        scoria_api_types::properties::compute::PatchMode::AutomaticByPlatform,
    );
    config.security.enable_secure_boot = Some(true);
    config.security.enable_vtpm = Some(true);

    let value = to_json(&ResourceConfiguration::VirtualMachine(Box::new(config)));

    let linux = &value["properties"]["osProfile"]["linuxConfiguration"];
    assert_eq!(linux["disablePasswordAuthentication"], true);
    assert_eq!(
        linux["patchSettings"]["patchMode"],
        "AutomaticByPlatform"
    );
    assert_eq!(
        linux["ssh"]["publicKeys"][0]["path"],
        "/home/azureuser/.ssh/authorized_keys"
    );

    let uefi = &value["properties"]["securityProfile"]["uefiSettings"];
    assert_eq!(uefi["secureBootEnabled"], true);
    assert_eq!(uefi["vTpmEnabled"], true);

    // TrustedLaunch outranks the machine baseline.
    assert!(value["apiVersion"].as_str().unwrap() >= "2020-12-01");
}

#[test]
fn windows_manual_patch_mode_wire_shape() {
    let mut config = linux_vm();
    config.storage.marketplace_image = Some(MarketplaceImage {
        publisher: "MicrosoftWindowsServer".to_string(),
        offer: "WindowsServer".to_string(),
        sku: "2022-datacenter".to_string(),
        version: "latest".to_string(),
    });
    config.os_profile.patch_mode =
        Some(scoria_api_types::properties::compute::PatchMode::Manual);

    let value = to_json(&ResourceConfiguration::VirtualMachine(Box::new(config)));
    assert_eq!(
        value["properties"]["osProfile"]["windowsConfiguration"]
            ["patchSettings"]["patchMode"],
        "Manual"
    );
    assert!(value["properties"]["osProfile"]
        .get("linuxConfiguration")
        .is_none());
}

#[test]
fn batched_vm_rewrites_names_into_copy_index_expressions() {
    let mut config = linux_vm();
    config.count = Some(3);

    let value = to_json(&ResourceConfiguration::VirtualMachine(Box::new(config)));

    assert_eq!(value["name"], "[concat('vm1', copyIndex())]");
    assert_eq!(
        value["copy"],
        json!({ "name": "vm1copy", "count": 3, "mode": "parallel" })
    );
    assert_eq!(
        value["properties"]["osProfile"]["computerName"],
        "[concat('vm1', copyIndex())]"
    );

    let nic_id = value["properties"]["networkProfile"]["networkInterfaces"][0]
        ["id"]
        .as_str()
        .unwrap();
    assert!(nic_id.contains("copyIndex()"), "nic id not rewritten: {nic_id}");

    let edge = value["dependsOn"][0].as_str().unwrap();
    assert!(edge.contains("copyIndex()"), "edge not rewritten: {edge}");
}

#[test]
fn nic_chain_depends_on_its_public_ip() {
    let vnet = VirtualNetworkConfiguration {
        name: "vnet1".to_string(),
        location: "westus2".to_string(),
        address_prefixes: vec!["10.0.0.0/16".to_string()],
        subnets: vec![SubnetOptions {
            name: "default".to_string(),
            address_prefix: "10.0.0.0/24".to_string(),
            network_security_group_id: None,
        }],
        ..Default::default()
    };
    let vnet_value = to_json(&ResourceConfiguration::VirtualNetwork(vnet));
    assert_eq!(vnet_value["type"], "Microsoft.Network/virtualNetworks");
    assert_eq!(
        vnet_value["properties"]["addressSpace"]["addressPrefixes"][0],
        "10.0.0.0/16"
    );

    let ip = PublicIpConfiguration {
        name: "vm1-ip".to_string(),
        location: "westus2".to_string(),
        dns_name_label: Some("myapp".to_string()),
        ..Default::default()
    };
    let ip_value = to_json(&ResourceConfiguration::PublicIpAddress(ip));
    assert_eq!(
        ip_value["properties"]["dnsSettings"]["domainNameLabel"],
        "myapp"
    );
    assert_eq!(
        ip_value["properties"]["publicIPAllocationMethod"],
        "Dynamic"
    );

    let nic = NicConfiguration {
        name: "vm1-nic".to_string(),
        location: "westus2".to_string(),
        subnet_id: "/vnets/vnet1/subnets/default".to_string(),
        public_ip_name: Some("vm1-ip".to_string()),
        ..Default::default()
    };
    let nic_value = to_json(&ResourceConfiguration::NetworkInterface(nic));
    assert_eq!(
        nic_value["dependsOn"],
        json!(["Microsoft.Network/publicIPAddresses/vm1-ip"])
    );
    assert_eq!(
        nic_value["properties"]["ipConfigurations"][0]["properties"]
            ["publicIPAddress"]["id"],
        "[resourceId('Microsoft.Network/publicIPAddresses', 'vm1-ip')]"
    );
}

#[test]
fn scale_set_wire_shape() {
    let config = ScaleSetConfiguration {
        name: "vmss1".to_string(),
        location: "westus2".to_string(),
        vm_size: "Standard_D2s_v3".to_string(),
        instance_count: 4,
        storage: StorageSourceOptions {
            marketplace_image: Some(ubuntu()),
            ..Default::default()
        },
        os_profile: OsProfileOptions {
            admin_username: Some("azureuser".to_string()),
            admin_password_parameter: Some("adminPassword".to_string()),
            ..Default::default()
        },
        subnet_id: Some("/vnets/vnet1/subnets/default".to_string()),
        overprovision: Some(true),
        ..Default::default()
    };

    let value = to_json(&ResourceConfiguration::VirtualMachineScaleSet(
        Box::new(config),
    ));

    assert_eq!(value["type"], "Microsoft.Compute/virtualMachineScaleSets");
    assert_eq!(
        value["sku"],
        json!({ "name": "Standard_D2s_v3", "tier": "Standard", "capacity": 4 })
    );
    assert!(value.get("copy").is_none());
    assert_eq!(value["properties"]["overprovision"], true);

    let nic = &value["properties"]["virtualMachineProfile"]["networkProfile"]
        ["networkInterfaceConfigurations"][0];
    assert_eq!(nic["properties"]["primary"], true);
    assert_eq!(
        nic["properties"]["ipConfigurations"][0]["properties"]["subnet"]
            ["id"],
        "/vnets/vnet1/subnets/default"
    );
}

#[test]
fn compile_never_loses_determinism_across_dispatch() {
    let config =
        ResourceConfiguration::VirtualMachine(Box::new(linux_vm()));
    let first = config.compile().unwrap();
    let second = config.compile().unwrap();
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
