// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-kind `properties` sub-trees.
//!
//! A document's resource kind is declared by its envelope `type` field, so
//! the properties union serializes untagged; each variant is the typed
//! sub-tree for exactly one kind.

use schemars::JsonSchema;
use serde::Serialize;

pub mod compute;
pub mod network;

#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum Properties {
    VirtualMachine(Box<compute::VirtualMachineProperties>),
    ScaleSet(Box<compute::ScaleSetProperties>),
    AvailabilitySet(compute::AvailabilitySetProperties),
    NetworkInterface(network::NetworkInterfaceProperties),
    PublicIpAddress(network::PublicIpProperties),
    NetworkSecurityGroup(network::NetworkSecurityGroupProperties),
    VirtualNetwork(network::VirtualNetworkProperties),
    LoadBalancer(network::LoadBalancerProperties),
    ApplicationGateway(network::ApplicationGatewayProperties),
    StorageAccount(StorageAccountProperties),
    RoleAssignment(RoleAssignmentProperties),
}

/// Storage account properties. The account's SKU and kind live on the
/// document envelope; the legacy `accountType` property is retained for
/// templates pinned to the floor schema version.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageAccountProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
}

/// A role assignment binding a principal (usually a sibling document's
/// managed identity) to a role definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignmentProperties {
    pub role_definition_id: String,

    /// The assignee. For a system-assigned identity this is a `reference()`
    /// expression over the sibling document, evaluated by the engine at
    /// provisioning time.
    pub principal_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}
