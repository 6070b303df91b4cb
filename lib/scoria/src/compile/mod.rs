// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-kind resource compilers.
//!
//! Each resource kind has its own configuration struct and compile routine;
//! [`ResourceConfiguration`] ties them together so callers can hold and
//! dispatch heterogeneous configurations. All kinds share the same skeleton:
//! validate the configuration, assemble the properties sub-tree while
//! claiming version-gated features with a
//! [`crate::resolver::VersionResolver`], then resolve the declared schema
//! version last and wrap everything in the document envelope.

use scoria_api_types::ResourceDocument;

use crate::error::CompileError;

pub mod common;

pub mod load_balancer;
pub mod network;
pub mod scale_set;
pub mod support;
pub mod vm;

pub use load_balancer::{
    ApplicationGatewayConfiguration, LoadBalancerConfiguration,
};
pub use network::{
    NicConfiguration, NsgConfiguration, PublicIpConfiguration,
    VirtualNetworkConfiguration,
};
pub use scale_set::ScaleSetConfiguration;
pub use support::{
    AvailabilitySetConfiguration, RoleAssignmentConfiguration,
    StorageAccountConfiguration,
};
pub use vm::VmConfiguration;

/// A configuration for one resource to compile, tagged by resource kind.
#[derive(Clone, Debug)]
pub enum ResourceConfiguration {
    VirtualMachine(Box<VmConfiguration>),
    VirtualMachineScaleSet(Box<ScaleSetConfiguration>),
    AvailabilitySet(AvailabilitySetConfiguration),
    NetworkInterface(NicConfiguration),
    PublicIpAddress(PublicIpConfiguration),
    NetworkSecurityGroup(NsgConfiguration),
    VirtualNetwork(VirtualNetworkConfiguration),
    LoadBalancer(LoadBalancerConfiguration),
    ApplicationGateway(ApplicationGatewayConfiguration),
    StorageAccount(StorageAccountConfiguration),
    RoleAssignment(RoleAssignmentConfiguration),
}

impl ResourceConfiguration {
    /// Compiles this configuration into exactly one resource document.
    pub fn compile(&self) -> Result<ResourceDocument, CompileError> {
        match self {
            Self::VirtualMachine(config) => vm::compile(config),
            Self::VirtualMachineScaleSet(config) => scale_set::compile(config),
            Self::AvailabilitySet(config) => {
                support::compile_availability_set(config)
            }
            Self::NetworkInterface(config) => network::compile_nic(config),
            Self::PublicIpAddress(config) => {
                network::compile_public_ip(config)
            }
            Self::NetworkSecurityGroup(config) => {
                network::compile_nsg(config)
            }
            Self::VirtualNetwork(config) => {
                network::compile_virtual_network(config)
            }
            Self::LoadBalancer(config) => {
                load_balancer::compile_load_balancer(config)
            }
            Self::ApplicationGateway(config) => {
                load_balancer::compile_application_gateway(config)
            }
            Self::StorageAccount(config) => {
                support::compile_storage_account(config)
            }
            Self::RoleAssignment(config) => {
                support::compile_role_assignment(config)
            }
        }
    }
}

/// Rejects an empty required string field.
pub(crate) fn require_nonempty(
    value: &str,
    field: &'static str,
    context: &'static str,
) -> Result<(), CompileError> {
    if value.is_empty() {
        Err(CompileError::ConfigurationIncomplete { field, context })
    } else {
        Ok(())
    }
}
