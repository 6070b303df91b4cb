// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Compute property sub-trees: virtual machines, scale sets, and
//! availability sets.

use schemars::JsonSchema;
use serde::Serialize;

use crate::{ApiVersion, NameExpr, ParameterRef, SubResource};

/// A virtual machine's `properties` sub-tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineProperties {
    pub hardware_profile: HardwareProfile,

    pub storage_profile: StorageProfile,

    /// Absent for specialized (attached-disk) machines, which carry their OS
    /// state on the disk itself.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_profile: Option<OsProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_profile: Option<NetworkProfile>,

    /// Omitted entirely when no security toggle is set; the engine rejects a
    /// degenerate empty sub-tree on older schema versions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_profile: Option<SecurityProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_capabilities: Option<AdditionalCapabilities>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics_profile: Option<DiagnosticsProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_set: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity_reservation: Option<CapacityReservationProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_group: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub eviction_policy: Option<EvictionPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_profile: Option<BillingProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HardwareProfile {
    pub vm_size: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_size_properties: Option<VmSizeProperties>,
}

/// Guest vCPU topology overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct VmSizeProperties {
    #[serde(rename = "vCPUsAvailable", skip_serializing_if = "Option::is_none")]
    pub vcpus_available: Option<u32>,

    #[serde(rename = "vCPUsPerCore", skip_serializing_if = "Option::is_none")]
    pub vcpus_per_core: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_reference: Option<ImageReference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_disk: Option<OsDisk>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data_disks: Vec<DataDisk>,
}

/// The source image. Exactly one of the marketplace tuple, an image ID, or a
/// shared gallery ID is populated, matching the resolved storage variant.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageReference {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_gallery_image_id: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OsDisk {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<NameExpr>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_type: Option<OsType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_option: Option<CreateOption>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub caching: Option<Caching>,

    /// Backing blob for an unmanaged disk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vhd: Option<VirtualHardDisk>,

    /// Source blob for an unmanaged custom image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<VirtualHardDisk>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_disk: Option<ManagedDiskParameters>,

    #[serde(rename = "diskSizeGB", skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_disk_settings: Option<DiffDiskSettings>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_accelerator_enabled: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct VirtualHardDisk {
    pub uri: NameExpr,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManagedDiskParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_account_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_encryption_set: Option<SubResource>,
}

/// Ephemeral OS disk settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiffDiskSettings {
    pub option: DiffDiskOption,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub placement: Option<DiffDiskPlacement>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum DiffDiskOption {
    Local,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum DiffDiskPlacement {
    CacheDisk,
    ResourceDisk,
    NvmeDisk,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataDisk {
    pub lun: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<NameExpr>,

    pub create_option: CreateOption,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub caching: Option<Caching>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub vhd: Option<VirtualHardDisk>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub managed_disk: Option<ManagedDiskParameters>,

    #[serde(rename = "diskSizeGB", skip_serializing_if = "Option::is_none")]
    pub disk_size_gb: Option<u32>,

    #[serde(
        rename = "diskIOPSReadWrite",
        skip_serializing_if = "Option::is_none"
    )]
    pub disk_iops_read_write: Option<u32>,

    #[serde(
        rename = "diskMBpsReadWrite",
        skip_serializing_if = "Option::is_none"
    )]
    pub disk_mbps_read_write: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_accelerator_enabled: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum OsType {
    Windows,
    Linux,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum CreateOption {
    FromImage,
    Attach,
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum Caching {
    None,
    ReadOnly,
    ReadWrite,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OsProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub computer_name: Option<NameExpr>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_username: Option<String>,

    /// Always an indirect parameter reference; the compiler refuses to embed
    /// a password literal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<ParameterRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_data: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows_configuration: Option<WindowsConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub linux_configuration: Option<LinuxConfiguration>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WindowsConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_automatic_updates: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_settings: Option<PatchSettings>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LinuxConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_password_authentication: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh: Option<SshConfiguration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_settings: Option<PatchSettings>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SshConfiguration {
    pub public_keys: Vec<SshPublicKey>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SshPublicKey {
    pub path: String,
    pub key_data: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatchSettings {
    pub patch_mode: PatchMode,
}

/// In-guest patch orchestration modes. Which values are legal depends on the
/// guest OS; the compiler validates per OS before emitting.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema, strum::Display,
)]
pub enum PatchMode {
    #[serde(rename = "AutomaticByOS")]
    #[strum(serialize = "AutomaticByOS")]
    AutomaticByOs,
    AutomaticByPlatform,
    Manual,
    ImageDefault,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub network_interfaces: Vec<NicReference>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NicReference {
    /// A `resourceId(...)` expression or a fully qualified NIC ID.
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<NicReferenceProperties>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NicReferenceProperties {
    pub primary: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecurityProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_at_host: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_type: Option<SecurityType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub uefi_settings: Option<UefiSettings>,
}

impl SecurityProfile {
    /// True if no toggle was ever applied and the sub-tree must be dropped
    /// from the output.
    pub fn is_empty(&self) -> bool {
        self.encryption_at_host.is_none()
            && self.security_type.is_none()
            && self.uefi_settings.is_none()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum SecurityType {
    Standard,
    TrustedLaunch,
    #[serde(rename = "ConfidentialVM")]
    ConfidentialVm,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UefiSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure_boot_enabled: Option<bool>,

    #[serde(rename = "vTpmEnabled", skip_serializing_if = "Option::is_none")]
    pub v_tpm_enabled: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalCapabilities {
    #[serde(rename = "ultraSSDEnabled", skip_serializing_if = "Option::is_none")]
    pub ultra_ssd_enabled: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hibernation_enabled: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsProfile {
    pub boot_diagnostics: BootDiagnostics,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BootDiagnostics {
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_uri: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CapacityReservationProfile {
    pub capacity_reservation_group: SubResource,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum Priority {
    Regular,
    Low,
    Spot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum EvictionPolicy {
    Deallocate,
    Delete,
}

/// Spot billing. A max price of -1 means "pay up to the on-demand rate".
#[derive(Clone, Copy, Debug, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BillingProfile {
    pub max_price: f64,
}

/// A scale set's `properties` sub-tree. The instance size and count live in
/// the envelope SKU.
#[derive(Clone, Debug, Default, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSetProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overprovision: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_policy: Option<UpgradePolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_placement_group: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_balance: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_fault_domain_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub orchestration_mode: Option<OrchestrationMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub spot_restore_policy: Option<SpotRestorePolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic_repairs_policy: Option<AutomaticRepairsPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale_in_policy: Option<ScaleInPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_machine_profile: Option<VirtualMachineProfile>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpgradePolicy {
    pub mode: UpgradeMode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolling_upgrade_policy: Option<RollingUpgradePolicy>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum UpgradeMode {
    Automatic,
    Manual,
    Rolling,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RollingUpgradePolicy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_batch_instance_percent: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_unhealthy_instance_percent: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_unhealthy_upgraded_instance_percent: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pause_time_between_batches: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioritize_unhealthy_instances: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_surge: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum OrchestrationMode {
    Uniform,
    Flexible,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpotRestorePolicy {
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_timeout: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutomaticRepairsPolicy {
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub grace_period: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScaleInPolicy {
    pub rules: Vec<ScaleInRule>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum ScaleInRule {
    Default,
    OldestVM,
    NewestVM,
}

/// The per-instance template inside a scale set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_profile: Option<OsProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_profile: Option<StorageProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_profile: Option<ScaleSetNetworkProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_profile: Option<SecurityProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics_profile: Option<DiagnosticsProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_profile: Option<ScaleSetHardwareProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub eviction_policy: Option<EvictionPolicy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_profile: Option<BillingProfile>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
}

/// Scale set instances take their size from the envelope SKU, so the profile
/// only carries size property overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSetHardwareProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vm_size_properties: Option<VmSizeProperties>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSetNetworkProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_probe: Option<SubResource>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_api_version: Option<ApiVersion>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub network_interface_configurations: Vec<ScaleSetNicConfiguration>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSetNicConfiguration {
    pub name: NameExpr,
    pub properties: ScaleSetNicProperties,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSetNicProperties {
    pub primary: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_accelerated_networking: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_security_group: Option<SubResource>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ip_configurations: Vec<ScaleSetIpConfiguration>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSetIpConfiguration {
    pub name: NameExpr,
    pub properties: ScaleSetIpConfigurationProperties,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScaleSetIpConfigurationProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<SubResource>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub load_balancer_backend_address_pools: Vec<SubResource>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub load_balancer_inbound_nat_pools: Vec<SubResource>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub application_gateway_backend_address_pools: Vec<SubResource>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub application_security_groups: Vec<SubResource>,
}

/// An availability set's `properties` sub-tree. The Aligned/Classic SKU
/// rides on the envelope.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySetProperties {
    pub platform_fault_domain_count: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_update_domain_count: Option<u32>,
}
