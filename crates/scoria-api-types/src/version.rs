// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schema version tags and the declarative feature-gating table.
//!
//! The target deployment service versions its resource schema with date
//! strings ("2021-07-01"). Every optional feature a document can carry has a
//! statically known minimum schema version; a document's declared version must
//! be at least the maximum of its resource kind's baseline and the minimums of
//! every feature actually present in it. The thresholds are an artifact of one
//! provider's release history, so they live in a [`VersionTable`] that rides
//! in the compiler's configuration rather than being wired into compile logic.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A date-based schema version tag. Supports conversion from a string
/// formatted as "YYYY-MM-DD", e.g. "2021-07-01". Versions order by date.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct ApiVersion {
    year: u16,
    month: u8,
    day: u8,
}

/// Errors that can arise when parsing or constructing an [`ApiVersion`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiVersionError {
    #[error("version string {0:?} is not of the form YYYY-MM-DD")]
    Malformed(String),

    #[error("month {0} outside range of 1-12")]
    MonthOutOfRange(u8),

    #[error("day {0} outside range of 1-31")]
    DayOutOfRange(u8),
}

// Internal constructor for table literals whose validity is self-evident.
const fn ver(year: u16, month: u8, day: u8) -> ApiVersion {
    ApiVersion { year, month, day }
}

impl ApiVersion {
    pub fn new(year: u16, month: u8, day: u8) -> Result<Self, ApiVersionError> {
        if month == 0 || month > 12 {
            return Err(ApiVersionError::MonthOutOfRange(month));
        }

        if day == 0 || day > 31 {
            return Err(ApiVersionError::DayOutOfRange(day));
        }

        Ok(Self { year, month, day })
    }
}

impl FromStr for ApiVersion {
    type Err = ApiVersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ApiVersionError::Malformed(s.to_owned());
        let mut fields = s.split('-');
        let year = fields
            .next()
            .and_then(|f| (f.len() == 4).then(|| f.parse().ok()).flatten())
            .ok_or_else(malformed)?;
        let month = fields
            .next()
            .and_then(|f| (f.len() == 2).then(|| f.parse().ok()).flatten())
            .ok_or_else(malformed)?;
        let day = fields
            .next()
            .and_then(|f| (f.len() == 2).then(|| f.parse().ok()).flatten())
            .ok_or_else(malformed)?;

        if fields.next().is_some() {
            return Err(malformed());
        }

        Self::new(year, month, day)
    }
}

impl Display for ApiVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'d> Deserialize<'d> for ApiVersion {
    fn deserialize<D: Deserializer<'d>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(|e: ApiVersionError| de::Error::custom(e.to_string()))
    }
}

impl schemars::JsonSchema for ApiVersion {
    fn schema_name() -> String {
        "ApiVersion".to_string()
    }

    fn json_schema(
        gen: &mut schemars::gen::SchemaGenerator,
    ) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// The resource kinds this schema describes. Serializes as the provider's
/// qualified resource type identifier (e.g. "Microsoft.Compute/
/// virtualMachines"), which is also the value of a document's `type` field.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
pub enum ResourceKind {
    #[strum(serialize = "Microsoft.Compute/virtualMachines")]
    VirtualMachine,
    #[strum(serialize = "Microsoft.Compute/virtualMachineScaleSets")]
    VirtualMachineScaleSet,
    #[strum(serialize = "Microsoft.Compute/availabilitySets")]
    AvailabilitySet,
    #[strum(serialize = "Microsoft.Network/networkInterfaces")]
    NetworkInterface,
    #[strum(serialize = "Microsoft.Network/publicIPAddresses")]
    PublicIpAddress,
    #[strum(serialize = "Microsoft.Network/networkSecurityGroups")]
    NetworkSecurityGroup,
    #[strum(serialize = "Microsoft.Network/virtualNetworks")]
    VirtualNetwork,
    #[strum(serialize = "Microsoft.Network/loadBalancers")]
    LoadBalancer,
    #[strum(serialize = "Microsoft.Network/applicationGateways")]
    ApplicationGateway,
    #[strum(serialize = "Microsoft.Storage/storageAccounts")]
    StorageAccount,
    #[strum(serialize = "Microsoft.Authorization/roleAssignments")]
    RoleAssignment,
}

impl ResourceKind {
    /// The qualified resource type identifier for this kind.
    pub fn resource_type(&self) -> String {
        self.to_string()
    }
}

impl Serialize for ResourceKind {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'d> Deserialize<'d> for ResourceKind {
    fn deserialize<D: Deserializer<'d>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(|_| {
            de::Error::custom(format!("unknown resource type {s:?}"))
        })
    }
}

impl schemars::JsonSchema for ResourceKind {
    fn schema_name() -> String {
        "ResourceKind".to_string()
    }

    fn json_schema(
        gen: &mut schemars::gen::SchemaGenerator,
    ) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// Version-gated optional features. A feature appears here if toggling it on
/// requires the emitted document to declare a schema version at or above the
/// feature's minimum.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Debug,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Feature {
    AcceleratedNetworking,
    ApplicationSecurityGroups,
    AvailabilityZones,
    CapacityReservation,
    DedicatedHost,
    DiskEncryptionSet,
    EdgeZone,
    EncryptionAtHost,
    EphemeralOsDisk,
    FlexibleOrchestration,
    Hibernation,
    NetworkApiVersion,
    PatchSettings,
    RollingUpgradePolicy,
    ScaleInPolicy,
    SpotPriority,
    SpotRestorePolicy,
    StandardSku,
    TrustedLaunch,
    UltraSsd,
    VmSizeProperties,
    WriteAccelerator,
}

/// The declarative feature-gating table: per-kind baseline versions plus the
/// minimum version for each gated feature.
///
/// The `Default` table carries the thresholds observed in the target
/// provider's release history. Callers targeting a different schema vintage
/// can override individual entries; a toggled feature with no entry at all is
/// a compile failure, never a silent default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionTable {
    baselines: BTreeMap<ResourceKind, ApiVersion>,
    features: BTreeMap<Feature, ApiVersion>,
}

impl VersionTable {
    /// The floor used for any kind absent from the baseline map.
    pub const FLOOR: ApiVersion = ver(2015, 6, 15);

    /// The baseline schema version for documents of `kind`.
    pub fn baseline(&self, kind: ResourceKind) -> ApiVersion {
        self.baselines.get(&kind).copied().unwrap_or(Self::FLOOR)
    }

    /// The minimum schema version required by `feature`, if the table knows
    /// one.
    pub fn feature_minimum(&self, feature: Feature) -> Option<ApiVersion> {
        self.features.get(&feature).copied()
    }

    pub fn set_baseline(&mut self, kind: ResourceKind, version: ApiVersion) {
        self.baselines.insert(kind, version);
    }

    pub fn set_feature_minimum(
        &mut self,
        feature: Feature,
        version: ApiVersion,
    ) {
        self.features.insert(feature, version);
    }

    /// Removes a feature's entry. Useful for testing the behavior of
    /// configurations that toggle a feature the table can't satisfy.
    pub fn clear_feature(&mut self, feature: Feature) {
        self.features.remove(&feature);
    }
}

impl Default for VersionTable {
    fn default() -> Self {
        let baselines = BTreeMap::from([
            (ResourceKind::VirtualMachine, ver(2022, 8, 1)),
            (ResourceKind::VirtualMachineScaleSet, ver(2022, 8, 1)),
            (ResourceKind::AvailabilitySet, ver(2019, 7, 1)),
            (ResourceKind::NetworkInterface, ver(2015, 6, 15)),
            (ResourceKind::PublicIpAddress, ver(2015, 6, 15)),
            (ResourceKind::NetworkSecurityGroup, ver(2015, 6, 15)),
            (ResourceKind::VirtualNetwork, ver(2015, 6, 15)),
            (ResourceKind::LoadBalancer, ver(2015, 6, 15)),
            (ResourceKind::ApplicationGateway, ver(2015, 6, 15)),
            (ResourceKind::StorageAccount, ver(2015, 6, 15)),
            (ResourceKind::RoleAssignment, ver(2015, 7, 1)),
        ]);

        let features = BTreeMap::from([
            (Feature::AcceleratedNetworking, ver(2016, 9, 1)),
            (Feature::ApplicationSecurityGroups, ver(2017, 9, 1)),
            (Feature::AvailabilityZones, ver(2017, 6, 1)),
            (Feature::CapacityReservation, ver(2021, 4, 1)),
            (Feature::DedicatedHost, ver(2019, 3, 1)),
            (Feature::DiskEncryptionSet, ver(2019, 7, 1)),
            (Feature::EdgeZone, ver(2021, 2, 1)),
            (Feature::EncryptionAtHost, ver(2020, 6, 1)),
            (Feature::EphemeralOsDisk, ver(2019, 3, 1)),
            (Feature::FlexibleOrchestration, ver(2021, 3, 1)),
            (Feature::Hibernation, ver(2021, 3, 1)),
            (Feature::NetworkApiVersion, ver(2021, 3, 1)),
            (Feature::PatchSettings, ver(2020, 12, 1)),
            (Feature::RollingUpgradePolicy, ver(2020, 12, 1)),
            (Feature::ScaleInPolicy, ver(2019, 3, 1)),
            (Feature::SpotPriority, ver(2019, 3, 1)),
            (Feature::SpotRestorePolicy, ver(2021, 4, 1)),
            (Feature::StandardSku, ver(2019, 2, 1)),
            (Feature::TrustedLaunch, ver(2020, 12, 1)),
            (Feature::UltraSsd, ver(2018, 6, 1)),
            (Feature::VmSizeProperties, ver(2021, 7, 1)),
            (Feature::WriteAccelerator, ver(2017, 12, 1)),
        ]);

        Self { baselines, features }
    }
}

#[cfg(test)]
mod test {
    use strum::IntoEnumIterator;

    use super::*;

    const PARSE_CASES: &[(&str, Result<ApiVersion, ()>)] = &[
        ("2021-07-01", Ok(ver(2021, 7, 1))),
        ("2015-06-15", Ok(ver(2015, 6, 15))),
        ("2021-7-1", Err(())),
        ("2021-07", Err(())),
        ("2021-07-01-extra", Err(())),
        ("2021-13-01", Err(())),
        ("2021-00-01", Err(())),
        ("2021-07-32", Err(())),
        ("garbage", Err(())),
    ];

    #[test]
    fn version_from_str() {
        for (s, expected) in PARSE_CASES {
            match (s.parse::<ApiVersion>(), expected) {
                (Ok(parsed), Ok(value)) => assert_eq!(parsed, *value, "{s}"),
                (Err(_), Err(())) => {}
                (actual, _) => panic!("case {s:?} produced {actual:?}"),
            }
        }
    }

    #[test]
    fn version_display_round_trips() {
        let v = ver(2020, 12, 1);
        assert_eq!(v.to_string(), "2020-12-01");
        assert_eq!(v.to_string().parse::<ApiVersion>(), Ok(v));
    }

    #[test]
    fn version_ordering_is_by_date() {
        assert!(ver(2015, 6, 15) < ver(2016, 9, 1));
        assert!(ver(2021, 2, 1) < ver(2021, 7, 1));
        assert!(ver(2021, 7, 1) < ver(2021, 7, 2));
    }

    #[test]
    fn version_serializes_as_string() {
        let json = serde_json::to_value(ver(2019, 3, 1)).unwrap();
        assert_eq!(json, serde_json::json!("2019-03-01"));
    }

    #[test]
    fn default_table_covers_every_kind_and_feature() {
        let table = VersionTable::default();
        for kind in ResourceKind::iter() {
            assert!(table.baseline(kind) >= VersionTable::FLOOR);
        }

        for feature in Feature::iter() {
            assert!(
                table.feature_minimum(feature).is_some(),
                "no default threshold for {feature}"
            );
        }
    }

    #[test]
    fn resource_kind_round_trips_through_type_string() {
        for kind in ResourceKind::iter() {
            let json = serde_json::to_string(&kind).unwrap();
            let back: ResourceKind = serde_json::from_str(&json).unwrap();
            assert_eq!(kind, back);
        }
    }
}
