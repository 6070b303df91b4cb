// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schema version resolution.
//!
//! Per-kind compilers claim features while assembling a document's structure;
//! the claimed set is only folded into a declared version once all flags have
//! been inspected, via [`VersionResolver::resolve`]. Resolving after the fact
//! (instead of bumping a running version inline) keeps structural decisions
//! from pinning the document to a version that a later feature claim would
//! have raised.

use std::collections::BTreeSet;

use scoria_api_types::{ApiVersion, Feature, ResourceKind, VersionTable};

use crate::error::CompileError;

/// Accumulates the version-gated features toggled on by one compile call and
/// resolves the document's declared schema version.
#[derive(Clone, Debug)]
pub struct VersionResolver<'a> {
    table: &'a VersionTable,
    kind: ResourceKind,
    features: BTreeSet<Feature>,
}

impl<'a> VersionResolver<'a> {
    pub fn new(table: &'a VersionTable, kind: ResourceKind) -> Self {
        Self { table, kind, features: BTreeSet::new() }
    }

    /// Records that the document uses `feature`.
    pub fn require(&mut self, feature: Feature) {
        self.features.insert(feature);
    }

    /// Records `feature` only when `toggled` is set.
    pub fn require_if(&mut self, toggled: bool, feature: Feature) {
        if toggled {
            self.features.insert(feature);
        }
    }

    /// Consumes the resolver and yields the declared version: the maximum of
    /// the kind baseline and every claimed feature's minimum. The running
    /// maximum is never lowered.
    pub fn resolve(self) -> Result<ApiVersion, CompileError> {
        let mut version = self.table.baseline(self.kind);
        for feature in self.features {
            let minimum = self
                .table
                .feature_minimum(feature)
                .ok_or(CompileError::VersionUnsatisfiable(feature))?;
            version = version.max(minimum);
        }

        Ok(version)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn baseline_only_when_no_features_claimed() {
        let table = VersionTable::default();
        let resolver =
            VersionResolver::new(&table, ResourceKind::NetworkInterface);
        assert_eq!(
            resolver.resolve().unwrap(),
            table.baseline(ResourceKind::NetworkInterface)
        );
    }

    #[test]
    fn claimed_features_raise_the_version() {
        let table = VersionTable::default();
        let mut resolver =
            VersionResolver::new(&table, ResourceKind::NetworkInterface);
        resolver.require(Feature::AcceleratedNetworking);
        resolver.require(Feature::ApplicationSecurityGroups);

        let resolved = resolver.resolve().unwrap();
        assert_eq!(
            resolved,
            table.feature_minimum(Feature::ApplicationSecurityGroups).unwrap()
        );
        assert!(
            resolved
                >= table.feature_minimum(Feature::AcceleratedNetworking).unwrap()
        );
    }

    #[test]
    fn features_below_the_baseline_change_nothing() {
        let table = VersionTable::default();
        let baseline = table.baseline(ResourceKind::VirtualMachine);

        let mut resolver =
            VersionResolver::new(&table, ResourceKind::VirtualMachine);
        resolver.require(Feature::UltraSsd);
        assert_eq!(resolver.resolve().unwrap(), baseline);
    }

    #[test]
    fn unknown_feature_minimum_fails() {
        let mut table = VersionTable::default();
        table.clear_feature(Feature::EdgeZone);

        let mut resolver =
            VersionResolver::new(&table, ResourceKind::PublicIpAddress);
        resolver.require(Feature::EdgeZone);
        assert_eq!(
            resolver.resolve(),
            Err(CompileError::VersionUnsatisfiable(Feature::EdgeZone))
        );
    }

    #[test]
    fn require_if_ignores_cleared_toggles() {
        let table = VersionTable::default();
        let mut resolver =
            VersionResolver::new(&table, ResourceKind::PublicIpAddress);
        resolver.require_if(false, Feature::EdgeZone);
        assert_eq!(
            resolver.resolve().unwrap(),
            table.baseline(ResourceKind::PublicIpAddress)
        );
    }
}
