// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Compilers for the supporting kinds: availability sets, storage accounts,
//! and role assignments.

use std::collections::BTreeMap;

use scoria_api_types::properties::compute::AvailabilitySetProperties;
use scoria_api_types::properties::{
    Properties, RoleAssignmentProperties, StorageAccountProperties,
};
use scoria_api_types::{
    DependencyEdge, NameExpr, ResourceDocument, ResourceKind, Sku,
    VersionTable,
};
use uuid::Uuid;

use crate::error::CompileError;
use crate::resolver::VersionResolver;

use super::require_nonempty;

/// An availability set document's inputs.
#[derive(Clone, Debug, Default)]
pub struct AvailabilitySetConfiguration {
    pub name: String,
    pub location: String,
    pub tags: BTreeMap<String, String>,
    pub version_table: VersionTable,

    pub platform_fault_domain_count: u32,
    pub platform_update_domain_count: Option<u32>,

    /// Sets hold managed machines unless the deployment still uses unmanaged
    /// (blob-backed) disks; the distinction is declared through the SKU.
    pub unmanaged_disks: bool,

    pub depends_on: Vec<DependencyEdge>,
}

pub(crate) fn compile_availability_set(
    config: &AvailabilitySetConfiguration,
) -> Result<ResourceDocument, CompileError> {
    require_nonempty(&config.name, "name", "an availability set")?;
    require_nonempty(&config.location, "location", "an availability set")?;

    let resolver = VersionResolver::new(
        &config.version_table,
        ResourceKind::AvailabilitySet,
    );

    let sku_name = if config.unmanaged_disks { "Classic" } else { "Aligned" };

    let api_version = resolver.resolve()?;

    Ok(ResourceDocument {
        resource_type: ResourceKind::AvailabilitySet,
        api_version,
        name: NameExpr::literal(config.name.clone()),
        location: Some(config.location.clone()),
        tags: config.tags.clone(),
        depends_on: config.depends_on.clone(),
        copy: None,
        sku: Some(Sku {
            name: sku_name.to_string(),
            tier: None,
            capacity: None,
        }),
        account_kind: None,
        zones: Vec::new(),
        extended_location: None,
        identity: None,
        properties: Properties::AvailabilitySet(AvailabilitySetProperties {
            platform_fault_domain_count: config.platform_fault_domain_count,
            platform_update_domain_count: config.platform_update_domain_count,
        }),
    })
}

/// A storage account document's inputs.
#[derive(Clone, Debug, Default)]
pub struct StorageAccountConfiguration {
    pub name: String,
    pub location: String,
    pub tags: BTreeMap<String, String>,
    pub version_table: VersionTable,

    /// E.g. "Standard_LRS" or "Premium_LRS".
    pub sku_name: String,

    /// E.g. "StorageV2". Absent on templates pinned to the floor schema
    /// version, which instead carry the SKU as the legacy `accountType`
    /// property.
    pub account_kind: Option<String>,

    pub depends_on: Vec<DependencyEdge>,
}

pub(crate) fn compile_storage_account(
    config: &StorageAccountConfiguration,
) -> Result<ResourceDocument, CompileError> {
    require_nonempty(&config.name, "name", "a storage account")?;
    require_nonempty(&config.location, "location", "a storage account")?;
    require_nonempty(&config.sku_name, "sku_name", "a storage account")?;

    let resolver = VersionResolver::new(
        &config.version_table,
        ResourceKind::StorageAccount,
    );
    let api_version = resolver.resolve()?;

    // Accounts compiled at the floor version predate the envelope SKU and
    // declare the replication tier as a property instead.
    let legacy = config.account_kind.is_none();

    Ok(ResourceDocument {
        resource_type: ResourceKind::StorageAccount,
        api_version,
        name: NameExpr::literal(config.name.clone()),
        location: Some(config.location.clone()),
        tags: config.tags.clone(),
        depends_on: config.depends_on.clone(),
        copy: None,
        sku: (!legacy).then(|| Sku {
            name: config.sku_name.clone(),
            tier: None,
            capacity: None,
        }),
        account_kind: config.account_kind.clone(),
        zones: Vec::new(),
        extended_location: None,
        identity: None,
        properties: Properties::StorageAccount(StorageAccountProperties {
            account_type: legacy.then(|| config.sku_name.clone()),
        }),
    })
}

/// A role assignment document's inputs.
///
/// Assignment names are GUIDs chosen by the caller so that compiling the
/// same configuration twice yields the same document.
#[derive(Clone, Debug)]
pub struct RoleAssignmentConfiguration {
    pub name: Uuid,
    pub version_table: VersionTable,

    pub role_definition_id: String,

    /// The assignee, usually a `reference()` expression over a sibling
    /// document's system-assigned identity.
    pub principal_id: String,

    pub scope: Option<String>,

    pub depends_on: Vec<DependencyEdge>,
}

pub(crate) fn compile_role_assignment(
    config: &RoleAssignmentConfiguration,
) -> Result<ResourceDocument, CompileError> {
    require_nonempty(
        &config.role_definition_id,
        "role_definition_id",
        "a role assignment",
    )?;
    require_nonempty(&config.principal_id, "principal_id", "a role assignment")?;

    let resolver = VersionResolver::new(
        &config.version_table,
        ResourceKind::RoleAssignment,
    );
    let api_version = resolver.resolve()?;

    Ok(ResourceDocument {
        resource_type: ResourceKind::RoleAssignment,
        api_version,
        name: NameExpr::literal(config.name.to_string()),
        // Assignments are scoped, not placed; they carry no location.
        location: None,
        tags: BTreeMap::new(),
        depends_on: config.depends_on.clone(),
        copy: None,
        sku: None,
        account_kind: None,
        zones: Vec::new(),
        extended_location: None,
        identity: None,
        properties: Properties::RoleAssignment(RoleAssignmentProperties {
            role_definition_id: config.role_definition_id.clone(),
            principal_id: config.principal_id.clone(),
            scope: config.scope.clone(),
        }),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn availability_set_sku_tracks_disk_management() {
        let mut config = AvailabilitySetConfiguration {
            name: "avset1".to_string(),
            location: "westus2".to_string(),
            platform_fault_domain_count: 2,
            platform_update_domain_count: Some(5),
            ..Default::default()
        };

        let doc = compile_availability_set(&config).unwrap();
        assert_eq!(doc.sku.as_ref().unwrap().name, "Aligned");

        config.unmanaged_disks = true;
        let doc = compile_availability_set(&config).unwrap();
        assert_eq!(doc.sku.as_ref().unwrap().name, "Classic");
    }

    #[test]
    fn modern_storage_account_uses_the_envelope_sku() {
        let config = StorageAccountConfiguration {
            name: "stor1".to_string(),
            location: "westus2".to_string(),
            sku_name: "Premium_LRS".to_string(),
            account_kind: Some("StorageV2".to_string()),
            ..Default::default()
        };

        let doc = compile_storage_account(&config).unwrap();
        assert_eq!(doc.sku.as_ref().unwrap().name, "Premium_LRS");
        assert_eq!(doc.account_kind.as_deref(), Some("StorageV2"));
        assert_eq!(
            doc.properties,
            Properties::StorageAccount(StorageAccountProperties {
                account_type: None
            })
        );
    }

    #[test]
    fn legacy_storage_account_uses_the_account_type_property() {
        let config = StorageAccountConfiguration {
            name: "stor1".to_string(),
            location: "westus2".to_string(),
            sku_name: "Standard_LRS".to_string(),
            account_kind: None,
            ..Default::default()
        };

        let doc = compile_storage_account(&config).unwrap();
        assert!(doc.sku.is_none());
        assert!(doc.account_kind.is_none());
        assert_eq!(
            doc.properties,
            Properties::StorageAccount(StorageAccountProperties {
                account_type: Some("Standard_LRS".to_string())
            })
        );
    }

    #[test]
    fn role_assignment_is_unplaced_and_guid_named() {
        let name =
            Uuid::parse_str("7f5d3f8e-1f44-4f52-9f61-2b3c4d5e6f70").unwrap();
        let config = RoleAssignmentConfiguration {
            name,
            version_table: VersionTable::default(),
            role_definition_id: "/roleDefinitions/contributor".to_string(),
            principal_id:
                "[reference('vm1', '2022-08-01', 'Full').identity.principalId]"
                    .to_string(),
            scope: None,
            depends_on: Vec::new(),
        };

        let doc = compile_role_assignment(&config).unwrap();
        assert!(doc.location.is_none());
        assert_eq!(doc.name, NameExpr::literal(name.to_string()));
    }

    #[test]
    fn role_assignment_requires_a_principal() {
        let config = RoleAssignmentConfiguration {
            name: Uuid::nil(),
            version_table: VersionTable::default(),
            role_definition_id: "/roleDefinitions/contributor".to_string(),
            principal_id: String::new(),
            scope: None,
            depends_on: Vec::new(),
        };
        assert_eq!(
            compile_role_assignment(&config),
            Err(CompileError::ConfigurationIncomplete {
                field: "principal_id",
                context: "a role assignment",
            })
        );
    }
}
