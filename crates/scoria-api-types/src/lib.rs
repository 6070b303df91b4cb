// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Wire-format types for compiled resource description documents.
//!
//! These types mirror the deployment service's JSON template grammar: a
//! document's field names, nesting, and accepted enumerations are a fixed
//! external contract, so the serde attributes here reproduce that contract
//! exactly. Documents are producer-side values (the compiler emits them and an
//! external collaborator serializes and submits them), so the envelope and
//! property types implement `Serialize` but generally not `Deserialize`.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Serialize, Serializer};

pub mod properties;
pub mod version;

pub use properties::Properties;
pub use version::{ApiVersion, Feature, ResourceKind, VersionTable};

/// A name-bearing field value: either a literal name or an
/// index-parameterized name expression for batch ("copy") deployments.
///
/// The indexed form serializes to the deployment engine's copy-index
/// expression, e.g. `[concat('node', copyIndex())]`. A non-empty suffix is
/// appended after the index, which lets VHD URIs and similar composite names
/// keep their extensions: `[concat('vhds/osdisk', copyIndex(), '.vhd')]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameExpr {
    Literal(String),
    Indexed { prefix: String, suffix: String },
}

impl NameExpr {
    pub fn literal<S: Into<String>>(s: S) -> Self {
        Self::Literal(s.into())
    }

    pub fn indexed<S: Into<String>>(prefix: S) -> Self {
        Self::Indexed { prefix: prefix.into(), suffix: String::new() }
    }

    /// True if this name is parameterized by the copy index.
    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed { .. })
    }

    /// The expression fragment for this name as it appears inside a larger
    /// template expression (no enclosing brackets).
    fn fragment(&self) -> String {
        match self {
            Self::Literal(name) => format!("'{name}'"),
            Self::Indexed { prefix, suffix } if suffix.is_empty() => {
                format!("concat('{prefix}', copyIndex())")
            }
            Self::Indexed { prefix, suffix } => {
                format!("concat('{prefix}', copyIndex(), '{suffix}')")
            }
        }
    }
}

impl Serialize for NameExpr {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Literal(name) => s.serialize_str(name),
            indexed => s.serialize_str(&format!("[{}]", indexed.fragment())),
        }
    }
}

impl JsonSchema for NameExpr {
    fn schema_name() -> String {
        "NameExpr".to_string()
    }

    fn json_schema(
        gen: &mut schemars::gen::SchemaGenerator,
    ) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// An indirect reference to a deployment parameter. Secrets (admin passwords)
/// are only ever emitted through this type so their values never appear as
/// literals in the static document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParameterRef(pub String);

impl Serialize for ParameterRef {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("[parameters('{}')]", self.0))
    }
}

impl JsonSchema for ParameterRef {
    fn schema_name() -> String {
        "ParameterRef".to_string()
    }

    fn json_schema(
        gen: &mut schemars::gen::SchemaGenerator,
    ) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// A reference from one document to a sibling document that must be
/// provisioned first. Serializes as a `type/name` entry in the referring
/// document's `dependsOn` list; indexed names produce a copy-index
/// placeholder expression instead.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DependencyEdge {
    pub kind: ResourceKind,
    pub name: NameExpr,
}

impl DependencyEdge {
    pub fn new<S: Into<String>>(kind: ResourceKind, name: S) -> Self {
        Self { kind, name: NameExpr::literal(name) }
    }
}

impl Serialize for DependencyEdge {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match &self.name {
            NameExpr::Literal(name) => {
                s.serialize_str(&format!("{}/{}", self.kind, name))
            }
            indexed => s.serialize_str(&format!(
                "[concat('{}/', {})]",
                self.kind,
                indexed.fragment()
            )),
        }
    }
}

impl JsonSchema for DependencyEdge {
    fn schema_name() -> String {
        "DependencyEdge".to_string()
    }

    fn json_schema(
        gen: &mut schemars::gen::SchemaGenerator,
    ) -> schemars::schema::Schema {
        String::json_schema(gen)
    }
}

/// Builds the engine's `resourceId(...)` expression for a sibling document.
pub fn resource_id(kind: ResourceKind, name: &NameExpr) -> String {
    format!("[resourceId('{}', {})]", kind, name.fragment())
}

/// Builds a reference to a named child of a sibling document, e.g. one
/// frontend configuration inside a load balancer. `child_path` starts with a
/// slash ("/frontendIPConfigurations/fe1").
pub fn child_resource_id(
    kind: ResourceKind,
    name: &str,
    child_path: &str,
) -> String {
    format!("[concat(resourceId('{kind}', '{name}'), '{child_path}')]")
}

/// A reference to an existing resource by its fully qualified ID.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct SubResource {
    pub id: String,
}

impl SubResource {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self { id: id.into() }
    }
}

/// The batch-instantiation directive attached to a document compiled with a
/// `count`. The engine instantiates the document `count` times, substituting
/// the instance index into every copy-index expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub struct CopyDirective {
    pub name: String,
    pub count: u32,
    pub mode: CopyMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum CopyMode {
    Parallel,
}

/// A resource SKU selector. Which fields are meaningful depends on the
/// resource kind (public IPs use `name` only; scale sets carry a capacity).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Sku {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

/// An edge-zone placement for resources deployed outside the main regional
/// footprint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedLocation {
    pub name: String,

    #[serde(rename = "type")]
    pub location_type: ExtendedLocationType,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum ExtendedLocationType {
    EdgeZone,
}

/// The managed identity attached to a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIdentity {
    #[serde(rename = "type")]
    pub identity_type: IdentityType,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub user_assigned_identities: BTreeMap<String, UserIdentityValue>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, JsonSchema)]
pub enum IdentityType {
    SystemAssigned,
    UserAssigned,
    #[serde(rename = "SystemAssigned, UserAssigned")]
    SystemAndUserAssigned,
}

/// The value side of a `userAssignedIdentities` entry. The wire format wants
/// an empty object per identity ID.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct UserIdentityValue {}

/// A compiled resource description document.
///
/// Every document is a freshly allocated, self-contained value: it holds only
/// value-typed fields and ID/name references to sibling documents, never an
/// embedded document. The declared `api_version` is always high enough to
/// support every field actually present (see `scoria`'s version resolver).
#[derive(Clone, Debug, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDocument {
    #[serde(rename = "type")]
    pub resource_type: ResourceKind,

    pub api_version: ApiVersion,

    pub name: NameExpr,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DependencyEdge>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub copy: Option<CopyDirective>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<Sku>,

    /// Storage accounts declare their account kind at the envelope level.
    #[serde(rename = "kind", skip_serializing_if = "Option::is_none")]
    pub account_kind: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub zones: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extended_location: Option<ExtendedLocation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<ResourceIdentity>,

    pub properties: Properties,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn literal_name_serializes_bare() {
        let json = serde_json::to_value(NameExpr::literal("vm1")).unwrap();
        assert_eq!(json, serde_json::json!("vm1"));
    }

    #[test]
    fn indexed_name_serializes_as_copy_index_expression() {
        let json = serde_json::to_value(NameExpr::indexed("vm")).unwrap();
        assert_eq!(json, serde_json::json!("[concat('vm', copyIndex())]"));

        let vhd = NameExpr::Indexed {
            prefix: "osdisk".to_string(),
            suffix: ".vhd".to_string(),
        };
        assert_eq!(
            serde_json::to_value(vhd).unwrap(),
            serde_json::json!("[concat('osdisk', copyIndex(), '.vhd')]")
        );
    }

    #[test]
    fn parameter_ref_never_embeds_the_value() {
        let json =
            serde_json::to_value(ParameterRef("adminPassword".to_string()))
                .unwrap();
        assert_eq!(json, serde_json::json!("[parameters('adminPassword')]"));
    }

    #[test]
    fn dependency_edge_forms() {
        let literal =
            DependencyEdge::new(ResourceKind::NetworkInterface, "nic0");
        assert_eq!(
            serde_json::to_value(literal).unwrap(),
            serde_json::json!("Microsoft.Network/networkInterfaces/nic0")
        );

        let indexed = DependencyEdge {
            kind: ResourceKind::NetworkInterface,
            name: NameExpr::indexed("nic"),
        };
        assert_eq!(
            serde_json::to_value(indexed).unwrap(),
            serde_json::json!(
                "[concat('Microsoft.Network/networkInterfaces/', \
                 concat('nic', copyIndex()))]"
            )
        );
    }

    #[test]
    fn resource_id_expression() {
        assert_eq!(
            resource_id(
                ResourceKind::PublicIpAddress,
                &NameExpr::literal("ip0")
            ),
            "[resourceId('Microsoft.Network/publicIPAddresses', 'ip0')]"
        );
    }
}
