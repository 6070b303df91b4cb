// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Storage-source variant selection and OS storage profile assembly.
//!
//! A machine's OS state comes from exactly one of a closed set of sources:
//! a marketplace image, a custom image, an already-populated disk, or a
//! shared gallery image, each backed by either unmanaged blobs or managed
//! disks. The selection is made once, up front, by a total function over the
//! configuration's selector fields; contradictory or insufficient selectors
//! fail the compile rather than being guessed around.

use scoria_api_types::properties::compute::{
    Caching, CreateOption, DiffDiskOption, DiffDiskPlacement, DiffDiskSettings,
    ImageReference, ManagedDiskParameters, OsDisk, OsType, StorageProfile,
    VirtualHardDisk,
};
use scoria_api_types::{Feature, SubResource};

use crate::error::CompileError;
use crate::naming::Namer;
use crate::resolver::VersionResolver;

/// The mutually-exclusive storage source variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageProfileVariant {
    MarketplaceImageUnmanaged,
    MarketplaceImageManaged,
    CustomImageUnmanaged,
    CustomImageManaged,
    AttachedUnmanagedDisk,
    AttachedManagedDisk,
    SharedGalleryImage,
}

impl StorageProfileVariant {
    /// True for specialized machines whose OS state rides on an attached
    /// disk. These carry no OS profile.
    pub fn attaches_existing_disk(&self) -> bool {
        matches!(
            self,
            Self::AttachedUnmanagedDisk | Self::AttachedManagedDisk
        )
    }

    /// True when the OS disk is backed by page blobs rather than managed
    /// disks.
    pub fn uses_unmanaged_disks(&self) -> bool {
        matches!(
            self,
            Self::MarketplaceImageUnmanaged
                | Self::CustomImageUnmanaged
                | Self::AttachedUnmanagedDisk
        )
    }
}

/// A marketplace image coordinate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarketplaceImage {
    pub publisher: String,
    pub offer: String,
    pub sku: String,
    pub version: String,
}

/// The storage-related slice of a machine configuration, shared by the
/// virtual machine and scale set compilers.
#[derive(Clone, Debug, Default)]
pub struct StorageSourceOptions {
    pub marketplace_image: Option<MarketplaceImage>,

    /// A managed custom image's resource ID.
    pub custom_image_id: Option<String>,

    /// An unmanaged custom image's source blob URI.
    pub custom_image_os_vhd_uri: Option<String>,

    pub shared_gallery_image_id: Option<String>,

    /// A managed disk to attach as a specialized OS disk.
    pub attach_os_disk_id: Option<String>,

    /// An unmanaged blob to attach as a specialized OS disk.
    pub attach_os_vhd_uri: Option<String>,

    /// Back the OS disk with page blobs instead of managed disks.
    pub use_unmanaged_disk: bool,

    /// Required whenever the image carries no OS type of its own (unmanaged
    /// custom images and attached disks).
    pub os_type: Option<OsType>,

    /// Destination container for unmanaged OS disk blobs.
    pub os_vhd_container_uri: Option<String>,

    pub os_disk_name: Option<String>,
    pub os_caching: Option<Caching>,
    pub storage_account_type: Option<String>,
    pub os_disk_encryption_set_id: Option<String>,
    pub os_disk_size_gb: Option<u32>,
    pub ephemeral_os_disk: bool,
    pub ephemeral_placement: Option<DiffDiskPlacement>,
    pub write_accelerator: bool,
}

impl StorageSourceOptions {
    /// Resolves the storage variant from the selector fields. Total: every
    /// input either maps to exactly one variant or fails with an ambiguity
    /// or incompleteness error.
    pub fn resolve_variant(
        &self,
    ) -> Result<StorageProfileVariant, CompileError> {
        let selectors = [
            ("marketplace_image", self.marketplace_image.is_some()),
            ("custom_image_id", self.custom_image_id.is_some()),
            (
                "custom_image_os_vhd_uri",
                self.custom_image_os_vhd_uri.is_some(),
            ),
            (
                "shared_gallery_image_id",
                self.shared_gallery_image_id.is_some(),
            ),
            ("attach_os_disk_id", self.attach_os_disk_id.is_some()),
            ("attach_os_vhd_uri", self.attach_os_vhd_uri.is_some()),
        ];

        let mut populated =
            selectors.iter().filter(|(_, set)| *set).map(|(name, _)| *name);
        let Some(first) = populated.next() else {
            return Err(CompileError::ConfigurationIncomplete {
                field: "an image or disk source",
                context: "the storage profile",
            });
        };

        if let Some(second) = populated.next() {
            return Err(CompileError::ConfigurationAmbiguous(first, second));
        }

        let variant = match first {
            "marketplace_image" if self.use_unmanaged_disk => {
                StorageProfileVariant::MarketplaceImageUnmanaged
            }
            "marketplace_image" => {
                StorageProfileVariant::MarketplaceImageManaged
            }
            "custom_image_id" => StorageProfileVariant::CustomImageManaged,
            "custom_image_os_vhd_uri" => {
                StorageProfileVariant::CustomImageUnmanaged
            }
            "shared_gallery_image_id" => {
                StorageProfileVariant::SharedGalleryImage
            }
            "attach_os_disk_id" => StorageProfileVariant::AttachedManagedDisk,
            _ => StorageProfileVariant::AttachedUnmanagedDisk,
        };

        // `use_unmanaged_disk` is itself a selector between disk backings;
        // combining it with a managed-only source is a contradiction, not a
        // hint to be ignored.
        if self.use_unmanaged_disk && !variant.uses_unmanaged_disks() {
            return Err(CompileError::ConfigurationAmbiguous(
                "use_unmanaged_disk",
                first,
            ));
        }

        Ok(variant)
    }

    /// Assembles the image reference and OS disk for the resolved variant,
    /// claiming version-gated features along the way.
    pub(crate) fn build(
        &self,
        doc_name: &str,
        namer: &Namer,
        resolver: &mut VersionResolver<'_>,
    ) -> Result<(StorageProfileVariant, StorageProfile), CompileError> {
        let variant = self.resolve_variant()?;

        if variant.uses_unmanaged_disks() {
            if let Some(field) = [
                ("storage_account_type", self.storage_account_type.is_some()),
                (
                    "os_disk_encryption_set_id",
                    self.os_disk_encryption_set_id.is_some(),
                ),
                ("ephemeral_os_disk", self.ephemeral_os_disk),
            ]
            .iter()
            .find_map(|(name, set)| set.then_some(*name))
            {
                return Err(CompileError::ConfigurationAmbiguous(
                    "use_unmanaged_disk",
                    field,
                ));
            }
        }

        if self.ephemeral_os_disk && variant.attaches_existing_disk() {
            return Err(CompileError::ConfigurationAmbiguous(
                "ephemeral_os_disk",
                "an attached OS disk source",
            ));
        }

        resolver.require_if(self.ephemeral_os_disk, Feature::EphemeralOsDisk);
        resolver.require_if(self.write_accelerator, Feature::WriteAccelerator);
        resolver.require_if(
            self.os_disk_encryption_set_id.is_some(),
            Feature::DiskEncryptionSet,
        );

        let os_disk_name = self
            .os_disk_name
            .clone()
            .unwrap_or_else(|| format!("{doc_name}-osdisk"));

        let managed_disk = || {
            let managed = ManagedDiskParameters {
                id: None,
                storage_account_type: self.storage_account_type.clone(),
                disk_encryption_set: self
                    .os_disk_encryption_set_id
                    .clone()
                    .map(SubResource::new),
            };
            (managed != ManagedDiskParameters::default()).then_some(managed)
        };

        let diff_disk_settings =
            self.ephemeral_os_disk.then(|| DiffDiskSettings {
                option: DiffDiskOption::Local,
                placement: self.ephemeral_placement,
            });

        let profile = match variant {
            StorageProfileVariant::MarketplaceImageUnmanaged => {
                StorageProfile {
                    image_reference: Some(self.marketplace_reference()),
                    os_disk: Some(OsDisk {
                        name: Some(namer.name(os_disk_name.as_str())),
                        create_option: Some(CreateOption::FromImage),
                        caching: self.os_caching,
                        vhd: Some(self.vhd_target(&os_disk_name, namer)?),
                        disk_size_gb: self.os_disk_size_gb,
                        write_accelerator_enabled: self
                            .write_accelerator
                            .then_some(true),
                        ..Default::default()
                    }),
                    data_disks: vec![],
                }
            }
            StorageProfileVariant::MarketplaceImageManaged => StorageProfile {
                image_reference: Some(self.marketplace_reference()),
                os_disk: Some(OsDisk {
                    name: self.os_disk_name.as_deref().map(|n| namer.name(n)),
                    create_option: Some(CreateOption::FromImage),
                    caching: self.os_caching,
                    managed_disk: managed_disk(),
                    disk_size_gb: self.os_disk_size_gb,
                    diff_disk_settings,
                    write_accelerator_enabled: self
                        .write_accelerator
                        .then_some(true),
                    ..Default::default()
                }),
                data_disks: vec![],
            },
            StorageProfileVariant::CustomImageUnmanaged => StorageProfile {
                image_reference: None,
                os_disk: Some(OsDisk {
                    name: Some(namer.name(os_disk_name.as_str())),
                    os_type: Some(self.required_os_type()?),
                    create_option: Some(CreateOption::FromImage),
                    caching: self.os_caching,
                    image: self.custom_image_os_vhd_uri.clone().map(|uri| {
                        VirtualHardDisk {
                            uri: scoria_api_types::NameExpr::literal(uri),
                        }
                    }),
                    vhd: Some(self.vhd_target(&os_disk_name, namer)?),
                    disk_size_gb: self.os_disk_size_gb,
                    write_accelerator_enabled: self
                        .write_accelerator
                        .then_some(true),
                    ..Default::default()
                }),
                data_disks: vec![],
            },
            StorageProfileVariant::CustomImageManaged => StorageProfile {
                image_reference: Some(ImageReference {
                    id: self.custom_image_id.clone(),
                    ..Default::default()
                }),
                os_disk: Some(OsDisk {
                    create_option: Some(CreateOption::FromImage),
                    caching: self.os_caching,
                    managed_disk: managed_disk(),
                    disk_size_gb: self.os_disk_size_gb,
                    diff_disk_settings,
                    write_accelerator_enabled: self
                        .write_accelerator
                        .then_some(true),
                    ..Default::default()
                }),
                data_disks: vec![],
            },
            StorageProfileVariant::SharedGalleryImage => StorageProfile {
                image_reference: Some(ImageReference {
                    shared_gallery_image_id: self
                        .shared_gallery_image_id
                        .clone(),
                    ..Default::default()
                }),
                os_disk: Some(OsDisk {
                    create_option: Some(CreateOption::FromImage),
                    caching: self.os_caching,
                    managed_disk: managed_disk(),
                    disk_size_gb: self.os_disk_size_gb,
                    diff_disk_settings,
                    write_accelerator_enabled: self
                        .write_accelerator
                        .then_some(true),
                    ..Default::default()
                }),
                data_disks: vec![],
            },
            StorageProfileVariant::AttachedUnmanagedDisk => StorageProfile {
                image_reference: None,
                os_disk: Some(OsDisk {
                    name: Some(namer.name(os_disk_name.as_str())),
                    os_type: Some(self.required_os_type()?),
                    create_option: Some(CreateOption::Attach),
                    caching: self.os_caching,
                    vhd: self.attach_os_vhd_uri.clone().map(|uri| {
                        VirtualHardDisk {
                            uri: scoria_api_types::NameExpr::literal(uri),
                        }
                    }),
                    write_accelerator_enabled: self
                        .write_accelerator
                        .then_some(true),
                    ..Default::default()
                }),
                data_disks: vec![],
            },
            StorageProfileVariant::AttachedManagedDisk => StorageProfile {
                image_reference: None,
                os_disk: Some(OsDisk {
                    os_type: Some(self.required_os_type()?),
                    create_option: Some(CreateOption::Attach),
                    caching: self.os_caching,
                    managed_disk: Some(ManagedDiskParameters {
                        id: self.attach_os_disk_id.clone(),
                        ..Default::default()
                    }),
                    write_accelerator_enabled: self
                        .write_accelerator
                        .then_some(true),
                    ..Default::default()
                }),
                data_disks: vec![],
            },
        };

        Ok((variant, profile))
    }

    fn marketplace_reference(&self) -> ImageReference {
        let image = self.marketplace_image.clone().unwrap_or_default();
        ImageReference {
            publisher: Some(image.publisher),
            offer: Some(image.offer),
            sku: Some(image.sku),
            version: Some(image.version),
            ..Default::default()
        }
    }

    fn required_os_type(&self) -> Result<OsType, CompileError> {
        self.os_type.ok_or(CompileError::ConfigurationIncomplete {
            field: "os_type",
            context: "a storage source with no intrinsic OS type",
        })
    }

    fn vhd_target(
        &self,
        os_disk_name: &str,
        namer: &Namer,
    ) -> Result<VirtualHardDisk, CompileError> {
        let container = self.os_vhd_container_uri.as_deref().ok_or(
            CompileError::ConfigurationIncomplete {
                field: "os_vhd_container_uri",
                context: "an unmanaged OS disk",
            },
        )?;

        let prefix =
            format!("{}/{}", container.trim_end_matches('/'), os_disk_name);
        Ok(VirtualHardDisk { uri: namer.suffixed(prefix, ".vhd") })
    }
}
