// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Profile builders shared by the virtual machine and scale set compilers.

use scoria_api_types::properties::compute::{
    LinuxConfiguration, OsProfile, OsType, PatchMode, PatchSettings, Priority,
    SecurityProfile, SecurityType, SshConfiguration, SshPublicKey,
    UefiSettings, WindowsConfiguration,
};
use scoria_api_types::{
    Feature, IdentityType, ParameterRef, ResourceIdentity, UserIdentityValue,
};

use crate::error::CompileError;
use crate::naming::Namer;
use crate::resolver::VersionResolver;

/// Guest OS account, authentication, and patch options.
#[derive(Clone, Debug, Default)]
pub struct OsProfileOptions {
    pub admin_username: Option<String>,

    /// The deployment-parameter name holding the admin password. The
    /// password value itself never enters a configuration; it reaches the
    /// engine out of band and the document carries only this indirect
    /// reference.
    pub admin_password_parameter: Option<String>,

    /// SSH public key material. Key-based auth disables password auth in the
    /// emitted Linux configuration.
    pub ssh_public_keys: Vec<String>,

    /// Destination path for the public keys; defaults to the admin user's
    /// authorized_keys file.
    pub ssh_key_path: Option<String>,

    pub computer_name: Option<String>,
    pub custom_data: Option<String>,
    pub patch_mode: Option<PatchMode>,
    pub enable_automatic_updates: Option<bool>,
}

impl OsProfileOptions {
    pub(crate) fn build(
        &self,
        guest_os: Option<OsType>,
        doc_name: &str,
        namer: &Namer,
        resolver: &mut VersionResolver<'_>,
    ) -> Result<OsProfile, CompileError> {
        let admin_username = self.admin_username.clone().ok_or(
            CompileError::ConfigurationIncomplete {
                field: "admin_username",
                context: "an OS profile",
            },
        )?;

        if self.admin_password_parameter.is_none()
            && self.ssh_public_keys.is_empty()
        {
            return Err(CompileError::ConfigurationIncomplete {
                field: "admin_password_parameter or ssh_public_keys",
                context: "an OS profile",
            });
        }

        if !self.ssh_public_keys.is_empty()
            && guest_os == Some(OsType::Windows)
        {
            return Err(CompileError::UnsupportedEnumValue {
                field: "authentication type",
                value: "ssh".to_string(),
                context: "a Windows guest",
            });
        }

        let patch_settings = self
            .patch_mode
            .map(|mode| -> Result<_, CompileError> {
                let os = guest_os.ok_or(
                    CompileError::ConfigurationIncomplete {
                        field: "os_type",
                        context: "patch mode validation",
                    },
                )?;

                let legal: &[PatchMode] = match os {
                    OsType::Windows => &[
                        PatchMode::AutomaticByOs,
                        PatchMode::AutomaticByPlatform,
                        PatchMode::Manual,
                    ],
                    OsType::Linux => &[
                        PatchMode::AutomaticByPlatform,
                        PatchMode::ImageDefault,
                    ],
                };

                if !legal.contains(&mode) {
                    return Err(CompileError::UnsupportedEnumValue {
                        field: "patch_mode",
                        value: mode.to_string(),
                        context: match os {
                            OsType::Windows => "a Windows guest",
                            OsType::Linux => "a Linux guest",
                        },
                    });
                }

                resolver.require(Feature::PatchSettings);
                Ok(PatchSettings { patch_mode: mode })
            })
            .transpose()?;

        let ssh = (!self.ssh_public_keys.is_empty()).then(|| {
            let path = self.ssh_key_path.clone().unwrap_or_else(|| {
                format!("/home/{admin_username}/.ssh/authorized_keys")
            });
            SshConfiguration {
                public_keys: self
                    .ssh_public_keys
                    .iter()
                    .map(|key_data| SshPublicKey {
                        path: path.clone(),
                        key_data: key_data.clone(),
                    })
                    .collect(),
            }
        });

        let linux_configuration = match guest_os {
            Some(OsType::Linux) | None if ssh.is_some() => {
                Some(LinuxConfiguration {
                    disable_password_authentication: self
                        .admin_password_parameter
                        .is_none()
                        .then_some(true),
                    ssh,
                    patch_settings: patch_settings.clone(),
                })
            }
            Some(OsType::Linux) if patch_settings.is_some() => {
                Some(LinuxConfiguration {
                    disable_password_authentication: None,
                    ssh: None,
                    patch_settings: patch_settings.clone(),
                })
            }
            _ => None,
        };

        let windows_configuration = match guest_os {
            Some(OsType::Windows)
                if patch_settings.is_some()
                    || self.enable_automatic_updates.is_some() =>
            {
                Some(WindowsConfiguration {
                    enable_automatic_updates: self.enable_automatic_updates,
                    patch_settings,
                })
            }
            _ => None,
        };

        let computer_name = self
            .computer_name
            .as_deref()
            .map(|name| namer.name(name))
            .unwrap_or_else(|| namer.name(doc_name));

        Ok(OsProfile {
            computer_name: Some(computer_name),
            admin_username: Some(admin_username),
            admin_password: self
                .admin_password_parameter
                .clone()
                .map(ParameterRef),
            custom_data: self.custom_data.clone(),
            windows_configuration,
            linux_configuration,
        })
    }
}

/// Security-related toggles. The resulting sub-tree is assembled
/// incrementally and dropped entirely if no toggle was set.
#[derive(Clone, Debug, Default)]
pub struct SecurityProfileOptions {
    pub encryption_at_host: Option<bool>,
    pub security_type: Option<SecurityType>,
    pub enable_secure_boot: Option<bool>,
    pub enable_vtpm: Option<bool>,
}

impl SecurityProfileOptions {
    pub(crate) fn build(
        &self,
        resolver: &mut VersionResolver<'_>,
    ) -> Option<SecurityProfile> {
        resolver.require_if(
            self.encryption_at_host.is_some(),
            Feature::EncryptionAtHost,
        );
        resolver.require_if(
            self.security_type.is_some()
                || self.enable_secure_boot.is_some()
                || self.enable_vtpm.is_some(),
            Feature::TrustedLaunch,
        );

        let uefi_settings = (self.enable_secure_boot.is_some()
            || self.enable_vtpm.is_some())
        .then(|| UefiSettings {
            secure_boot_enabled: self.enable_secure_boot,
            v_tpm_enabled: self.enable_vtpm,
        });

        let profile = SecurityProfile {
            encryption_at_host: self.encryption_at_host,
            security_type: self.security_type,
            uefi_settings,
        };

        (!profile.is_empty()).then_some(profile)
    }
}

/// Managed identity options.
#[derive(Clone, Debug, Default)]
pub struct IdentityOptions {
    pub system_assigned: bool,
    pub user_assigned_identity_ids: Vec<String>,
}

impl IdentityOptions {
    pub(crate) fn build(&self) -> Option<ResourceIdentity> {
        let identity_type =
            match (self.system_assigned, !self.user_assigned_identity_ids.is_empty())
            {
                (true, true) => IdentityType::SystemAndUserAssigned,
                (true, false) => IdentityType::SystemAssigned,
                (false, true) => IdentityType::UserAssigned,
                (false, false) => return None,
            };

        Some(ResourceIdentity {
            identity_type,
            user_assigned_identities: self
                .user_assigned_identity_ids
                .iter()
                .map(|id| (id.clone(), UserIdentityValue {}))
                .collect(),
        })
    }
}

/// Spot/priority options shared by both machine kinds.
#[derive(Clone, Debug, Default)]
pub struct SpotOptions {
    pub priority: Option<Priority>,
    pub eviction_policy:
        Option<scoria_api_types::properties::compute::EvictionPolicy>,
    pub max_price: Option<f64>,
}

impl SpotOptions {
    pub(crate) fn claim(&self, resolver: &mut VersionResolver<'_>) {
        resolver.require_if(self.priority.is_some(), Feature::SpotPriority);
    }

    pub(crate) fn billing_profile(
        &self,
    ) -> Option<scoria_api_types::properties::compute::BillingProfile> {
        self.max_price.map(|max_price| {
            scoria_api_types::properties::compute::BillingProfile { max_price }
        })
    }
}
