//! Provisioner configuration
//!
//! Resolved once at startup from the process environment (optionally seeded
//! from a `.env` file by the binary) plus command-line overrides, then passed
//! by value to the reconciler. Inner components never read the environment.

use crate::error::{ProvisionError, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Profile used when none is configured
pub const DEFAULT_PROFILE: &str = "DEFAULT";

/// Environment variable naming the OCI config file
pub const ENV_CONFIG_PATH: &str = "CONFIG_PATH";
/// Environment variable naming the profile inside the OCI config file
pub const ENV_PROFILE: &str = "OCI_PROFILE";
/// Environment variable holding the notification topic OCID
pub const ENV_NOTIFICATION: &str = "NOTIFICATION_OCID";

/// Configuration for one provisioning run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerConfig {
    /// OCI config file; `None` means the SDK default location
    pub credentials_path: Option<PathBuf>,
    /// Profile (section) inside the OCI config file
    pub profile: String,
    /// Topic every alarm notifies
    pub notification_channel_id: String,
}

/// Values supplied on the command line, which win over the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub credentials_path: Option<PathBuf>,
    pub profile: Option<String>,
    pub notification_channel_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    config_path: Option<String>,
    oci_profile: Option<String>,
    notification_ocid: Option<String>,
}

impl ProvisionerConfig {
    /// Load configuration from the process environment and overrides
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        Self::load_from(config::Environment::default(), overrides)
    }

    fn load_from(env: config::Environment, overrides: &ConfigOverrides) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(env)
            .set_override_option(
                "config_path",
                overrides
                    .credentials_path
                    .as_ref()
                    .map(|path| path.display().to_string()),
            )?
            .set_override_option("oci_profile", overrides.profile.clone())?
            .set_override_option(
                "notification_ocid",
                overrides.notification_channel_id.clone(),
            )?
            .build()?;

        let raw: RawConfig = settings.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let notification_channel_id = raw
            .notification_ocid
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                ProvisionError::Configuration(format!(
                    "{ENV_NOTIFICATION} is not set; alarms need a notification topic"
                ))
            })?;

        if !notification_channel_id.starts_with("ocid1.") {
            tracing::warn!(
                notification_channel_id = %notification_channel_id,
                "Notification channel does not look like an OCID"
            );
        }

        let profile = raw
            .oci_profile
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

        let credentials_path = raw
            .config_path
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            credentials_path,
            profile,
            notification_channel_id,
        })
    }
}
