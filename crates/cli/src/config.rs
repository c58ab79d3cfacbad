//! OCI config file handling
//!
//! The OCI config file is INI: one section per profile, every profile
//! inheriting the keys of `[DEFAULT]`.

use alarm_lib::{ProvisionError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const DEFAULT_SECTION: &str = "DEFAULT";

/// Credentials and location of one OCI config profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OciProfile {
    pub user: String,
    pub fingerprint: String,
    pub key_file: PathBuf,
    pub tenancy: String,
    pub region: String,
    pub pass_phrase: Option<String>,
}

impl OciProfile {
    /// Load `profile` from the config file at `path` (or `~/.oci/config`)
    pub fn load(path: Option<&Path>, profile: &str) -> Result<Self> {
        let path = match path {
            Some(path) => expand_home(path),
            None => default_config_path()?,
        };

        if !path.exists() {
            return Err(ProvisionError::Configuration(format!(
                "OCI config file {} does not exist",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_path()).format(config::FileFormat::Ini))
            .build()?;
        let sections: HashMap<String, config::Value> = settings.try_deserialize()?;

        let mut values = section(&sections, DEFAULT_SECTION)?.unwrap_or_default();
        if !profile.eq_ignore_ascii_case(DEFAULT_SECTION) {
            let overrides = section(&sections, profile)?.ok_or_else(|| {
                ProvisionError::Configuration(format!(
                    "profile {profile} not found in {}",
                    path.display()
                ))
            })?;
            values.extend(overrides);
        } else if values.is_empty() {
            return Err(ProvisionError::Configuration(format!(
                "profile {profile} not found in {}",
                path.display()
            )));
        }

        Self::from_values(values, profile)
    }

    fn from_values(mut values: HashMap<String, String>, profile: &str) -> Result<Self> {
        let mut required = |key: &str| {
            values
                .remove(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| {
                    ProvisionError::Configuration(format!(
                        "profile {profile} is missing required key '{key}'"
                    ))
                })
        };

        let user = required("user")?;
        let fingerprint = required("fingerprint")?;
        let key_file = expand_home(Path::new(&required("key_file")?));
        let tenancy = required("tenancy")?;
        let region = required("region")?;
        let pass_phrase = values.remove("pass_phrase").filter(|p| !p.is_empty());

        Ok(Self {
            user,
            fingerprint,
            key_file,
            tenancy,
            region,
            pass_phrase,
        })
    }

    /// `keyId` used in request signatures
    pub fn key_id(&self) -> String {
        format!("{}/{}/{}", self.tenancy, self.user, self.fingerprint)
    }
}

/// Find a section by case-insensitive name and flatten it to strings
fn section(
    sections: &HashMap<String, config::Value>,
    name: &str,
) -> Result<Option<HashMap<String, String>>> {
    let Some(value) = sections
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.clone())
    else {
        return Ok(None);
    };

    let table = value.into_table()?;
    let mut flat = HashMap::with_capacity(table.len());
    for (key, value) in table {
        flat.insert(key.to_lowercase(), value.into_string()?);
    }
    Ok(Some(flat))
}

fn default_config_path() -> Result<PathBuf> {
    let home = dirs_next::home_dir().ok_or_else(|| {
        ProvisionError::Configuration("could not determine home directory".to_string())
    })?;
    Ok(home.join(".oci").join("config"))
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs_next::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const CONFIG: &str = "\
[DEFAULT]
user=ocid1.user.oc1..default
fingerprint=aa:bb:cc
key_file=/keys/default.pem
tenancy=ocid1.tenancy.oc1..root
region=us-ashburn-1

[PROD]
user=ocid1.user.oc1..prod
region=eu-frankfurt-1
";

    #[test]
    fn test_default_profile() {
        let file = write_config(CONFIG);
        let profile = OciProfile::load(Some(file.path()), "DEFAULT").unwrap();

        assert_eq!(profile.user, "ocid1.user.oc1..default");
        assert_eq!(profile.region, "us-ashburn-1");
        assert_eq!(profile.key_file, PathBuf::from("/keys/default.pem"));
        assert_eq!(profile.pass_phrase, None);
        assert_eq!(
            profile.key_id(),
            "ocid1.tenancy.oc1..root/ocid1.user.oc1..default/aa:bb:cc"
        );
    }

    #[test]
    fn test_named_profile_inherits_default() {
        let file = write_config(CONFIG);
        let profile = OciProfile::load(Some(file.path()), "PROD").unwrap();

        assert_eq!(profile.user, "ocid1.user.oc1..prod");
        assert_eq!(profile.region, "eu-frankfurt-1");
        assert_eq!(profile.tenancy, "ocid1.tenancy.oc1..root");
        assert_eq!(profile.fingerprint, "aa:bb:cc");
    }

    #[test]
    fn test_unknown_profile() {
        let file = write_config(CONFIG);
        let err = OciProfile::load(Some(file.path()), "STAGING").unwrap_err();
        assert!(matches!(err, ProvisionError::Configuration(_)));
    }

    #[test]
    fn test_missing_key() {
        let file = write_config("[DEFAULT]\nuser=u\nfingerprint=f\ntenancy=t\nregion=r\n");
        let err = OciProfile::load(Some(file.path()), "DEFAULT").unwrap_err();
        assert!(err.to_string().contains("key_file"));
    }

    #[test]
    fn test_missing_file() {
        let err = OciProfile::load(Some(Path::new("/nonexistent/oci/config")), "DEFAULT")
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Configuration(_)));
    }
}
