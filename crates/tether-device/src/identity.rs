//! Device identity record and its on-disk store.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tether_common::DeviceError;
use tracing::info;

use crate::fingerprint::machine_fingerprint;
use crate::words::{ADJECTIVES, NOUNS};

/// Identity of this desktop installation.
///
/// `device_id` is generated once and persisted for the lifetime of the
/// installation; `device_name` defaults to the id until explicitly renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub device_id: String,
    pub device_name: String,
    pub created_at: DateTime<Utc>,
}

/// A short-lived pairing PIN issued by the relay.
///
/// `expires_at` is epoch milliseconds; expiry is enforced by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pin {
    pub value: String,
    pub expires_at: i64,
}

/// Derive a device id deterministically from a hardware fingerprint.
///
/// The same fingerprint always yields the same id: the first four bytes of
/// the fingerprint's SHA-256 index the adjective/noun lists plus a
/// two-digit numeral.
pub fn derive_device_id(fingerprint: &str) -> String {
    let digest = Sha256::digest(fingerprint.as_bytes());
    let seed = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    id_from_seed(seed)
}

/// Generate a random device id from the same word scheme.
pub fn random_device_id() -> String {
    id_from_seed(rand::random::<u32>())
}

fn id_from_seed(seed: u32) -> String {
    let seed = seed as usize;
    let adjective = ADJECTIVES[seed % ADJECTIVES.len()];
    let noun = NOUNS[(seed / ADJECTIVES.len()) % NOUNS.len()];
    let numeral = (seed / (ADJECTIVES.len() * NOUNS.len())) % 100;
    format!("{adjective}-{noun}-{numeral:02}")
}

/// Serialized shape of `device.toml`.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DeviceFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identity: Option<DeviceIdentity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pin: Option<Pin>,
}

/// On-disk store for the device identity and last issued PIN.
///
/// Explicitly constructed with a directory so tests can supply isolated
/// stores; never a process-wide singleton.
pub struct DeviceStore {
    path: PathBuf,
}

impl DeviceStore {
    /// Store rooted at the given directory; persists to `device.toml` inside it.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into().join("device.toml"),
        }
    }

    /// Platform default directory (`~/.config/tether` on Linux).
    pub fn default_dir() -> Result<PathBuf, DeviceError> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| DeviceError::StoreError("could not determine config directory".into()))?;
        Ok(config_dir.join("tether"))
    }

    /// Return the persisted identity, creating and persisting one if absent.
    ///
    /// A new id is derived from the machine fingerprint when available, so
    /// reinstalling on the same hardware yields the same id; otherwise a
    /// random id from the same word scheme is used.
    pub fn load_or_create(&self) -> Result<DeviceIdentity, DeviceError> {
        let mut file = self.read_file()?;
        if let Some(identity) = file.identity {
            return Ok(identity);
        }

        let device_id = match machine_fingerprint() {
            Some(fp) => derive_device_id(&fp),
            None => {
                info!("no machine fingerprint available, generating random device id");
                random_device_id()
            }
        };
        let identity = DeviceIdentity {
            device_name: device_id.clone(),
            device_id,
            created_at: Utc::now(),
        };
        info!(device_id = %identity.device_id, "generated device identity");

        file.identity = Some(identity.clone());
        self.write_file(&file)?;
        Ok(identity)
    }

    /// Return the persisted identity without creating one.
    pub fn identity(&self) -> Result<Option<DeviceIdentity>, DeviceError> {
        Ok(self.read_file()?.identity)
    }

    /// Rename the device. Persisted immediately.
    pub fn set_device_name(&self, name: &str) -> Result<DeviceIdentity, DeviceError> {
        let mut identity = self.load_or_create()?;
        identity.device_name = name.to_string();

        let mut file = self.read_file()?;
        file.identity = Some(identity.clone());
        self.write_file(&file)?;
        info!(device_id = %identity.device_id, device_name = %name, "device renamed");
        Ok(identity)
    }

    /// Discard the current identity and generate a fresh random one.
    ///
    /// Reset intentionally ignores the fingerprint: the point of a reset is
    /// a new identity, which forces re-pairing of all mobile devices.
    pub fn reset_device_id(&self) -> Result<DeviceIdentity, DeviceError> {
        let device_id = random_device_id();
        let identity = DeviceIdentity {
            device_name: device_id.clone(),
            device_id,
            created_at: Utc::now(),
        };

        let mut file = self.read_file()?;
        file.identity = Some(identity.clone());
        file.pin = None;
        self.write_file(&file)?;
        info!(device_id = %identity.device_id, "device identity reset");
        Ok(identity)
    }

    /// Persist the last issued pairing PIN for display.
    pub fn save_pin(&self, pin: &Pin) -> Result<(), DeviceError> {
        let mut file = self.read_file()?;
        file.pin = Some(pin.clone());
        self.write_file(&file)
    }

    /// The last issued pairing PIN, if any.
    pub fn last_pin(&self) -> Option<Pin> {
        self.read_file().ok()?.pin
    }

    fn read_file(&self) -> Result<DeviceFile, DeviceError> {
        if !self.path.exists() {
            return Ok(DeviceFile::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| DeviceError::StoreError(format!("failed to read {}: {e}", self.path.display())))?;
        toml::from_str(&content).map_err(|e| DeviceError::ParseError(format!("bad device file: {e}")))
    }

    fn write_file(&self, file: &DeviceFile) -> Result<(), DeviceError> {
        let content = toml::to_string_pretty(file)
            .map_err(|e| DeviceError::StoreError(format!("failed to serialize device file: {e}")))?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DeviceError::StoreError(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        // Atomic write: tmp then rename.
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, &content)
            .map_err(|e| DeviceError::StoreError(format!("failed to write {}: {e}", tmp.display())))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            DeviceError::StoreError(format!("failed to move {} into place: {e}", self.path.display()))
        })?;
        Ok(())
    }
}
