//! Device identity: a stable, human-memorable identifier for this desktop
//! installation, plus persistence for the last issued pairing PIN.

pub mod fingerprint;
pub mod identity;
mod words;

pub use fingerprint::machine_fingerprint;
pub use identity::{derive_device_id, random_device_id, DeviceIdentity, DeviceStore, Pin};
