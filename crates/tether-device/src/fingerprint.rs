//! Hardware fingerprint for deterministic device-id generation.
//!
//! Returns a stable machine identifier where the platform provides one.
//! `None` means the caller falls back to random id generation.

/// Read a stable machine identifier for this host.
#[cfg(target_os = "linux")]
pub fn machine_fingerprint() -> Option<String> {
    for path in ["/etc/machine-id", "/var/lib/dbus/machine-id"] {
        if let Ok(content) = std::fs::read_to_string(path) {
            let id = content.trim();
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }
    }
    None
}

#[cfg(target_os = "macos")]
pub fn machine_fingerprint() -> Option<String> {
    let output = std::process::Command::new("ioreg")
        .args(["-rd1", "-c", "IOPlatformExpertDevice"])
        .output()
        .ok()?;
    parse_ioreg_uuid(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(target_os = "windows")]
pub fn machine_fingerprint() -> Option<String> {
    let output = std::process::Command::new("reg")
        .args([
            "query",
            r"HKLM\SOFTWARE\Microsoft\Cryptography",
            "/v",
            "MachineGuid",
        ])
        .output()
        .ok()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .split_whitespace()
        .last()
        .filter(|s| s.len() >= 32)
        .map(|s| s.to_string())
}

#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub fn machine_fingerprint() -> Option<String> {
    None
}

/// Extract `IOPlatformUUID` from `ioreg -rd1 -c IOPlatformExpertDevice` output.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn parse_ioreg_uuid(output: &str) -> Option<String> {
    for line in output.lines() {
        if line.contains("IOPlatformUUID") {
            let uuid = line.split('"').nth(3)?;
            if !uuid.is_empty() {
                return Some(uuid.to_string());
            }
        }
    }
    None
}
