//! Pairing PIN issuance via the relay's REST endpoint.

use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use tether_device::{DeviceIdentity, DeviceStore, Pin};

/// Requests short-lived numeric PINs for out-of-band mobile pairing.
pub struct PairingService {
    client: reqwest::Client,
}

/// `POST /pin/create` response body.
#[derive(Debug, Deserialize)]
struct PinResponse {
    success: bool,
    data: Option<PinData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PinData {
    pin: String,
    expires_at: i64,
}

impl PairingService {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Request a pairing PIN from the relay.
    ///
    /// On success the PIN is persisted for display and returned. Any failure
    /// (unreachable relay, non-success response, malformed body) yields
    /// `None` with no partial state and no retry.
    pub async fn create_pin(
        &self,
        relay_url: &str,
        identity: &DeviceIdentity,
        store: &DeviceStore,
    ) -> Option<Pin> {
        let Some(base) = http_base_url(relay_url) else {
            warn!(relay_url = %relay_url, "cannot derive pairing endpoint from relay url");
            return None;
        };

        let body = serde_json::json!({
            "deviceId": identity.device_id,
            "deviceName": identity.device_name,
        });

        let response = match self
            .client
            .post(format!("{base}/pin/create"))
            .json(&body)
            .timeout(Duration::from_secs(10))
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = %response.status(), "pin request rejected");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "pin request failed");
                return None;
            }
        };

        match response.json::<PinResponse>().await {
            Ok(PinResponse {
                success: true,
                data: Some(data),
            }) => {
                let pin = Pin {
                    value: data.pin,
                    expires_at: data.expires_at,
                };
                if let Err(e) = store.save_pin(&pin) {
                    warn!(error = %e, "failed to persist pairing pin");
                }
                info!(expires_at = pin.expires_at, "pairing pin issued");
                Some(pin)
            }
            Ok(_) => {
                warn!("pairing endpoint reported failure");
                None
            }
            Err(e) => {
                warn!(error = %e, "failed to parse pin response");
                None
            }
        }
    }
}

impl Default for PairingService {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive the HTTP base URL from the WebSocket relay URL by swapping the
/// scheme: `wss://` → `https://`, `ws://` → `http://`.
pub fn http_base_url(relay_url: &str) -> Option<String> {
    let relay_url = relay_url.trim_end_matches('/');
    if let Some(rest) = relay_url.strip_prefix("wss://") {
        Some(format!("https://{rest}"))
    } else {
        relay_url
            .strip_prefix("ws://")
            .map(|rest| format!("http://{rest}"))
    }
}
