use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("identity store error: {0}")]
    StoreError(String),

    #[error("identity parse error: {0}")]
    ParseError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("not connected to relay")]
    NotConnected,

    #[error("pairing error: {0}")]
    Pairing(String),
}

#[derive(Debug, thiserror::Error)]
pub enum TetherError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("terminal error: {0}")]
    Terminal(String),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ParseError("unexpected token".into());
        assert_eq!(err.to_string(), "config parse error: unexpected token");

        let err = ConfigError::ValidationError("bad relay url".into());
        assert_eq!(err.to_string(), "config validation error: bad relay url");
    }

    #[test]
    fn device_error_display() {
        let err = DeviceError::StoreError("permission denied".into());
        assert_eq!(err.to_string(), "identity store error: permission denied");

        let err = DeviceError::ParseError("bad toml".into());
        assert_eq!(err.to_string(), "identity parse error: bad toml");
    }

    #[test]
    fn relay_error_display() {
        let err = RelayError::Transport("connection reset".into());
        assert_eq!(err.to_string(), "transport error: connection reset");

        let err = RelayError::NotConnected;
        assert_eq!(err.to_string(), "not connected to relay");

        let err = RelayError::Pairing("HTTP 503".into());
        assert_eq!(err.to_string(), "pairing error: HTTP 503");
    }

    #[test]
    fn tether_error_from_config() {
        let config_err = ConfigError::ParseError("bad toml".into());
        let err: TetherError = config_err.into();
        assert!(matches!(err, TetherError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }

    #[test]
    fn tether_error_from_relay() {
        let relay_err = RelayError::Transport("timeout".into());
        let err: TetherError = relay_err.into();
        assert!(matches!(err, TetherError::Relay(_)));
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn tether_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: TetherError = io_err.into();
        assert!(matches!(err, TetherError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn tether_error_other_variants() {
        let err = TetherError::Terminal("pty allocation failed".into());
        assert_eq!(err.to_string(), "terminal error: pty allocation failed");

        let err = TetherError::Other("something went wrong".into());
        assert_eq!(err.to_string(), "something went wrong");
    }
}
