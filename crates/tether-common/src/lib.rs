pub mod errors;
pub mod id;

pub use errors::{ConfigError, DeviceError, RelayError, TetherError};
pub use id::{new_id, IdSource, SequentialIds, UuidIds};

pub type Result<T> = std::result::Result<T, TetherError>;
