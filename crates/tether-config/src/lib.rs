//! Configuration for the tether daemon: TOML schema, loading, saving.

pub mod schema;
pub mod toml_loader;
pub mod toml_writer;
pub mod validation;

pub use schema::{RelaySettings, TetherConfig, WorkspaceEntry, DEFAULT_RELAY_URL};
pub use toml_loader::{default_config_path, load_default, load_from_path};
pub use toml_writer::{save_config, save_config_to_path};
