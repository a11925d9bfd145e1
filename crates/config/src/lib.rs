//! Deployment configuration: transport tuning, credentials and the list of
//! destinations messages can be published to.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{discover_config_path, load_config},
    schema::{ChannelConfig, PosterConfig, TransportConfig},
};
