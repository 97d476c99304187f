//! Gateway lifecycle: provisioning, target registration and teardown.
//!
//! Everything that talks to the provider goes through [`control::GatewayControl`]; the AWS
//! implementation lives in [`aws`]. The flows in [`provision`], [`register`] and
//! [`decommission`] only sequence those calls and hand results over through the configuration
//! artifact described in [`config`].

pub mod aws;
pub mod config;
pub mod control;
pub mod decommission;
pub mod error;
pub mod provision;
pub mod register;
pub mod target;
pub mod token;

pub use config::{ClientInfo, DEFAULT_CONFIG_FILE, GatewayConfig};
pub use error::{ProvisioningError, Result};
