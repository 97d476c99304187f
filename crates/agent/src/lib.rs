//! Interactive agent over an `AgentCore` gateway.
//!
//! [`runner::Runner`] walks the session through its stages. The pieces it combines are usable on
//! their own: [`channel::GatewayChannel`] speaks MCP to the gateway, [`tools`] drains paginated
//! tool listings, [`agent::Agent`] runs the model/tool loop and [`repl`] drives it from a line
//! reader.

pub mod agent;
pub mod bedrock;
pub mod channel;
pub mod error;
pub mod model;
pub mod repl;
pub mod runner;
mod streamable_http;
pub mod tools;

pub use error::{AgentError, Result};
