//! OpenAPI YAML -> JSON transcoding.
//!
//! The gateway only accepts inline OpenAPI payloads as JSON, while most hand-written API
//! descriptions are YAML. This crate performs the format change and nothing else: it does not
//! validate the document against the `OpenAPI` schema.

mod convert;
pub mod error;

pub use convert::{convert_file, json_to_pretty_string, yaml_to_json, yaml_value_to_json};
pub use error::{ConvertError, Result};
