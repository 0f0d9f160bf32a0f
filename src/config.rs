//! Router configuration.
//!
//! Every field has a default, so an empty TOML document (or no file at all)
//! yields the standard behavior:
//!
//! ```toml
//! method_override = true
//! override_header = "x-http-method-override"
//! override_query_param = "_method"
//! not_found_body = "Page not found"
//! method_not_allowed_body = "Method Not Allowed"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::Error;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Honor method-override signals on `POST` requests.
    pub method_override: bool,
    /// Header carrying the overriding method. Takes precedence over the
    /// query parameter.
    pub override_header: String,
    /// Query parameter carrying the overriding method.
    pub override_query_param: String,
    /// Body of the router's `404` response.
    pub not_found_body: String,
    /// Body of the router's `405` response.
    pub method_not_allowed_body: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            method_override: true,
            override_header: "x-http-method-override".to_owned(),
            override_query_param: "_method".to_owned(),
            not_found_body: "Page not found".to_owned(),
            method_not_allowed_body: "Method Not Allowed".to_owned(),
        }
    }
}

impl Config {
    pub fn from_toml_str(source: &str) -> Result<Self, Error> {
        let mut config: Self = toml::from_str(source)?;
        config.override_header.make_ascii_lowercase();
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let source = tokio::fs::read_to_string(path).await?;
        Self::from_toml_str(&source)
    }
}
