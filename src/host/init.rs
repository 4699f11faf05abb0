//! Initialization payload sent by the host.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

// ============================================================================
// ClientApplication
// ============================================================================

/// Application embedding the extension host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientApplication {
    /// The Sourcegraph web application.
    #[default]
    Sourcegraph,
    /// Any other client (browser extension, editor plugin).
    Other,
}

impl fmt::Display for ClientApplication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sourcegraph => f.write_str("sourcegraph"),
            Self::Other => f.write_str("other"),
        }
    }
}

// ============================================================================
// InitData
// ============================================================================

/// Information the host passes when it starts an extension host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitData {
    /// URL of the extension bundle to load.
    #[serde(rename = "bundleURL", default, skip_serializing_if = "Option::is_none")]
    pub bundle_url: Option<String>,

    /// Base URL of the Sourcegraph instance.
    #[serde(rename = "sourcegraphURL")]
    pub sourcegraph_url: String,

    /// Embedding application.
    pub client_application: ClientApplication,
}

impl InitData {
    /// Creates init data without a bundle URL.
    #[must_use]
    pub fn new(sourcegraph_url: impl Into<String>, client_application: ClientApplication) -> Self {
        Self {
            bundle_url: None,
            sourcegraph_url: sourcegraph_url.into(),
            client_application,
        }
    }

    /// Sets the bundle URL.
    #[must_use]
    pub fn with_bundle_url(mut self, bundle_url: impl Into<String>) -> Self {
        self.bundle_url = Some(bundle_url.into());
        self
    }

    /// Parses the host's JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the payload is malformed.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::config(format!("Invalid init data: {e}")))
    }

    /// Checks both URLs and returns the parsed Sourcegraph URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if either URL does not parse.
    pub fn validate(&self) -> Result<Url> {
        if let Some(bundle_url) = &self.bundle_url {
            Url::parse(bundle_url)
                .map_err(|e| Error::config(format!("Invalid bundleURL {bundle_url:?}: {e}")))?;
        }

        Url::parse(&self.sourcegraph_url).map_err(|e| {
            Error::config(format!(
                "Invalid sourcegraphURL {:?}: {e}",
                self.sourcegraph_url
            ))
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_reads_host_payload() {
        let init = InitData::from_json(
            r#"{"sourcegraphURL":"https://sourcegraph.com","clientApplication":"other"}"#,
        )
        .expect("parse");
        assert_eq!(init.client_application, ClientApplication::Other);
        assert_eq!(init.bundle_url, None);
        assert_eq!(
            init.validate().expect("valid").host_str(),
            Some("sourcegraph.com")
        );
    }

    #[test]
    fn test_invalid_payload_and_urls() {
        assert!(matches!(
            InitData::from_json(r#"{"sourcegraphURL":"x","clientApplication":"vim"}"#),
            Err(Error::Config { .. })
        ));

        let init = InitData::new("not a url", ClientApplication::Sourcegraph);
        assert!(matches!(init.validate(), Err(Error::Config { .. })));

        let init = InitData::new("https://sourcegraph.com", ClientApplication::Sourcegraph)
            .with_bundle_url("::");
        assert!(matches!(init.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_serializes_with_host_field_names() {
        let init = InitData::new("https://example.com", ClientApplication::Sourcegraph)
            .with_bundle_url("https://example.com/ext.js");
        assert_eq!(
            serde_json::to_value(&init).expect("serialize"),
            serde_json::json!({
                "bundleURL": "https://example.com/ext.js",
                "sourcegraphURL": "https://example.com",
                "clientApplication": "sourcegraph"
            })
        );
    }
}
