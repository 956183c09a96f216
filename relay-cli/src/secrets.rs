//! Host metadata-service secret resolution.
//!
//! Resolves `metadata:<key>` configuration values against the GCE metadata
//! service's project attributes. Runs only during startup; failure to resolve
//! is fatal to the process, never to a running job.

use relay_core::{ConfigError, SecretResolver};

const DEFAULT_BASE_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/project/attributes";

/// Blocking metadata-service client.
#[derive(Debug, Clone)]
pub struct MetadataResolver {
    base_url: String,
}

impl Default for MetadataResolver {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl MetadataResolver {
    /// Resolver from the environment: `RELAY_METADATA_URL` overrides the
    /// metadata service base URL (useful outside GCE and in tests).
    pub fn from_env() -> Self {
        match std::env::var("RELAY_METADATA_URL") {
            Ok(base_url) if !base_url.is_empty() => Self::with_base_url(base_url),
            _ => Self::default(),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }
}

impl SecretResolver for MetadataResolver {
    fn resolve(&self, key: &str) -> Result<String, ConfigError> {
        let url = format!("{}/{key}", self.base_url.trim_end_matches('/'));
        let response = ureq::get(&url)
            .set("Metadata-Flavor", "Google")
            .call()
            .map_err(|err| ConfigError::SecretResolution {
                key: key.to_string(),
                message: err.to_string(),
            })?;
        response
            .into_string()
            .map_err(|err| ConfigError::SecretResolution {
                key: key.to_string(),
                message: err.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn resolves_a_project_attribute() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/mirror-to-url")
                .header("Metadata-Flavor", "Google");
            then.status(200).body("https://dst.example/repo.git");
        });

        let resolver = MetadataResolver::with_base_url(server.base_url());
        let value = resolver.resolve("mirror-to-url").expect("resolved");
        assert_eq!(value, "https://dst.example/repo.git");
        mock.assert();
    }

    #[test]
    fn missing_attribute_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/absent");
            then.status(404).body("not found");
        });

        let resolver = MetadataResolver::with_base_url(server.base_url());
        let err = resolver.resolve("absent").expect_err("missing");
        assert!(matches!(err, ConfigError::SecretResolution { key, .. } if key == "absent"));
    }

    #[test]
    fn unreachable_service_is_an_error() {
        // Grab an ephemeral port, then close it again so nothing listens.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
            listener.local_addr().expect("addr").port()
        };
        let resolver = MetadataResolver::with_base_url(format!("http://127.0.0.1:{port}"));
        assert!(resolver.resolve("anything").is_err());
    }
}
