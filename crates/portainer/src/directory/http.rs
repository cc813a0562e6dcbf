//! Blocking Portainer API client.
//!
//! This module provides the [`PortainerClient`] implementation of
//! [`StackDirectory`](crate::directory::StackDirectory) over Portainer's REST
//! API. The client authenticates once at construction and holds the JWT for
//! its lifetime; there is no re-login or token refresh.

use crate::directory::StackDirectory;
use crate::error::{Error, Result};
use crate::types::{CreateStack, Credentials, EnvVar, Stack, UpdateStack};
use serde::{Deserialize, Serialize};
use ureq::Agent;
use ureq::tls::TlsConfig;

/// Authenticated client for one Portainer instance.
///
/// # Example
///
/// ```no_run
/// use portainer::directory::http::PortainerClient;
/// use portainer::directory::StackDirectory;
/// use portainer::Credentials;
///
/// let client = PortainerClient::login(
///     "https://portainer.example.com",
///     &Credentials {
///         username: "deploy".into(),
///         password: "secret".into(),
///     },
///     true,
/// ).unwrap();
/// let stacks = client.list_stacks().unwrap();
/// println!("{} stacks", stacks.len());
/// ```
pub struct PortainerClient {
    /// HTTP agent for requests.
    agent: Agent,
    /// API base URL, `<host>/api`.
    api_base: String,
    /// Session token from `POST /api/auth`.
    jwt: String,
}

impl PortainerClient {
    /// Authenticate against `host` and return a client owning the session.
    ///
    /// With `verify_tls` set to `false` the server certificate is not
    /// validated (self-signed Portainer installs).
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if the login request fails or the response
    /// carries no token.
    pub fn login(host: &str, credentials: &Credentials, verify_tls: bool) -> Result<Self> {
        let agent = if verify_tls {
            Agent::new_with_defaults()
        } else {
            let config = Agent::config_builder()
                .tls_config(TlsConfig::builder().disable_verification(true).build())
                .build();
            Agent::new_with_config(config)
        };

        let api_base = format!("{}/api", host.trim_end_matches('/'));
        let url = format!("{}/auth", api_base);

        let response: AuthResponse = agent
            .post(&url)
            .send_json(credentials)
            .map_err(|e| Error::Auth {
                host: host.to_string(),
                message: e.to_string(),
            })?
            .body_mut()
            .read_json()
            .map_err(|e| Error::Auth {
                host: host.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            agent,
            api_base,
            jwt: response.jwt,
        })
    }

    /// Invalidate the session server-side.
    ///
    /// The client is consumed; the token is useless afterwards either way.
    pub fn logout(self) -> Result<()> {
        let url = format!("{}/auth/logout", self.api_base);
        self.agent
            .post(&url)
            .header("Authorization", &self.bearer())
            .send_empty()?;
        Ok(())
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.jwt)
    }

    /// Build the create-stack URL for a request.
    ///
    /// Portainer routes creation by kind and content method; definitions are
    /// always submitted as inline strings here.
    fn create_url(&self, req: &CreateStack) -> String {
        format!(
            "{}/stacks/create/{}/string",
            self.api_base,
            req.kind.path_segment()
        )
    }

    fn update_url(&self, id: i64) -> String {
        format!("{}/stacks/{}", self.api_base, id)
    }
}

impl StackDirectory for PortainerClient {
    fn list_stacks(&self) -> Result<Vec<Stack>> {
        let url = format!("{}/stacks", self.api_base);

        let stacks: Vec<Stack> = self
            .agent
            .get(&url)
            .header("Authorization", &self.bearer())
            .call()?
            .body_mut()
            .read_json()
            .map_err(|e| Error::InvalidResponse(e.to_string()))?;

        Ok(stacks)
    }

    fn create_stack(&self, req: &CreateStack) -> Result<()> {
        let body = CreateStackBody {
            name: &req.name,
            stack_file_content: &req.definition,
            swarm_id: req.swarm_id.as_deref(),
        };

        self.agent
            .post(&self.create_url(req))
            .header("Authorization", &self.bearer())
            .query("type", req.kind.code().to_string())
            .query("method", "string")
            .query("endpointId", req.endpoint_id.to_string())
            .send_json(&body)?;

        Ok(())
    }

    fn update_stack(&self, req: &UpdateStack) -> Result<()> {
        let body = UpdateStackBody {
            env: &req.env,
            stack_file_content: req.definition.as_deref(),
            prune: req.prune,
            pull_image: req.pull_image,
        };

        self.agent
            .put(&self.update_url(req.id))
            .header("Authorization", &self.bearer())
            .query("endpointId", req.endpoint_id.to_string())
            .send_json(&body)?;

        Ok(())
    }
}

// =============================================================================
// Portainer API request/response bodies
// =============================================================================

#[derive(Debug, Deserialize)]
struct AuthResponse {
    jwt: String,
}

#[derive(Debug, Serialize)]
struct CreateStackBody<'a> {
    name: &'a str,
    #[serde(rename = "stackFileContent")]
    stack_file_content: &'a str,
    #[serde(rename = "swarmID", skip_serializing_if = "Option::is_none")]
    swarm_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct UpdateStackBody<'a> {
    env: &'a [EnvVar],
    #[serde(rename = "stackFileContent", skip_serializing_if = "Option::is_none")]
    stack_file_content: Option<&'a str>,
    prune: bool,
    #[serde(rename = "pullImage")]
    pull_image: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StackKind;

    fn offline_client() -> PortainerClient {
        PortainerClient {
            agent: Agent::new_with_defaults(),
            api_base: "https://portainer.local/api".to_string(),
            jwt: "token".to_string(),
        }
    }

    #[test]
    fn test_create_url_by_kind() {
        let client = offline_client();
        let mut req = CreateStack {
            kind: StackKind::Swarm,
            endpoint_id: 1,
            name: "web".into(),
            definition: String::new(),
            swarm_id: Some("abc".into()),
        };
        assert_eq!(
            client.create_url(&req),
            "https://portainer.local/api/stacks/create/swarm/string"
        );

        req.kind = StackKind::Compose;
        assert_eq!(
            client.create_url(&req),
            "https://portainer.local/api/stacks/create/standalone/string"
        );
    }

    #[test]
    fn test_update_url() {
        let client = offline_client();
        assert_eq!(
            client.update_url(42),
            "https://portainer.local/api/stacks/42"
        );
    }

    #[test]
    fn test_api_base_strips_trailing_slash() {
        // Only the formatting logic is under test; no request is made.
        let api_base = format!("{}/api", "https://portainer.local/".trim_end_matches('/'));
        assert_eq!(api_base, "https://portainer.local/api");
    }

    #[test]
    fn test_create_body_omits_missing_swarm_id() {
        let body = CreateStackBody {
            name: "web",
            stack_file_content: "services: {}\n",
            swarm_id: None,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("stackFileContent"));
        assert!(!json.contains("swarmID"));
    }

    #[test]
    fn test_update_body_wire_names() {
        let env = vec![EnvVar {
            name: "RUST_LOG".into(),
            value: "info".into(),
        }];
        let body = UpdateStackBody {
            env: &env,
            stack_file_content: Some("services: {}\n"),
            prune: true,
            pull_image: false,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"pullImage\":false"));
        assert!(json.contains("\"prune\":true"));
        assert!(json.contains("\"stackFileContent\""));
        assert!(json.contains("\"RUST_LOG\""));
    }

    #[test]
    fn test_update_body_omits_missing_definition() {
        let body = UpdateStackBody {
            env: &[],
            stack_file_content: None,
            prune: false,
            pull_image: true,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("stackFileContent"));
    }
}
