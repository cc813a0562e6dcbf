//! Core types for the Portainer stacks API.
//!
//! Field names follow the wire format Portainer uses: stack objects are
//! PascalCase, environment entries are lowercase.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One environment variable attached to a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Variable name.
    pub name: String,
    /// Variable value.
    pub value: String,
}

/// A stack as reported by `GET /api/stacks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    /// Portainer-assigned stack id.
    #[serde(rename = "Id")]
    pub id: i64,
    /// Stack name, unique per endpoint.
    #[serde(rename = "Name")]
    pub name: String,
    /// Endpoint (cluster/host) the stack runs under.
    #[serde(rename = "EndpointId")]
    pub endpoint_id: i64,
    /// Environment variables currently set on the stack, in order.
    #[serde(rename = "Env", default)]
    pub env: Vec<EnvVar>,
}

/// Deployment kind of a stack.
///
/// Portainer encodes this as a numeric `type` query parameter: 1 for swarm,
/// 2 for standalone compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackKind {
    /// Swarm stack, requires a swarm cluster id.
    Swarm,
    /// Standalone docker-compose stack.
    Compose,
}

impl StackKind {
    /// Numeric code used in the create-stack query string.
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            Self::Swarm => 1,
            Self::Compose => 2,
        }
    }

    /// Path segment used in the create-stack URL.
    #[must_use]
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Swarm => "swarm",
            Self::Compose => "standalone",
        }
    }
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Swarm => write!(f, "swarm"),
            Self::Compose => write!(f, "compose"),
        }
    }
}

/// Credentials for `POST /api/auth`.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    /// Portainer username.
    pub username: String,
    /// Portainer password.
    pub password: String,
}

/// Parameters for creating a stack that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateStack {
    /// Deployment kind (swarm vs compose).
    pub kind: StackKind,
    /// Target endpoint id.
    pub endpoint_id: i64,
    /// Stack name.
    pub name: String,
    /// Full stack definition text (compose file content).
    pub definition: String,
    /// Swarm cluster id, required for swarm stacks.
    pub swarm_id: Option<String>,
}

/// Parameters for updating an existing stack in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStack {
    /// Portainer stack id.
    pub id: i64,
    /// Endpoint the stack runs under.
    pub endpoint_id: i64,
    /// Environment variables to keep on the stack, carried verbatim.
    pub env: Vec<EnvVar>,
    /// New definition text, or `None` to keep the deployed one.
    pub definition: Option<String>,
    /// Remove services no longer present in the definition.
    pub prune: bool,
    /// Force a fresh image pull on redeploy.
    pub pull_image: bool,
}
