//! # portainer
//!
//! Minimal blocking client for the Portainer stacks API.
//!
//! This crate covers exactly the capability set a deploy tool needs:
//! - Session login (`POST /api/auth`) and logout
//! - Listing stacks across endpoints
//! - Creating swarm/compose stacks from inline definitions
//! - Updating a stack in place (definition, env, prune, pull)
//!
//! The [`directory::StackDirectory`] trait is the seam between deploy logic
//! and the network; [`directory::MockDirectory`] implements it in memory for
//! tests.
//!
//! ## Example
//!
//! ```no_run
//! use portainer::directory::http::PortainerClient;
//! use portainer::directory::StackDirectory;
//! use portainer::Credentials;
//!
//! let client = PortainerClient::login(
//!     "https://portainer.example.com",
//!     &Credentials {
//!         username: "deploy".into(),
//!         password: "secret".into(),
//!     },
//!     true,
//! )?;
//!
//! for stack in client.list_stacks()? {
//!     println!("{} (endpoint {})", stack.name, stack.endpoint_id);
//! }
//! # Ok::<(), portainer::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod directory;
pub mod error;
pub mod types;

pub use directory::MockDirectory;
pub use directory::StackDirectory;
pub use directory::http::PortainerClient;
pub use error::{Error, Result};
pub use types::{CreateStack, Credentials, EnvVar, Stack, StackKind, UpdateStack};
