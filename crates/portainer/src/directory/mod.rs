//! The [`StackDirectory`] trait and its implementations.
//!
//! The primary implementation is [`http::PortainerClient`], a blocking client
//! holding an authenticated session. [`MockDirectory`] keeps everything in
//! memory and records the calls it receives, for testing reconciliation logic
//! without network access.

pub mod http;

use crate::error::{Error, Result};
use crate::types::{CreateStack, Stack, UpdateStack};
use std::collections::HashSet;
use std::sync::Mutex;

/// Capability set the deploy engine needs from a Portainer instance.
///
/// Every call can fail with a transport or auth error; callers decide how to
/// react. No retries happen at this level.
pub trait StackDirectory {
    /// List all stacks visible to the session, across endpoints.
    fn list_stacks(&self) -> Result<Vec<Stack>>;

    /// Create a stack that does not exist yet.
    fn create_stack(&self, req: &CreateStack) -> Result<()>;

    /// Redeploy an existing stack in place.
    fn update_stack(&self, req: &UpdateStack) -> Result<()>;
}

/// In-memory directory for tests.
///
/// Pre-load it with stacks, optionally mark names/ids as failing, then assert
/// on the recorded create/update calls.
#[derive(Debug, Default)]
pub struct MockDirectory {
    stacks: Vec<Stack>,
    created: Mutex<Vec<CreateStack>>,
    updated: Mutex<Vec<UpdateStack>>,
    fail_create: Mutex<HashSet<String>>,
    fail_update: Mutex<HashSet<i64>>,
}

impl MockDirectory {
    /// Create an empty mock directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock directory pre-loaded with stacks.
    #[must_use]
    pub fn with_stacks(stacks: Vec<Stack>) -> Self {
        Self {
            stacks,
            ..Self::default()
        }
    }

    /// Make `create_stack` fail for the given stack name.
    pub fn fail_create_for(&self, name: impl Into<String>) {
        self.fail_create.lock().unwrap().insert(name.into());
    }

    /// Make `update_stack` fail for the given stack id.
    pub fn fail_update_for(&self, id: i64) {
        self.fail_update.lock().unwrap().insert(id);
    }

    /// Create calls received so far, in order.
    #[must_use]
    pub fn created(&self) -> Vec<CreateStack> {
        self.created.lock().unwrap().clone()
    }

    /// Update calls received so far, in order.
    #[must_use]
    pub fn updated(&self) -> Vec<UpdateStack> {
        self.updated.lock().unwrap().clone()
    }

    /// Total number of mutating calls received.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.created.lock().unwrap().len() + self.updated.lock().unwrap().len()
    }
}

impl StackDirectory for MockDirectory {
    fn list_stacks(&self) -> Result<Vec<Stack>> {
        Ok(self.stacks.clone())
    }

    fn create_stack(&self, req: &CreateStack) -> Result<()> {
        if self.fail_create.lock().unwrap().contains(&req.name) {
            return Err(Error::http(
                format!("mock create failure for {}", req.name),
                Some(500),
            ));
        }
        self.created.lock().unwrap().push(req.clone());
        Ok(())
    }

    fn update_stack(&self, req: &UpdateStack) -> Result<()> {
        if self.fail_update.lock().unwrap().contains(&req.id) {
            return Err(Error::http(
                format!("mock update failure for stack {}", req.id),
                Some(500),
            ));
        }
        self.updated.lock().unwrap().push(req.clone());
        Ok(())
    }
}
