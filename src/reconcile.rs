//! Reconciliation engine - converges desired stacks onto the Portainer instance.
//!
//! Each desired stack is handled independently: its definition is rendered,
//! matched against the snapshot of existing stacks, and the minimal
//! create-or-update action is issued. A failing stack never stops the pass;
//! the failure is captured as that stack's outcome.

use crate::Context;
use crate::config::DesiredStack;
use crate::report::{ReportBuilder, StackOutcome};
use crate::template::{self, TemplateError};
use crate::ui;
use portainer::{CreateStack, Stack, StackDirectory, StackKind, UpdateStack};
use std::path::PathBuf;
use std::time::Instant;
use std::{fs, io};

/// Flags applied to every update in a pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReconcileOptions {
    pub prune: bool,
    pub pull_image: bool,
}

/// Terminal state of a successfully reconciled stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Created,
    Updated,
}

impl Applied {
    fn message(self) -> &'static str {
        match self {
            Self::Created => "created new stack",
            Self::Updated => "updated existing stack",
        }
    }
}

/// Why a single stack failed to reconcile.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("could not read definition file {path}: {source}")]
    Definition {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("stack '{name}' does not exist and no definition was provided")]
    MissingDefinition { name: String },

    #[error(transparent)]
    Directory(#[from] portainer::Error),
}

/// Reconcile one desired stack against the snapshot.
///
/// The snapshot is taken once per run and deliberately not refreshed between
/// items; stacks created earlier in the same pass are not visible to later
/// lookups.
pub fn reconcile(
    directory: &dyn StackDirectory,
    snapshot: &[Stack],
    desired: &DesiredStack,
    opts: ReconcileOptions,
) -> Result<Applied, ReconcileError> {
    let definition = render_definition(desired)?;
    if let Some(text) = &definition {
        log::debug!("rendered definition for '{}':\n{}", desired.name, text);
    }

    let existing = snapshot
        .iter()
        .find(|s| s.name == desired.name && s.endpoint_id == desired.endpoint_id);

    match existing {
        Some(stack) => {
            log::info!(
                "found existing stack '{}' (id {}), updating",
                stack.name,
                stack.id
            );
            directory.update_stack(&UpdateStack {
                id: stack.id,
                endpoint_id: stack.endpoint_id,
                // Env entries are carried forward verbatim, never invented or dropped
                env: stack.env.clone(),
                definition,
                prune: opts.prune,
                pull_image: opts.pull_image,
            })?;
            Ok(Applied::Updated)
        }
        None => {
            let definition = definition.ok_or_else(|| ReconcileError::MissingDefinition {
                name: desired.name.clone(),
            })?;
            let kind = if desired.swarm_id.is_some() {
                StackKind::Swarm
            } else {
                StackKind::Compose
            };
            log::info!("deploying new {} stack '{}'", kind, desired.name);
            directory.create_stack(&CreateStack {
                kind,
                endpoint_id: desired.endpoint_id,
                name: desired.name.clone(),
                definition,
                swarm_id: desired.swarm_id.clone(),
            })?;
            Ok(Applied::Created)
        }
    }
}

/// Run a full pass over the desired stacks, in order, recording one outcome
/// per stack into the report builder.
pub fn run(
    ctx: &Context,
    directory: &dyn StackDirectory,
    snapshot: &[Stack],
    desired: &[DesiredStack],
    opts: ReconcileOptions,
    builder: &mut ReportBuilder,
) {
    for stack in desired {
        let started = Instant::now();
        let result = reconcile(directory, snapshot, stack, opts);
        let duration_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(applied) => {
                if !ctx.quiet {
                    ui::success(&format!("{}: {}", stack.name, applied.message()));
                }
                builder.record(StackOutcome::passed(
                    &stack.name,
                    applied.message(),
                    duration_ms,
                ));
            }
            Err(e) => {
                if !ctx.quiet {
                    ui::error(&format!("{}: {}", stack.name, e));
                }
                builder.record(StackOutcome::failed(&stack.name, e.to_string(), duration_ms));
            }
        }
    }
}

/// Render the definition text for a desired stack, or `None` when the stack
/// declares no definition file (distinct from an empty definition).
fn render_definition(desired: &DesiredStack) -> Result<Option<String>, ReconcileError> {
    let Some(path) = &desired.definition_path else {
        log::info!(
            "no definition file for '{}', the deployed definition is kept",
            desired.name
        );
        return Ok(None);
    };

    let expanded = shellexpand::tilde(&path.to_string_lossy().into_owned()).into_owned();
    let raw = fs::read_to_string(&expanded).map_err(|source| ReconcileError::Definition {
        path: PathBuf::from(&expanded),
        source,
    })?;

    let rendered = template::render(&raw, &desired.template_vars)?;
    let image = desired.image.as_deref().unwrap_or_default();
    let substituted = template::substitute_image(&rendered, image)?;
    Ok(Some(substituted))
}
