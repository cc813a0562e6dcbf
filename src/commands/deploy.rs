use crate::Context;
use crate::cli::DeployArgs;
use crate::config::{DesiredStack, StacksFile};
use crate::reconcile::{self, ReconcileOptions};
use crate::report::ReportBuilder;
use crate::ui;
use anyhow::{Context as _, Result, bail};
use portainer::{Credentials, PortainerClient, StackDirectory};

pub fn run(ctx: &Context, args: DeployArgs) -> Result<()> {
    // Configuration problems surface before any session is opened
    let desired = desired_stacks(&args)?;

    let mut builder = ReportBuilder::start();

    if !ctx.quiet {
        ui::info(&format!("Logging in to {}...", args.host));
    }
    if ctx.verbose > 0 {
        ui::kv("endpoint", &args.endpoint_id.to_string());
        ui::kv("stacks", &desired.len().to_string());
    }
    let credentials = Credentials {
        username: args.username.clone(),
        password: args.password.clone(),
    };
    // Session failure is fatal: nothing has been attempted, no report is written
    let client = PortainerClient::login(&args.host, &credentials, !args.insecure)?;

    let snapshot = client
        .list_stacks()
        .context("Could not list existing stacks")?;
    log::info!(
        "snapshot holds {} existing stacks, deploying {}",
        snapshot.len(),
        desired.len()
    );

    let opts = ReconcileOptions {
        prune: args.prune,
        pull_image: args.pull_image,
    };
    reconcile::run(ctx, &client, &snapshot, &desired, opts, &mut builder);

    let report = builder.finish();
    report.write(&args.report)?;
    if !ctx.quiet {
        ui::info(&format!("Report written to {}", args.report.display()));
    }

    // Best-effort teardown; the run's result is already decided
    if let Err(e) = client.logout() {
        log::warn!("logout failed: {}", e);
    }

    let summary = &report.results.summary;
    if report.is_success() {
        if !ctx.quiet {
            ui::success(&format!("{} stack(s) deployed", summary.passed));
        }
        Ok(())
    } else {
        bail!(
            "{} of {} stack(s) failed to deploy",
            summary.failed,
            summary.tests
        );
    }
}

/// Resolve the CLI arguments into the ordered list of stacks to deploy.
///
/// A single `--stack` is just a one-element batch; everything downstream
/// operates on the list.
fn desired_stacks(args: &DeployArgs) -> Result<Vec<DesiredStack>> {
    if let Some(path) = &args.stacks_file {
        let file = StacksFile::load(path)?;
        return Ok(file.into_desired_stacks(args.endpoint_id, args.swarm_id.as_deref()));
    }

    // clap guarantees --stack is present when no stacks file is given
    let name = args
        .stack
        .clone()
        .context("either --stack or --stacks-file is required")?;
    Ok(vec![DesiredStack {
        name,
        endpoint_id: args.endpoint_id,
        definition_path: args.definition.clone(),
        template_vars: args.vars.iter().cloned().collect(),
        image: args.image.clone(),
        swarm_id: args.swarm_id.clone(),
    }])
}
