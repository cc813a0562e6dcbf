use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "portside")]
#[command(version)]
#[command(about = "Deploy container stacks to a Portainer instance", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reconcile desired stacks against the Portainer instance
    Deploy(DeployArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Deploy
// ============================================================================

#[derive(Parser)]
pub struct DeployArgs {
    /// Portainer host, e.g. https://portainer.example.com
    #[arg(long, env = "PORTAINER_HOST")]
    pub host: String,

    /// Portainer username
    #[arg(long, env = "PORTAINER_USERNAME")]
    pub username: String,

    /// Portainer password
    #[arg(long, env = "PORTAINER_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Endpoint id the stacks are deployed under
    #[arg(long)]
    pub endpoint_id: i64,

    /// Deploy a single stack with this name
    #[arg(
        long,
        required_unless_present = "stacks_file",
        conflicts_with = "stacks_file"
    )]
    pub stack: Option<String>,

    /// Stack definition file (compose file) for the single stack
    #[arg(long, requires = "stack")]
    pub definition: Option<PathBuf>,

    /// Template variable for the definition, repeatable (KEY=VALUE)
    #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_template_var, requires = "stack")]
    pub vars: Vec<(String, String)>,

    /// Image reference to inject into the definition, e.g. registry/app:1.2.0
    #[arg(long, requires = "stack")]
    pub image: Option<String>,

    /// Swarm cluster id; when set, new stacks are created as swarm stacks
    #[arg(long)]
    pub swarm_id: Option<String>,

    /// YAML file declaring a batch of stacks to deploy
    #[arg(long)]
    pub stacks_file: Option<PathBuf>,

    /// Prune services that are no longer referenced on update
    #[arg(long)]
    pub prune: bool,

    /// Force a fresh image pull when updating
    #[arg(long)]
    pub pull_image: bool,

    /// Skip TLS certificate verification (self-signed Portainer installs)
    #[arg(long)]
    pub insecure: bool,

    /// Where to write the execution report
    #[arg(long, default_value = "portside-report.json")]
    pub report: PathBuf,
}

fn parse_template_var(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_template_var() {
        assert_eq!(
            parse_template_var("tag=1.2.0").unwrap(),
            ("tag".to_string(), "1.2.0".to_string())
        );
        // Values may themselves contain '='
        assert_eq!(
            parse_template_var("opts=a=b").unwrap(),
            ("opts".to_string(), "a=b".to_string())
        );
        assert!(parse_template_var("no-separator").is_err());
        assert!(parse_template_var("=value").is_err());
    }

    #[test]
    fn test_stack_and_stacks_file_are_exclusive() {
        let result = Cli::try_parse_from([
            "portside",
            "deploy",
            "--host",
            "https://p.local",
            "--username",
            "u",
            "--password",
            "p",
            "--endpoint-id",
            "1",
            "--stack",
            "web",
            "--stacks-file",
            "stacks.yml",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_one_of_stack_or_stacks_file_required() {
        let result = Cli::try_parse_from([
            "portside",
            "deploy",
            "--host",
            "https://p.local",
            "--username",
            "u",
            "--password",
            "p",
            "--endpoint-id",
            "1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_batch_deploy_parses() {
        let cli = Cli::try_parse_from([
            "portside",
            "deploy",
            "--host",
            "https://p.local",
            "--username",
            "u",
            "--password",
            "p",
            "--endpoint-id",
            "3",
            "--stacks-file",
            "stacks.yml",
            "--prune",
            "--pull-image",
        ])
        .unwrap();

        match cli.command {
            Command::Deploy(args) => {
                assert_eq!(args.endpoint_id, 3);
                assert!(args.stack.is_none());
                assert!(args.prune);
                assert!(args.pull_image);
                assert_eq!(args.report, PathBuf::from("portside-report.json"));
            }
            _ => panic!("expected deploy"),
        }
    }
}
