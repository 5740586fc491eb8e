use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "simili",
    about = "Issue triage automation for GitHub repositories",
    version
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value_t = false,
        help = "Emit debug logs on stderr (RUST_LOG overrides)"
    )]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Close potential-duplicate issues whose grace period expired without human activity.
    AutoClose(AutoCloseArgs),
}

#[derive(Debug, Clone, Args)]
pub struct AutoCloseArgs {
    #[arg(
        long,
        env = "GITHUB_REPOSITORY",
        help = "Repository to scan in owner/name format"
    )]
    pub repo: String,

    #[arg(
        long = "dry-run",
        default_value_t = false,
        help = "Evaluate and count closes without commenting on or closing issues"
    )]
    pub dry_run: bool,

    #[arg(
        long = "grace-period-minutes",
        help = "Override the configured grace period, in minutes. 0 expires immediately"
    )]
    pub grace_period_minutes: Option<u64>,

    #[arg(
        long,
        env = "SIMILI_CONFIG",
        help = "Policy file path. Defaults to the first of .github/simili.yaml, .github/simili.yml, simili.yaml, simili.yml"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "api-base",
        env = "GITHUB_API_URL",
        default_value = "https://api.github.com",
        help = "GitHub API base URL"
    )]
    pub api_base: String,

    #[arg(
        long,
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        help = "GitHub token used for API access"
    )]
    pub token: Option<String>,

    #[arg(
        long = "request-timeout-ms",
        default_value_t = 30_000,
        value_parser = parse_positive_u64,
        help = "Timeout for each GitHub API request"
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long = "retry-max-attempts",
        default_value_t = 3,
        value_parser = parse_positive_usize,
        help = "Attempts per GitHub request, including the first"
    )]
    pub retry_max_attempts: usize,
}

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, CliCommand};

    #[test]
    fn unit_cli_parses_auto_close_flags() {
        let cli = Cli::try_parse_from([
            "simili",
            "auto-close",
            "--repo",
            "similigh/simili-bot",
            "--dry-run",
            "--grace-period-minutes",
            "0",
            "--config",
            "custom.yaml",
            "--api-base",
            "http://localhost:9000",
            "--token",
            "secret",
            "--verbose",
        ])
        .expect("parse cli");
        assert!(cli.verbose);
        let CliCommand::AutoClose(args) = cli.command;
        assert_eq!(args.repo, "similigh/simili-bot");
        assert!(args.dry_run);
        assert_eq!(args.grace_period_minutes, Some(0));
        assert_eq!(
            args.config.as_deref(),
            Some(std::path::Path::new("custom.yaml"))
        );
        assert_eq!(args.api_base, "http://localhost:9000");
        assert_eq!(args.token.as_deref(), Some("secret"));
    }

    #[test]
    fn regression_cli_rejects_zero_retry_attempts() {
        let error = Cli::try_parse_from([
            "simili",
            "auto-close",
            "--repo",
            "o/r",
            "--retry-max-attempts",
            "0",
        ])
        .expect_err("zero attempts rejected");
        assert!(error.to_string().contains("value must be greater than 0"));
    }
}
