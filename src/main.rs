use anyhow::Result;
use colored::Colorize;

use ssmgate::aws::ControlPlane;
use ssmgate::aws::client::AwsControlPlane;
use ssmgate::cli::{Cli, Commands};
use ssmgate::config::Config;
use ssmgate::prompt::DialoguerPrompt;
use ssmgate::resolve::{self, ResolutionContext};
use ssmgate::session::{self, SessionBroker};
use ssmgate::{AppResult, init_logging};

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse_args();
    let config = Config::load_or_default(&cli.config_file);

    init_logging(&cli.effective_log_level(&config))?;
    tracing::debug!("CLI arguments: {:?}", cli);

    match cli.command() {
        Commands::Config { action } => Config::handle_command(&cli.config_file, &action)?,
        Commands::Start => run_command(&cli, &config, Mode::Start).await?,
        Commands::Ssh { exec } => run_command(&cli, &config, Mode::Ssh(exec)).await?,
        Commands::Scp { exec } => run_command(&cli, &config, Mode::Scp(exec)).await?,
    }

    Ok(())
}

enum Mode {
    Start,
    Ssh(String),
    Scp(String),
}

impl Mode {
    fn label(&self) -> &'static str {
        match self {
            Mode::Start => "start",
            Mode::Ssh(_) => "ssh",
            Mode::Scp(_) => "scp",
        }
    }
}

/// Resolve the target for `mode`, then drive the session lifecycle:
/// open, run the transport, and always close.
async fn run_command(cli: &Cli, config: &Config, mode: Mode) -> Result<()> {
    let mut ctx = resolution_context(cli, config);
    let control_plane = AwsControlPlane::new(ctx.profile.clone());
    let prompt = DialoguerPrompt;

    resolve::ensure_region(&mut ctx, &control_plane, &prompt).await?;

    let resolved = match &mode {
        Mode::Start => {
            let instance_id = resolve::ensure_target(&mut ctx, &control_plane, &prompt).await?;
            resolve::ResolvedTarget {
                region: ctx.region.clone().unwrap_or_default(),
                instance_id,
            }
        }
        Mode::Ssh(exec) => resolve::resolve_shell(&mut ctx, &control_plane, &prompt, exec).await?,
        Mode::Scp(exec) => resolve::resolve_copy(&mut ctx, &control_plane, &prompt, exec).await?,
    };

    print_ready(mode.label(), &ctx, &resolved.instance_id);

    let broker = SessionBroker::new(&control_plane);
    let handle = broker.open(&resolved.region, &resolved.instance_id).await?;

    let endpoint = control_plane.session_endpoint(&resolved.region);
    let args = handle.plugin_args(ctx.profile_name(), &resolved.instance_id, &endpoint);

    session::run_transport(&broker, &handle, plugin_path(cli, config), &args).await?;

    Ok(())
}

/// CLI flags take precedence over config file values when seeding the
/// resolution context.
fn resolution_context(cli: &Cli, config: &Config) -> ResolutionContext {
    ResolutionContext::new(
        cli.profile.clone().or_else(|| Some(config.profile.clone())),
        cli.region.clone().or_else(|| Some(config.region.clone())),
        cli.target.clone().or_else(|| Some(config.target.clone())),
    )
}

fn plugin_path<'a>(cli: &'a Cli, config: &'a Config) -> &'a str {
    cli.plugin.as_deref().unwrap_or(&config.plugin)
}

fn print_ready(command: &str, ctx: &ResolutionContext, target: &str) {
    println!(
        "[{}] profile: {}, region: {}, target: {}",
        command.green(),
        ctx.profile_name().yellow(),
        ctx.region.as_deref().unwrap_or_default().yellow(),
        target.yellow()
    );
}
