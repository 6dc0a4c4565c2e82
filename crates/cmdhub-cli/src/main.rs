use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;

use cmdhub_core::{CommandError, CommandService, CommandSource, Manifest};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod console;
mod init;
mod plugins;
mod styles;

use console::ConsoleSource;
use styles as s;

/// The command-line interface for cmdhub.
#[derive(Debug, Parser)]
#[command(name = "cmdhub")]
#[command(version)]
#[command(styles = s::get_clap_styles())]
#[command(about = "Run plugin commands registered under namespaced aliases")]
#[command(
    long_about = "cmdhub loads a plugin manifest, registers every plugin's commands and
dispatches a command line to them. When two plugins ask for the same alias,
the later one stays reachable as `<plugin id>:<alias>`.

Built-in commands:
  help [command]    List commands or describe one
  plugins           List plugins and their command counts
  echo <message>    Repeat a message
"
)]
pub(crate) struct Cli {
    /// Command line to dispatch, for example: `help`, `greet world`, `hello:greet world`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    line: Vec<String>,
    /// Path to the plugin manifest.
    #[arg(long, default_value = "cmdhub.toml")]
    manifest: String,
    /// Write a starter manifest and exit.
    #[arg(long, default_value_t = false)]
    init: bool,
    /// Overwrite the manifest when used with --init.
    #[arg(long, default_value_t = false)]
    force: bool,
    /// List registered commands grouped by plugin.
    #[arg(long, default_value_t = false)]
    list: bool,
    /// Print completions for the command line instead of running it.
    #[arg(long, default_value_t = false)]
    complete: bool,
    /// Name the console reports to commands.
    #[arg(long, default_value = "console")]
    source: String,
    /// Permission node held by the console; repeatable. Without any, every
    /// permission is granted.
    #[arg(long = "grant")]
    grants: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    debug!("parsed cli arguments: {:?}", cli);

    if cli.init {
        return init::run(&cli);
    }

    let manifest = load_manifest(&cli.manifest)?;
    let service = Arc::new(CommandService::new());
    cmdhub_builtins::register_builtins(&service)?;
    let bound = plugins::register_plugins(&manifest, &service)?;
    debug!("{} plugin commands bound", bound);

    let source = ConsoleSource::new(&cli.source, cli.grants.clone());
    execute(&cli, &service, &source)
}

fn load_manifest(path: &str) -> Result<Manifest> {
    if !Path::new(path).exists() {
        warn!("manifest '{}' not found; only built-in commands are available", path);
        return Ok(Manifest::default());
    }
    Manifest::load_from_file(path)
}

/// Lists, completes or dispatches the command line.
fn execute(cli: &Cli, service: &CommandService, source: &dyn CommandSource) -> Result<()> {
    let line = cli.line.join(" ");

    if cli.list {
        print_commands(service);
        return Ok(());
    }

    if cli.complete {
        for suggestion in service.suggestions(source, &line)? {
            println!("{suggestion}");
        }
        return Ok(());
    }

    if line.trim().is_empty() {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    }

    let alias = line.split_whitespace().next().unwrap_or_default();
    match service.call(source, &line, &[]) {
        Ok(true) => Ok(()),
        Ok(false) if service.contains_alias(alias) => {
            Err(anyhow!("command '{alias}' did not accept the input"))
        }
        Ok(false) => Err(anyhow!(
            "unknown command '{alias}'. Run 'cmdhub help' for a list"
        )),
        Err(CommandError::InvalidUsage { message, usage }) => {
            Err(anyhow!("{message}\nusage: {usage}"))
        }
        Err(e) => Err(e.into()),
    }
}

fn print_commands(service: &CommandService) {
    let mut owners = service.owners().into_iter().collect::<Vec<_>>();
    owners.sort_by(|a, b| a.id().cmp(b.id()));

    for owner in owners {
        println!("{}", s::paint(s::HEADER, &owner.to_string()));

        let mut mappings = service.owned_by(&owner).into_iter().collect::<Vec<_>>();
        mappings.sort_by(|a, b| a.primary_alias().cmp(b.primary_alias()));
        for mapping in mappings {
            let description = mapping
                .callable()
                .short_description()
                .unwrap_or_default();
            println!(
                "  {:<24} {}",
                s::paint(s::COMMAND, mapping.primary_alias()),
                s::paint(s::DESC, &description)
            );
        }
    }
}
