use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use tracing::{info, instrument};

use crate::Cli;

const STARTER_MANIFEST: &str = r#"# cmdhub plugin manifest.
#
# Each plugin registers commands under its own aliases. When an alias is
# already taken, the command stays reachable as `<plugin id>:<alias>`.

[[plugins]]
id = "hello"
name = "Hello"
version = "0.1.0"

[[plugins.commands]]
aliases = ["greet", "hi"]
program = "echo"
args = ["hello"]
description = "Greet someone"

[[plugins.commands]]
aliases = ["date"]
program = "date"
description = "Print the current date"
permission = "hello.date"
"#;

/// Writes a starter manifest to the configured path.
#[instrument(skip(cli))]
pub fn run(cli: &Cli) -> Result<()> {
    write_if_absent(&cli.manifest, STARTER_MANIFEST, cli.force)
        .with_context(|| format!("failed to write '{}'", cli.manifest))?;

    info!("init complete: manifest={}", cli.manifest);
    println!("next: run 'cmdhub --list'");
    Ok(())
}

fn write_if_absent(path: &str, content: &str, force: bool) -> Result<()> {
    let output = Path::new(path);

    if output.exists() && !force {
        return Err(anyhow!(
            "'{}' already exists. Re-run with --force to overwrite",
            path
        ));
    }

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }

    fs::write(output, content)
        .with_context(|| format!("failed to write file '{}'", output.display()))
}
