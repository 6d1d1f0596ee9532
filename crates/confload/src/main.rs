//! confload - inspect and expand credential-gated configuration templates
//!
//! The loader normally runs embedded in a chat host. This binary covers
//! working on a template outside one:
//! - refs: list SECRET(title, attribute) references without touching the vault
//! - check: verify the template loads and summarize it
//! - expand: resolve every reference and print the resulting command lines

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use confload::{ConfigTemplate, VaultQuery};
use confload_core::{Passphrase, Paths};

#[derive(Parser)]
#[command(name = "confload")]
#[command(version)]
#[command(about = "Credential-gated configuration loader - expand vault secret references into host commands")]
#[command(after_help = r#"TEMPLATE:
    A host command script; lines may embed SECRET(title, attribute)
    references, each resolved through the vault CLI at expansion time.
    Default location: ~/.config/confload/confloadrc

ENVIRONMENT:
    CONFLOAD_TEMPLATE     template location
    CONFLOAD_VAULT_FILE   encrypted vault file (default ~/Passwords.kdbx)
    CONFLOAD_KEY_FILE     vault key file (default ~/Secret.key)
    CONFLOAD_VAULT_CLI    vault query program (default vault-cli)

SECURITY:
    The passphrase is read from a hidden prompt and handed to the vault
    CLI on stdin - never on its command line. Expansion is all-or-nothing:
    one failing reference aborts the whole load."#)]
struct Cli {
    /// Template location (overrides CONFLOAD_TEMPLATE)
    #[arg(long, global = true)]
    template: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List secret references in the template (no vault access)
    Refs {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Verify the template loads and summarize it
    Check,

    /// Resolve every reference and print the command lines to stdout
    Expand,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut paths = Paths::new();
    if let Some(template) = cli.template {
        paths.template = template;
    }

    match cli.command {
        Commands::Refs { json } => cmd_refs(&paths, json),
        Commands::Check => cmd_check(&paths),
        Commands::Expand => cmd_expand(&paths),
    }
}

fn load_template(paths: &Paths) -> Result<ConfigTemplate> {
    ConfigTemplate::load(&paths.template)
        .with_context(|| format!("failed to load template: {}", paths.template.display()))
}

/// List secret references
fn cmd_refs(paths: &Paths, json: bool) -> Result<()> {
    let template = load_template(paths)?;
    let refs = template.find_references();

    if json {
        println!("{}", serde_json::to_string_pretty(&refs)?);
        return Ok(());
    }

    if refs.is_empty() {
        println!("No secret references in {}", paths.template.display());
        return Ok(());
    }

    for reference in &refs {
        println!("  {}/{}", reference.title, reference.attribute);
    }

    Ok(())
}

/// Summarize the template
fn cmd_check(paths: &Paths) -> Result<()> {
    let template = load_template(paths)?;
    let refs = template.find_references();

    println!("Template: {}", paths.template.display());
    println!("  {} lines, {} secret references", template.line_count(), refs.len());

    if !paths.vault_file.exists() {
        println!("warning: vault file not found: {}", paths.vault_file.display());
    }
    if !paths.key_file.exists() {
        println!("warning: key file not found: {}", paths.key_file.display());
    }

    Ok(())
}

/// Expand the template and print the command stream
fn cmd_expand(paths: &Paths) -> Result<()> {
    let template = load_template(paths)?;

    let prompt = format!("Enter passphrase to unlock {}: ", paths.vault_label());
    let passphrase = Passphrase::new(
        rpassword::prompt_password(prompt).context("failed to read passphrase")?,
    );
    if passphrase.is_empty() {
        bail!("empty passphrase");
    }

    let vault = VaultQuery::from_paths(paths);
    let Ok(stream) = template.expand(&vault.bind(&passphrase)) else {
        // Deliberately generic: wrong passphrase, missing entry and an
        // unreadable vault are indistinguishable here.
        bail!("authentication failed (wrong passphrase?)");
    };

    for command in stream.commands() {
        println!("{command}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        let cli = Cli::try_parse_from(["confload", "refs"]).unwrap();
        assert!(matches!(cli.command, Commands::Refs { json: false }));

        let cli = Cli::try_parse_from(["confload", "refs", "--json"]).unwrap();
        assert!(matches!(cli.command, Commands::Refs { json: true }));

        let cli = Cli::try_parse_from(["confload", "check"]).unwrap();
        assert!(matches!(cli.command, Commands::Check));

        let cli =
            Cli::try_parse_from(["confload", "expand", "--template", "/tmp/confloadrc"]).unwrap();
        assert!(matches!(cli.command, Commands::Expand));
        assert_eq!(cli.template, Some(PathBuf::from("/tmp/confloadrc")));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["confload"]).is_err());
    }
}
