//! Mordant CLI
//!
//! Inlines the embedded CSS of an HTML email from a file or stdin.

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use mordant_css::StyleToken;
use mordant_dom::DomTree;
use mordant_html::{parse_html, print_tree};
use mordant_inliner::{InlinerConfig, MergePolicy, StylesInliner};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

/// Mordant: move `<style>` rules into `style` attributes for HTML email
#[derive(Parser, Debug)]
#[command(name = "mordant")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"EXAMPLES:
    # Inline a file, write to stdout
    mordant newsletter.html

    # Read stdin, write to a file
    cat newsletter.html | mordant -o out.html

    # Keep every matched declaration instead of resolving conflicts
    mordant --policy ALWAYS_APPEND newsletter.html

    # Inline the "html" member of a JSON document
    mordant --json payload.json

    # Show how the embedded CSS was tokenized
    mordant --print-tokens newsletter.html
"#)]
struct Cli {
    /// HTML (or JSON with --json) file to read; stdin when omitted
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Merge policy, overriding the configuration file
    #[arg(short, long, value_name = "POLICY", value_parser = parse_policy)]
    policy: Option<MergePolicy>,

    /// JSON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Treat the input as a JSON object with an "html" member
    #[arg(long)]
    json: bool,

    /// Remove scripts and event handler attributes
    #[arg(long)]
    sanitize: bool,

    /// Log every pipeline stage to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Print the tokenized stylesheet instead of inlining
    #[arg(long, conflicts_with = "print_tree")]
    print_tokens: bool,

    /// Print the inlined DOM tree instead of serialized HTML
    #[arg(long)]
    print_tree: bool,
}

fn parse_policy(value: &str) -> Result<MergePolicy, String> {
    MergePolicy::from_str(value)
        .map_err(|_| format!("expected one of {}", MergePolicy::names().join(", ")))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over the default level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let inliner = StylesInliner::new(load_config(cli)?).context("invalid configuration")?;
    let input = read_input(cli)?;

    let output = if cli.print_tokens {
        let stylesheet = inliner.stylesheet(&input)?;
        let mut text = String::new();
        for token in &stylesheet.tokens {
            describe_token(token, 0, &mut text);
        }
        for fragment in &stylesheet.remainder {
            text.push_str(&format!("{} {fragment}\n", "unparsed:".yellow()));
        }
        text
    } else if cli.print_tree {
        let mut tree: DomTree = parse_html(&input).context("failed to parse HTML")?;
        let report = inliner.inline_tree(&mut tree);
        tracing::debug!(?report, "inlined document");
        print_tree(&tree, tree.root())
    } else if cli.json {
        inliner.inline_json(&input)?
    } else {
        inliner.inline(&input)?
    };

    write_output(cli, &output)
}

fn load_config(cli: &Cli) -> Result<InlinerConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            InlinerConfig::from_json(&text)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => InlinerConfig::default(),
    };
    if let Some(policy) = cli.policy {
        config.policy = policy;
    }
    if cli.sanitize {
        config.sanitize = true;
    }
    Ok(config)
}

fn read_input(cli: &Cli) -> Result<String> {
    match &cli.input {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
        }
        None => {
            let mut text = String::new();
            let _ = io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

fn write_output(cli: &Cli, output: &str) -> Result<()> {
    match &cli.output {
        Some(path) => {
            fs::write(path, output).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            if !output.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
            Ok(())
        }
    }
}

/// One line per rule: selector, flags, specificity, then its declarations.
fn describe_token(token: &StyleToken, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let mut flags = Vec::new();
    if token.is_media_query {
        flags.push("at-rule");
    }
    if token.is_pseudo_selector {
        flags.push("pseudo");
    }
    if token.is_preserved {
        flags.push("preserved");
    }
    if token.is_inlinable() {
        flags.push("inline");
    }
    let specificity = token
        .specificity
        .map_or_else(|| "-".to_string(), |s| s.to_string());

    out.push_str(&format!(
        "{indent}{} [{}] {}\n",
        token.selector.cyan().bold(),
        flags.join(", "),
        specificity.dimmed()
    ));
    for property in &token.properties {
        let important = if property.important { " !important" } else { "" };
        out.push_str(&format!(
            "{indent}  {}: {}{}\n",
            property.name.green(),
            property.value,
            important.red()
        ));
    }
    for child in &token.children {
        describe_token(child, depth + 1, out);
    }
}
