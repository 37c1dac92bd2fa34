//! CLI command definitions and handlers

use anyhow::{Context, Result};
use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use tracing::{debug, warn};

use ami_helper::ami::{find_dids_with_hashtags, find_hashtag, find_hashtag_tuples};
use ami_helper::datamodel::{get_campaign, tag_combinations};
use ami_helper::{execute, CentralPageHashAddress, HttpClient, Scope};
use ami_helper_core::Config;

/// ami-helper - Find ATLAS datasets by AMI hashtag
#[derive(Parser)]
#[command(name = "ami-helper")]
#[command(version)]
#[command(about = "Find ATLAS Monte Carlo datasets by AMI hashtag")]
#[command(after_help = "\
BEFORE YOU START:
    AMI needs a valid grid proxy. Run voms-proxy-init -voms atlas first.
    The proxy is read from $X509_USER_PROXY (default /tmp/x509up_u<uid>).

EXAMPLES:
    ami-helper hashtags list mc23_13p6TeV ttbar
    ami-helper hashtags find mc23_13p6TeV ttbar
    ami-helper datasets with-hashtags mc23_13p6TeV Top ttbar Dilepton Nominal
    ami-helper datasets campaign mc23_13p6TeV mc23_13p6TeV.801167.DAOD_LLP1.e8514_s4162_r15540_p6266
    ami-helper scopes

CONFIG:
    ~/.config/ami-helper/config.toml may set endpoint, x509_user_proxy and
    x509_cert_dir. AMI_ENDPOINT, X509_USER_PROXY and X509_CERT_DIR override it.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v for INFO, -vv for DEBUG)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Commands for working with AMI hashtags
    #[command(subcommand)]
    Hashtags(HashtagCommands),

    /// Commands for working with datasets
    #[command(subcommand)]
    Datasets(DatasetCommands),

    /// List the supported production scopes
    Scopes,
}

#[derive(Subcommand)]
pub enum HashtagCommands {
    /// List hashtags whose name contains a string
    List {
        /// Scope for the search
        scope: Scope,

        /// Text to look for in hashtag names (case-insensitive)
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        search: String,
    },

    /// List all AMI hashtag 4-tuples containing a string
    Find {
        /// Scope for the search
        scope: Scope,

        /// Text to look for in hashtag names (case-insensitive)
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        search: String,
    },
}

#[derive(Subcommand)]
pub enum DatasetCommands {
    /// Find datasets carrying all four hashtags
    WithHashtags {
        /// Scope for the search
        scope: Scope,

        /// First hashtag (PMGL1)
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        hashtag_level1: String,

        /// Second hashtag (PMGL2)
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        hashtag_level2: String,

        /// Third hashtag (PMGL3)
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        hashtag_level3: String,

        /// Fourth hashtag (PMGL4)
        #[arg(value_parser = NonEmptyStringValueParser::new())]
        hashtag_level4: String,
    },

    /// Name the production campaign of a dataset
    Campaign {
        /// Scope the dataset belongs to
        scope: Scope,

        /// Dataset name carrying its production tags
        dataset: String,
    },
}

/// Run the CLI
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Hashtags(HashtagCommands::List { scope, search }) => {
            cmd_hashtags_list(scope, &search, cli.json)
        }
        Commands::Hashtags(HashtagCommands::Find { scope, search }) => {
            cmd_hashtags_find(scope, &search, cli.json)
        }
        Commands::Datasets(DatasetCommands::WithHashtags {
            scope,
            hashtag_level1,
            hashtag_level2,
            hashtag_level3,
            hashtag_level4,
        }) => {
            let addr = CentralPageHashAddress::complete(
                scope,
                [
                    hashtag_level1.as_str(),
                    hashtag_level2.as_str(),
                    hashtag_level3.as_str(),
                    hashtag_level4.as_str(),
                ],
            );
            cmd_with_hashtags(&addr, cli.json)
        }
        Commands::Datasets(DatasetCommands::Campaign { scope, dataset }) => {
            cmd_campaign(scope, &dataset, cli.json)
        }
        Commands::Scopes => cmd_scopes(cli.json),
    }
}

/// Build an authenticated AMI client from configuration
fn connect() -> Result<HttpClient> {
    let config = Config::load()?;
    let client = HttpClient::new(&config)
        .with_context(|| format!("Could not set up AMI access for {}", config.endpoint))?;
    debug!("Using AMI at {}", client.endpoint());
    Ok(client)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_hashtags_list(scope: Scope, search: &str, json: bool) -> Result<()> {
    let client = connect()?;
    let result = execute(&client, scope.descriptor(), search)
        .with_context(|| format!("Hashtag search for '{}' in {} failed", search, scope))?;

    if json {
        return print_json(&result);
    }

    if result.is_empty() {
        warn!("No hashtags in {} match '{}'", scope, search);
    }
    for row in result.rows() {
        println!(
            "{} {}",
            row.get("SCOPE").unwrap_or("?"),
            row.get("NAME").unwrap_or("?")
        );
    }
    Ok(())
}

fn cmd_hashtags_find(scope: Scope, search: &str, json: bool) -> Result<()> {
    let client = connect()?;
    let matches = find_hashtag(&client, scope, search)
        .with_context(|| format!("Hashtag search for '{}' in {} failed", search, scope))?;

    if matches.is_empty() {
        warn!("No hashtags in {} match '{}'", scope, search);
    }

    let mut tuples = Vec::new();
    for addr in &matches {
        tuples.extend(find_hashtag_tuples(&client, addr)?);
    }

    if json {
        return print_json(&tuples);
    }

    for tuple in &tuples {
        println!("{}", tuple);
    }
    Ok(())
}

fn cmd_with_hashtags(addr: &CentralPageHashAddress, json: bool) -> Result<()> {
    let client = connect()?;
    let ldns = find_dids_with_hashtags(&client, addr)
        .with_context(|| format!("Dataset search for {} in {} failed", addr, addr.scope))?;

    if json {
        return print_json(&ldns);
    }

    if ldns.is_empty() {
        warn!("No datasets in {} carry {}", addr.scope, addr);
    }
    for ldn in &ldns {
        println!("{}", ldn);
    }
    Ok(())
}

fn cmd_campaign(scope: Scope, dataset: &str, json: bool) -> Result<()> {
    let tags = scope.descriptor().scope_tags()?;
    let campaign = get_campaign(tags, dataset)?;

    if json {
        return print_json(&serde_json::json!({
            "dataset": dataset,
            "campaign": campaign,
        }));
    }

    println!("{}", campaign);
    Ok(())
}

fn cmd_scopes(json: bool) -> Result<()> {
    let descriptors: Vec<_> = Scope::ALL.iter().map(|s| s.descriptor()).collect();

    if json {
        return print_json(&descriptors);
    }

    for d in descriptors {
        println!("{}  {}", d.name.bold(), d.table_hint.dimmed());
        match d.tags {
            Some(tags) => {
                for (label, pairs) in tag_combinations(tags) {
                    println!("    {:<14} {}", label, pairs.join(" "));
                }
            }
            None => println!("    {}", "no campaign tags known".dimmed()),
        }
    }
    Ok(())
}
