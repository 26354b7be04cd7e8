//! fruitmail: find Apple Mail messages and act on them
//!
//! Mail offers no stable numeric message API, so a message is resolved from
//! whatever evidence the caller has (row id, Message-ID, mailbox hints,
//! subject, sender) by a generated AppleScript that tries each kind of
//! evidence in a fixed order. The resolved message is then either read or
//! opened in Mail.
//!
//! # Architecture
//!
//! - [`main`]: Process entry point with env loading and command dispatch
//! - [`cli`]: Command-line definition
//! - [`config`]: Environment-driven settings
//! - [`errors`]: Application error model with MCP error mapping
//! - [`lookup`]: Evidence normalization into a lookup context
//! - [`escape`]: AppleScript literal escaping
//! - [`script`]: Resolution script generation
//! - [`runner`]: `osascript` execution
//! - [`dispatch`]: Script dispatch and output classification
//! - [`actions`]: Body/open entry points with validation
//! - [`locator`]: Mail database discovery
//! - [`server`]: MCP tool handlers over stdio
//! - [`models`]: Tool DTOs

mod actions;
mod cli;
mod config;
mod dispatch;
mod errors;
mod escape;
mod locator;
mod lookup;
mod models;
mod runner;
mod script;
mod server;

use std::process::ExitCode;

use clap::Parser;
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use tracing::error;
use tracing_subscriber::EnvFilter;

use actions::MailActions;
use cli::{Cli, Command};
use config::AppConfig;
use locator::DbLocator;
use runner::OsascriptRunner;

/// Application entry point
///
/// Logs go to stderr; stdout carries only command output (or the MCP
/// protocol under `serve`).
///
/// # Example
///
/// ```no_run
/// RUST_LOG=fruitmail=debug cargo run -- find --subject "Invoice" --sender billing@example.com
/// ```
#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load_from_env()?;
    if let Some(db) = cli.db {
        config.db_override = Some(db);
    }

    let actions = || {
        MailActions::new(OsascriptRunner::new(
            config.osascript_program.clone(),
            config.script_timeout_ms,
        ))
    };

    match cli.command {
        Command::Body { row_id } => {
            println!("{}", actions().get_email_body(&row_id).await?);
        }
        Command::Open { document_id } => actions().open_email(&document_id).await?,
        Command::OpenRow { row_id } => actions().open_email_by_row_id(&row_id).await?,
        Command::Find(args) => {
            let evidence = args.evidence();
            if args.open {
                actions().open_email_by_lookup(&evidence).await?;
            } else {
                println!("{}", actions().get_email_body_by_lookup(&evidence).await?);
            }
        }
        Command::DbPath => {
            let locator = DbLocator::new(config.db_override.clone(), config.mail_root.clone());
            println!("{}", locator.locate().await?.display());
        }
        Command::Serve => {
            let service = server::FruitmailServer::new(config.clone()).serve(stdio()).await?;
            service.waiting().await?;
        }
    }
    Ok(())
}
