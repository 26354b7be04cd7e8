//! Command-line interface
//!
//! One subcommand per mail action plus `serve`, which exposes the same
//! actions as MCP tools over stdio.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::lookup::{RawEvidence, RawRowId};

#[derive(Debug, Parser)]
#[command(name = "fruitmail")]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the Mail envelope index, overriding MAIL_DB and discovery.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the body of the message with this row id.
    Body {
        row_id: String,
    },
    /// Open the message with this Message-ID in Mail.
    Open {
        document_id: String,
    },
    /// Open the message with this row id in Mail.
    OpenRow {
        row_id: String,
    },
    /// Resolve a message from loose evidence and print or open it.
    Find(FindArgs),
    /// Print the path of the Mail envelope index.
    DbPath,
    /// Serve the mail tools over MCP stdio.
    Serve,
}

#[derive(Debug, clap::Args)]
pub struct FindArgs {
    /// Message-ID header value; may be repeated.
    #[arg(long = "message-id")]
    pub message_ids: Vec<String>,
    /// Envelope row id; may be repeated.
    #[arg(long = "row-id")]
    pub row_ids: Vec<String>,
    /// Mailbox name fragment to search first; may be repeated.
    #[arg(long = "mailbox")]
    pub mailboxes: Vec<String>,
    #[arg(long)]
    pub subject: Option<String>,
    #[arg(long)]
    pub sender: Option<String>,
    /// Open the message in Mail instead of printing its body.
    #[arg(long)]
    pub open: bool,
}

impl FindArgs {
    pub fn evidence(&self) -> RawEvidence {
        RawEvidence {
            numeric_id_candidates: self.row_ids.iter().cloned().map(RawRowId::Text).collect(),
            message_id_candidates: self.message_ids.clone(),
            mailbox_hints: self.mailboxes.clone(),
            subject: self.subject.clone(),
            sender: self.sender.clone(),
        }
    }
}
