//! MCP server exposing the mail actions as tools
//!
//! Body tools are always available. Open tools change what is on the user's
//! screen, so they require `FRUITMAIL_OPEN_ENABLED=true`. Tool calls are not
//! serialized against each other; Mail sees concurrent scripts if the client
//! issues concurrent calls.

use std::sync::Arc;
use std::time::Instant;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{ErrorData, ServerCapabilities, ServerInfo};
use rmcp::{Json, ServerHandler, tool, tool_handler, tool_router};

use crate::actions::{MailActions, message_url, strip_angle_brackets};
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult};
use crate::locator::DbLocator;
use crate::lookup::RawEvidence;
use crate::models::{
    DatabaseLocation, DocumentIdInput, MessageBody, Meta, OpenResult, RowIdInput, ToolEnvelope,
};
use crate::runner::OsascriptRunner;

/// Fruitmail MCP server
#[derive(Clone)]
pub struct FruitmailServer {
    config: Arc<AppConfig>,
    actions: Arc<MailActions<OsascriptRunner>>,
    locator: Arc<DbLocator>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FruitmailServer {
    pub fn new(config: AppConfig) -> Self {
        let runner = OsascriptRunner::new(&config.osascript_program, config.script_timeout_ms);
        let locator = DbLocator::new(config.db_override.clone(), config.mail_root.clone());
        Self {
            config: Arc::new(config),
            actions: Arc::new(MailActions::new(runner)),
            locator: Arc::new(locator),
            tool_router: Self::tool_router(),
        }
    }

    /// Tool: Fetch a message body by row id
    #[tool(
        name = "mail_get_body",
        description = "Get the plain-text body of a Mail message by envelope row id"
    )]
    async fn get_body(
        &self,
        Parameters(input): Parameters<RowIdInput>,
    ) -> Result<Json<ToolEnvelope<MessageBody>>, ErrorData> {
        let started = Instant::now();
        let result = self
            .actions
            .get_email_body(input.row_id.trim())
            .await
            .map(body_summary);
        finalize_tool(started, result)
    }

    /// Tool: Fetch a message body from loose evidence
    #[tool(
        name = "mail_get_body_by_lookup",
        description = "Get a Mail message body using Message-IDs, row ids, mailbox hints, subject, and sender as fallbacks"
    )]
    async fn get_body_by_lookup(
        &self,
        Parameters(input): Parameters<RawEvidence>,
    ) -> Result<Json<ToolEnvelope<MessageBody>>, ErrorData> {
        let started = Instant::now();
        let result = self
            .actions
            .get_email_body_by_lookup(&input)
            .await
            .map(body_summary);
        finalize_tool(started, result)
    }

    /// Tool: Open a message by Message-ID
    #[tool(
        name = "mail_open",
        description = "Open a message in Mail by its Message-ID header"
    )]
    async fn open(
        &self,
        Parameters(input): Parameters<DocumentIdInput>,
    ) -> Result<Json<ToolEnvelope<OpenResult>>, ErrorData> {
        let started = Instant::now();
        let result = self.open_impl(&input.document_id).await;
        finalize_tool(started, result)
    }

    /// Tool: Open a message by row id
    #[tool(
        name = "mail_open_by_row_id",
        description = "Open a message in Mail by envelope row id"
    )]
    async fn open_by_row_id(
        &self,
        Parameters(input): Parameters<RowIdInput>,
    ) -> Result<Json<ToolEnvelope<OpenResult>>, ErrorData> {
        let started = Instant::now();
        let result = match require_open_enabled(&self.config) {
            Ok(()) => self
                .actions
                .open_email_by_row_id(input.row_id.trim())
                .await
                .map(|()| opened(None)),
            Err(e) => Err(e),
        };
        finalize_tool(started, result)
    }

    /// Tool: Open a message from loose evidence
    #[tool(
        name = "mail_open_by_lookup",
        description = "Open a message in Mail using Message-IDs, row ids, mailbox hints, subject, and sender as fallbacks"
    )]
    async fn open_by_lookup(
        &self,
        Parameters(input): Parameters<RawEvidence>,
    ) -> Result<Json<ToolEnvelope<OpenResult>>, ErrorData> {
        let started = Instant::now();
        let url = input
            .message_id_candidates
            .iter()
            .find(|id| !id.trim().is_empty())
            .map(|id| message_url(id));
        let result = match require_open_enabled(&self.config) {
            Ok(()) => self
                .actions
                .open_email_by_lookup(&input)
                .await
                .map(|()| opened(url)),
            Err(e) => Err(e),
        };
        finalize_tool(started, result)
    }

    /// Tool: Report the Mail database path
    #[tool(
        name = "mail_locate_database",
        description = "Locate the Mail envelope index database"
    )]
    async fn locate_database(&self) -> Result<Json<ToolEnvelope<DatabaseLocation>>, ErrorData> {
        let started = Instant::now();
        let result = self.locator.locate().await.map(|path| {
            let path = path.display().to_string();
            (format!("Mail database at {path}"), DatabaseLocation { path })
        });
        finalize_tool(started, result)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for FruitmailServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build()).with_instructions(
            "Apple Mail message access over AppleScript. Body tools are enabled by default; open tools require FRUITMAIL_OPEN_ENABLED=true.",
        )
    }
}

impl FruitmailServer {
    async fn open_impl(&self, document_id: &str) -> AppResult<(String, OpenResult)> {
        require_open_enabled(&self.config)?;
        self.actions.open_email(document_id).await?;
        let url = (!strip_angle_brackets(document_id.trim()).is_empty())
            .then(|| message_url(document_id));
        Ok(opened(url))
    }
}

fn body_summary(body: String) -> (String, MessageBody) {
    let body = MessageBody::new(body);
    (format!("Message body ({} chars)", body.chars), body)
}

fn opened(message_url: Option<String>) -> (String, OpenResult) {
    (
        "Message opened in Mail".to_owned(),
        OpenResult {
            opened: true,
            message_url,
        },
    )
}

/// Calculate elapsed milliseconds
fn duration_ms(started: Instant) -> u64 {
    started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64
}

/// Build a standardized MCP tool response envelope from business logic output
fn finalize_tool<T>(
    started: Instant,
    result: AppResult<(String, T)>,
) -> Result<Json<ToolEnvelope<T>>, ErrorData>
where
    T: schemars::JsonSchema,
{
    match result {
        Ok((summary, data)) => Ok(Json(ToolEnvelope {
            summary,
            data,
            meta: Meta::now(duration_ms(started)),
        })),
        Err(e) => Err(e.to_error_data()),
    }
}

/// Check if open tools are enabled
fn require_open_enabled(config: &AppConfig) -> AppResult<()> {
    if !config.open_enabled {
        return Err(AppError::InvalidInput(
            "open tools are disabled; set FRUITMAIL_OPEN_ENABLED=true".to_owned(),
        ));
    }
    Ok(())
}
