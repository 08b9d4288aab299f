//! MCP Server for book-manager-mcp
//!
//! MCP Protocol (stdio) <-> application::BookManagerClient
//!
//! 7 tools: books, reload, form, set_field, edit, submit, delete

use std::sync::Arc;

use rmcp::{
    handler::server::{tool::ToolCallContext, tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolRequestParams, CallToolResult, Content, Implementation, ListToolsResult,
        PaginatedRequestParams, ProtocolVersion, ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
    transport::stdio,
    ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::application::client::{BookManagerClient, SubmitOutcome};
use crate::application::error::ClientError;
use crate::application::view::{render_book_list, render_form};
use crate::domain::model::book::{Book, BookField};
use crate::domain::model::id::BookId;
use crate::domain::store::BookStore;

type SharedClient = Arc<Mutex<BookManagerClient<Box<dyn BookStore>>>>;

// =============================================================================
// Public entry point
// =============================================================================

/// MCP Serverを起動する。起動時に一度だけ一覧を読み込む。
pub async fn run(store: Box<dyn BookStore>) -> anyhow::Result<()> {
    let server = BookManagerServer::new(store);

    // 読み込み失敗はログ済み。`reload` で取り直せる
    if server.client.lock().await.load().await.is_err() {
        info!("starting with an empty book list");
    }

    let service = server.serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}

// =============================================================================
// MCP Server
// =============================================================================

#[derive(Clone)]
struct BookManagerServer {
    client: SharedClient,
    tool_router: ToolRouter<Self>,
}

impl BookManagerServer {
    fn new(store: Box<dyn BookStore>) -> Self {
        Self {
            client: Arc::new(Mutex::new(BookManagerClient::new(store))),
            tool_router: Self::tool_router(),
        }
    }

    fn to_mcp_error(e: ClientError) -> McpError {
        match e {
            ClientError::Form(e) => McpError::invalid_params(format!("{e}"), None),
            ClientError::Store(e) => McpError::internal_error(format!("{e}"), None),
        }
    }
}

// =============================================================================
// ServerHandler impl
// =============================================================================

impl ServerHandler for BookManagerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "book-manager-mcp".to_string(),
                title: Some("Book Manager — catalog form & list".to_string()),
                description: Some(
                    "Add, edit and delete books in a REST book store. \
                     Numbered list via `books`, form via `set_field` → `submit`."
                        .to_string(),
                ),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Manage a book catalog.\n\
                 \n\
                 Add: `set_field` for title, author, isbn, publishYear, language → `submit`.\n\
                 Edit: `books` → `edit` with a list number → `set_field` → `submit`.\n\
                 Delete: `books` → `delete` with a list number.\n\
                 `reload` re-fetches the list from the store."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.tool_router.list_all(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let tool_ctx = ToolCallContext::new(self, request, context);
        self.tool_router.call(tool_ctx).await
    }
}

// =============================================================================
// Request types
// =============================================================================

fn parse_field(s: &str) -> Result<BookField, McpError> {
    s.parse::<BookField>()
        .map_err(|e| McpError::invalid_params(format!("{e}"), None))
}

/// 一覧番号 / 完全一致ID / ID前方一致 → BookId。
///
/// 優先順位:
/// 1. IDの完全一致 — 小さい整数IDが一覧番号に食われないよう最優先
/// 2. 一覧番号 (e.g. "1") — `books` 出力と対応
/// 3. IDの前方一致（一意な場合のみ）
fn resolve_book_ref(books: &[Book], s: &str) -> Result<BookId, McpError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(McpError::invalid_params("book must not be empty", None));
    }

    // 1. 完全一致
    if let Some(book) = books.iter().find(|b| b.id.as_str() == s) {
        return Ok(book.id.clone());
    }

    // 2. 一覧番号
    if let Ok(num) = s.parse::<usize>() {
        if (1..=books.len()).contains(&num) {
            return Ok(books[num - 1].id.clone());
        }
    }

    // 3. 前方一致
    let matches: Vec<&Book> = books
        .iter()
        .filter(|b| b.id.as_str().starts_with(s))
        .collect();
    match matches.len() {
        1 => Ok(matches[0].id.clone()),
        0 => Err(McpError::invalid_params(
            format!(
                "No book matching '{s}' (list has {} books). Run `books` to see numbers.",
                books.len()
            ),
            None,
        )),
        n => Err(McpError::invalid_params(
            format!(
                "Ambiguous ID prefix: '{s}' matches {n} books: {}",
                matches
                    .iter()
                    .map(|b| format!("'{}' ({})", b.title, b.id.short()))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            None,
        )),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBooksRequest {
    #[schemars(
        description = "Re-fetch the list from the store first (default: false). Like `reload`, this clears the form."
    )]
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpEmptyRequest {}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpSetFieldRequest {
    #[schemars(description = "Field name: title, author, isbn, publishYear, language")]
    pub field: String,
    #[schemars(description = "New value. publishYear must be an integer (or empty).")]
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct McpBookRefRequest {
    #[schemars(
        description = "Book number from `books` output (e.g. '2'). A full ID (checked first) or unique ID prefix is also accepted."
    )]
    pub book: String,
}

// =============================================================================
// Tool implementations
// =============================================================================

#[tool_router]
impl BookManagerServer {
    #[tool(
        name = "books",
        description = "Show the book list with numbers (e.g. 1, 2, 3). Use the numbers with `edit` and `delete`. Set refresh=true to re-fetch from the store first; that also clears the form, discarding any edit in progress.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            open_world_hint = true
        )
    )]
    async fn books(
        &self,
        Parameters(req): Parameters<McpBooksRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut client = self.client.lock().await;
        if req.refresh {
            client.load().await.map_err(Self::to_mcp_error)?;
        }
        Ok(CallToolResult::success(vec![Content::text(
            render_book_list(client.books()),
        )]))
    }

    #[tool(
        name = "reload",
        description = "Re-fetch the whole book list from the store. Also clears the form.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = true
        )
    )]
    async fn reload(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpEmptyRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut client = self.client.lock().await;
        let count = client.load().await.map_err(Self::to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Loaded {count} books.\n\n{}",
            render_book_list(client.books())
        ))]))
    }

    #[tool(
        name = "form",
        description = "Show the current form: mode (Add New Book / Update Book) and field values.",
        annotations(
            read_only_hint = true,
            destructive_hint = false,
            open_world_hint = false
        )
    )]
    async fn form(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpEmptyRequest>,
    ) -> Result<CallToolResult, McpError> {
        let client = self.client.lock().await;
        Ok(CallToolResult::success(vec![Content::text(render_form(
            client.form(),
            client.edit_mode(),
        ))]))
    }

    #[tool(
        name = "set_field",
        description = "Set one form field (title, author, isbn, publishYear, language). Other fields are kept.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn set_field(
        &self,
        Parameters(req): Parameters<McpSetFieldRequest>,
    ) -> Result<CallToolResult, McpError> {
        let field = parse_field(&req.field)?;
        let mut client = self.client.lock().await;
        client
            .update_field(field, req.value)
            .map_err(|e| Self::to_mcp_error(e.into()))?;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Set {}.\n\n{}",
            field.label(),
            render_form(client.form(), client.edit_mode())
        ))]))
    }

    #[tool(
        name = "edit",
        description = "Load a book into the form for editing. Specify it by number from `books` output (e.g. '2'). Then `set_field` and `submit` to save.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = true,
            open_world_hint = false
        )
    )]
    async fn edit(
        &self,
        Parameters(req): Parameters<McpBookRefRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut client = self.client.lock().await;
        let id = resolve_book_ref(client.books(), &req.book)?;
        client
            .begin_edit_by_id(&id)
            .map_err(|e| Self::to_mcp_error(e.into()))?;
        Ok(CallToolResult::success(vec![Content::text(render_form(
            client.form(),
            client.edit_mode(),
        ))]))
    }

    #[tool(
        name = "submit",
        description = "Submit the form: adds a new book, or saves changes when editing. All fields are required. The form is cleared afterwards, even on failure.",
        annotations(
            read_only_hint = false,
            destructive_hint = false,
            idempotent_hint = false,
            open_world_hint = true
        )
    )]
    async fn submit(
        &self,
        #[allow(unused_variables)] Parameters(_req): Parameters<McpEmptyRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut client = self.client.lock().await;

        // 全項目必須（未入力なら送信しない）
        let missing = client.form().missing_fields();
        if !missing.is_empty() {
            return Err(McpError::invalid_params(
                format!(
                    "Please fill in: {}",
                    missing
                        .iter()
                        .map(|f| f.name())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
                None,
            ));
        }

        let outcome = client.submit().await.map_err(Self::to_mcp_error)?;
        let (verb, book) = match &outcome {
            SubmitOutcome::Created(book) => ("Added", book),
            SubmitOutcome::Updated(book) => ("Saved", book),
        };
        Ok(CallToolResult::success(vec![Content::text(format!(
            "{verb}: {} (id: {})",
            book.title, book.id
        ))]))
    }

    #[tool(
        name = "delete",
        description = "Delete a book from the store. Specify it by number from `books` output (e.g. '2').",
        annotations(
            read_only_hint = false,
            destructive_hint = true,
            idempotent_hint = false,
            open_world_hint = true
        )
    )]
    async fn delete(
        &self,
        Parameters(req): Parameters<McpBookRefRequest>,
    ) -> Result<CallToolResult, McpError> {
        let mut client = self.client.lock().await;
        let id = resolve_book_ref(client.books(), &req.book)?;
        let title = client
            .find(&id)
            .map(|b| b.title.clone())
            .unwrap_or_default();

        client.remove(&id).await.map_err(Self::to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(format!(
            "Deleted: {title} (id: {id})"
        ))]))
    }
}

// =============================================================================
// Tests
// =============================================================================
