//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.
use std::sync::Arc;

use crate::tools::cache_purge::{CachePurgeParams, purge_impl};
use crate::tools::sheet_render::{SheetRenderParams, render_impl};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use sheetview_client::Pipeline;
use sheetview_core::CacheDb;

/// The main MCP server handler for sheetview.
#[derive(Clone)]
pub struct SheetviewServer {
    tool_router: ToolRouter<Self>,
    pipeline: Arc<Pipeline>,
    cache: CacheDb,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl SheetviewServer {
    /// Create a new server handler around a shared pipeline and its cache.
    pub fn new(pipeline: Arc<Pipeline>, cache: CacheDb) -> Self {
        Self { tool_router: Self::tool_router(), pipeline, cache }
    }

    /// Render a spreadsheet as an HTML table or chart descriptor.
    #[tool(
        description = "Render a published spreadsheet as an HTML table, or as a chart descriptor when `chart` is set. \
                       Attributes: key (document ID or URL, required), gid, query, header_rows, strip, class, title, \
                       summary, style, width, height, linkify, use_cache, expire_in, chart, chart_*."
    )]
    async fn sheet_render(&self, params: Parameters<SheetRenderParams>) -> Result<CallToolResult, McpError> {
        render_impl(&self.pipeline, params.0).await
    }

    /// Remove cached spreadsheet payloads.
    #[tool(
        description = "Purge the spreadsheet cache. With attributes, drops the entry for that document; \
                       without, deletes every expired entry. Returns the number of entries deleted."
    )]
    async fn cache_purge(&self, params: Parameters<CachePurgeParams>) -> Result<CallToolResult, McpError> {
        purge_impl(&self.cache, self.pipeline.default_expire(), params.0).await
    }
}

impl ServerHandler for SheetviewServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "sheetview".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
