use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router, ServerHandler,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::extract::{ExtractOptions, DEFAULT_TABLE_WAIT_MS};
use crate::Session;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct NavigateRequest {
    #[schemars(description = "URL to navigate to")]
    pub url: String,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct ExtractRequest {
    #[schemars(description = "Restrict the scan to interactive elements (default true)")]
    pub only_interactives: Option<bool>,
    #[schemars(description = "Keep non-visible elements in the scan (default false)")]
    pub include_hidden: Option<bool>,
    #[schemars(description = "Poll for table readiness before extracting (default true)")]
    pub wait_for_tables: Option<bool>,
}

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct WaitTablesRequest {
    #[schemars(description = "Maximum wait in milliseconds (default 5000)")]
    pub max_wait_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

fn err(e: impl std::fmt::Display) -> ErrorData {
    ErrorData::internal_error(e.to_string(), None::<Value>)
}

fn text_ok(s: impl Into<String>) -> Result<CallToolResult, ErrorData> {
    Ok(CallToolResult::success(vec![Content::text(s.into())]))
}

fn json_ok<T: serde::Serialize>(value: &T) -> Result<CallToolResult, ErrorData> {
    let text = serde_json::to_string_pretty(value).map_err(err)?;
    text_ok(text)
}

#[derive(Clone)]
pub struct PagelensServer {
    session: Arc<Mutex<Option<Session>>>,
    tool_router: ToolRouter<Self>,
}

impl PagelensServer {
    async fn ensure_session(&self) -> Result<(), ErrorData> {
        let mut guard = self.session.lock().await;
        if guard.is_none() {
            let session = Session::launch().await.map_err(err)?;
            *guard = Some(session);
        }
        Ok(())
    }
}

#[tool_router]
impl PagelensServer {
    pub fn new() -> Self {
        Self {
            session: Arc::new(Mutex::new(None)),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Navigate to a URL. Launches browser on first call.")]
    async fn navigate(
        &self,
        req: Parameters<NavigateRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        self.ensure_session().await?;
        let guard = self.session.lock().await;
        let session = guard.as_ref().unwrap();
        session.goto(&req.0.url).await.map_err(err)?;
        let url = session.url().await.map_err(err)?;
        let title = session.title().await.map_err(err)?;
        text_ok(format!("Navigated to: {}\nTitle: {}", url, title))
    }

    #[tool(
        description = "Extract the page: every interactive element with ranked locator candidates, \
                       table/filter rows, open overlays and rich-text editors. Returns the full \
                       extraction result as JSON; domDataV2 holds the deduplicated action rows."
    )]
    async fn extract_page(
        &self,
        req: Parameters<ExtractRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or_else(|| {
            ErrorData::internal_error("No page open. Use navigate first.", None::<Value>)
        })?;
        let defaults = ExtractOptions::default();
        let options = ExtractOptions {
            only_interactives: req.0.only_interactives.unwrap_or(defaults.only_interactives),
            include_hidden: req.0.include_hidden.unwrap_or(defaults.include_hidden),
            wait_for_tables: req.0.wait_for_tables.unwrap_or(defaults.wait_for_tables),
        };
        let result = session.extract(options).await.map_err(err)?;
        json_ok(&result)
    }

    #[tool(
        description = "Wait until every table on the page has body rows or a filter row. \
                       Returns true on readiness, false on timeout (extraction still works)."
    )]
    async fn wait_for_tables(
        &self,
        req: Parameters<WaitTablesRequest>,
    ) -> Result<CallToolResult, ErrorData> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or_else(|| {
            ErrorData::internal_error("No page open. Use navigate first.", None::<Value>)
        })?;
        let max_wait = req.0.max_wait_ms.unwrap_or(DEFAULT_TABLE_WAIT_MS);
        let ready = session.wait_for_tables(max_wait).await.map_err(err)?;
        text_ok(if ready {
            "Tables loaded.".to_string()
        } else {
            format!("Timed out after {}ms; proceeding best-effort.", max_wait)
        })
    }

    #[tool(
        description = "Enumerate embedded-document candidates and report which are classified \
                       as rich-text editors, for troubleshooting editor detection."
    )]
    async fn diagnose_editors(&self) -> Result<CallToolResult, ErrorData> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or_else(|| {
            ErrorData::internal_error("No page open. Use navigate first.", None::<Value>)
        })?;
        let diagnostics = session.diagnose_editors().await.map_err(err)?;
        json_ok(&diagnostics)
    }

    #[tool(description = "Get the current page URL and title.")]
    async fn page_info(&self) -> Result<CallToolResult, ErrorData> {
        let guard = self.session.lock().await;
        let session = guard.as_ref().ok_or_else(|| {
            ErrorData::internal_error("No page open. Use navigate first.", None::<Value>)
        })?;
        let url = session.url().await.map_err(err)?;
        let title = session.title().await.map_err(err)?;
        text_ok(format!("URL: {}\nTitle: {}", url, title))
    }

    #[tool(description = "Close the browser and release resources.")]
    async fn close(&self) -> Result<CallToolResult, ErrorData> {
        let mut guard = self.session.lock().await;
        if let Some(session) = guard.take() {
            session.close().await.map_err(err)?;
        }
        text_ok("Browser closed.")
    }
}

#[tool_handler]
impl ServerHandler for PagelensServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "pagelens".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "DOM extraction server for test generation. Use 'navigate' to open a URL \
                 (launches browser automatically), then 'extract_page' to get the element \
                 catalog: domDataV2 rows carry a type, name, action and a locator expression \
                 ready for scripting. 'wait_for_tables' probes async table readiness, \
                 'diagnose_editors' explains rich-text editor classification."
                    .into(),
            ),
        }
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    use rmcp::ServiceExt;

    let server = PagelensServer::new();
    let service = server.serve(rmcp::transport::stdio()).await?;
    service.waiting().await?;
    Ok(())
}
