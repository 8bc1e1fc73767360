//! # pagelens
//!
//! DOM extraction and locator synthesis for web test automation. Use directly
//! or via MCP.
//!
//! pagelens inspects a live, rendered page and produces a deterministic,
//! deduplicated catalog of interactive elements together with ranked locator
//! expressions and semantic metadata (role, accessible name, control kind,
//! suggested action). A small in-page script serializes the raw DOM; all
//! classification runs in Rust, so the engine is fully testable from snapshot
//! fixtures without a browser.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pagelens::{ExtractOptions, Session};
//!
//! # #[tokio::main]
//! # async fn main() -> eoka::Result<()> {
//! let session = Session::launch().await?;
//! session.goto("https://example.com").await?;
//!
//! let result = session.extract(ExtractOptions::default()).await?;
//! for row in &result.dom_data_v2 {
//!     println!("{} \"{}\" -> {} via {}", row.row_type, row.name, row.action, row.selector);
//! }
//!
//! session.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod classify;
pub mod control;
pub mod dom;
pub mod extract;
pub mod mcp;
pub mod model;
pub mod name;
pub mod overlay;
pub mod richtext;
pub mod role;
pub mod selector;
pub mod table;
pub mod widgets;

pub use extract::{
    diagnose_editors, extract_page, wait_for_table_load, ExtractOptions, Extractor,
    DEFAULT_TABLE_WAIT_MS,
};
pub use model::{ElementSnapshot, PageExtraction, SelectorCandidate, V2Row};
pub use richtext::EditorDiagnostics;

use eoka::Page;

// Re-export eoka types that users need
pub use eoka::{Browser, Error, Result, StealthConfig};

/// A browser session that owns its browser and page.
/// This is the primary API for most use cases.
pub struct Session {
    browser: Browser,
    page: Page,
}

impl Session {
    /// Launch a new browser and open a blank page.
    pub async fn launch() -> Result<Self> {
        let browser = Browser::launch().await?;
        let page = browser.new_page("about:blank").await?;
        Ok(Self { browser, page })
    }

    /// Launch with custom stealth config.
    pub async fn launch_with_config(stealth: StealthConfig) -> Result<Self> {
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;
        Ok(Self { browser, page })
    }

    /// Get reference to underlying page.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Get reference to browser.
    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// Navigate to a URL.
    pub async fn goto(&self, url: &str) -> Result<()> {
        self.page.goto(url).await
    }

    /// Get the current URL.
    pub async fn url(&self) -> Result<String> {
        self.page.url().await
    }

    /// Get the page title.
    pub async fn title(&self) -> Result<String> {
        self.page.title().await
    }

    /// Extract the current page state. See [`extract::extract_page`].
    pub async fn extract(&self, options: ExtractOptions) -> Result<PageExtraction> {
        extract::extract_page(&self.page, options).await
    }

    /// Wait for every table on the page to finish loading, up to `max_wait_ms`.
    pub async fn wait_for_tables(&self, max_wait_ms: u64) -> Result<bool> {
        extract::wait_for_table_load(&self.page, max_wait_ms).await
    }

    /// Report which embedded documents classify as rich-text editors.
    pub async fn diagnose_editors(&self) -> Result<EditorDiagnostics> {
        extract::diagnose_editors(&self.page).await
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await
    }
}
