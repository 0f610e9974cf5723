use crate::error::PipelineError;
use async_trait::async_trait;
use std::path::Path;

/// Read access to a Plex library. Implementations return raw XML bodies;
/// parsing happens in the extractor.
#[async_trait]
pub trait LibraryApi: Send + Sync {
    /// Root listing of library sections
    async fn fetch_sections(&self) -> Result<String, PipelineError>;

    /// Items of one section, with cross-reference identifiers inlined
    async fn fetch_section_items(&self, section_key: &str) -> Result<String, PipelineError>;
}

/// Opens browser sessions for the import engine
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, PipelineError>;
}

/// One browser page, driven by CSS selectors.
///
/// When a selector matches several elements the first one is used,
/// except for `all_text_contents`.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    async fn goto(&self, url: &str) -> anyhow::Result<()>;

    async fn fill(&self, selector: &str, value: &str) -> anyhow::Result<()>;

    async fn click(&self, selector: &str) -> anyhow::Result<()>;

    async fn text_content(&self, selector: &str) -> anyhow::Result<String>;

    /// Text of every matching element, in document order. No match is an empty list.
    async fn all_text_contents(&self, selector: &str) -> anyhow::Result<Vec<String>>;

    async fn exists(&self, selector: &str) -> anyhow::Result<bool>;

    async fn set_input_file(&self, selector: &str, path: &Path) -> anyhow::Result<()>;

    async fn current_url(&self) -> anyhow::Result<String>;

    /// Release the page and the browser. Called exactly once by the importer.
    async fn close(&mut self) -> anyhow::Result<()>;
}
