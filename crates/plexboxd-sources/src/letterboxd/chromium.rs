use crate::error::PipelineError;
use crate::traits::{BrowserLauncher, BrowserSession};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use chromiumoxide::element::Element;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use which::which;

const HANDLER_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);
const MAX_HANDLER_ERRORS: usize = 10;

/// Launches a local Chromium over CDP.
///
/// Executable resolution order: configured path, system install, download
/// into `download_dir`.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    headless: bool,
    executable: Option<PathBuf>,
    download_dir: PathBuf,
}

impl ChromiumLauncher {
    pub fn new(headless: bool, executable: Option<PathBuf>, download_dir: PathBuf) -> Self {
        Self {
            headless,
            executable,
            download_dir,
        }
    }

    /// Resolve an executable, downloading Chromium when nothing is installed.
    /// This is all the init mode does.
    pub async fn provision(&self) -> Result<PathBuf, PipelineError> {
        if let Some(path) = &self.executable {
            if path.exists() {
                info!(path = %path.display(), "Using configured Chromium");
                return Ok(path.clone());
            }
            return Err(PipelineError::Browser(format!(
                "configured Chromium executable {} does not exist",
                path.display()
            )));
        }

        if let Some(path) = find_system_chromium() {
            info!(path = %path.display(), "Found system Chromium");
            return Ok(path);
        }

        info!(dir = %self.download_dir.display(), "No system Chromium found, downloading via BrowserFetcher");
        fetch_chromium(&self.download_dir)
            .await
            .map_err(|e| PipelineError::Browser(format!("{:#}", e)))
    }

    fn build_config(&self, executable: PathBuf) -> anyhow::Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder().chrome_executable(executable);
        if !self.headless {
            builder = builder.with_head();
        }

        if !cfg!(target_os = "macos") {
            builder = builder.arg("--no-sandbox").arg("--disable-dev-shm-usage");
        }

        builder
            .arg("--disable-extensions")
            .arg("--disable-notifications")
            .arg("--disable-features=WebAuthentication")
            .arg("--disable-sync")
            .arg("--disable-default-apps")
            .arg("--log-level=3")
            .window_size(1280, 900)
            .build()
            .map_err(|e| anyhow!("Failed to build browser config: {}", e))
    }

    async fn launch_session(&self, executable: PathBuf) -> anyhow::Result<ChromiumSession> {
        let config = self.build_config(executable)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| anyhow!("Failed to launch browser: {}", e))?;

        let handler_task = tokio::spawn(async move {
            let mut error_count = 0;
            while let Some(event) = handler.next().await {
                match event {
                    Ok(_) => error_count = 0,
                    Err(e) => {
                        error_count += 1;
                        warn!("Browser handler error (count: {}/{}): {:?}", error_count, MAX_HANDLER_ERRORS, e);
                        if error_count >= MAX_HANDLER_ERRORS {
                            error!("Browser handler received {} consecutive errors, browser may have crashed", error_count);
                            break;
                        }
                    }
                }
            }
            debug!("Browser handler task ended");
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let mut session = ChromiumSession::without_page(browser, handler_task);
                session.shutdown().await.ok();
                return Err(anyhow!("Failed to open page: {}", e));
            }
        };

        info!(headless = self.headless, "Browser session started");
        Ok(ChromiumSession {
            browser: Some(browser),
            page: Some(page),
            handler_task: Some(handler_task),
        })
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, PipelineError> {
        let executable = self.provision().await?;
        let session = self
            .launch_session(executable)
            .await
            .map_err(|e| PipelineError::Browser(format!("{:#}", e)))?;
        Ok(Box::new(session))
    }
}

pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
}

impl ChromiumSession {
    fn without_page(browser: Browser, handler_task: JoinHandle<()>) -> Self {
        Self {
            browser: Some(browser),
            page: None,
            handler_task: Some(handler_task),
        }
    }

    fn page(&self) -> anyhow::Result<&Page> {
        self.page.as_ref().ok_or_else(|| anyhow!("browser session is closed"))
    }

    async fn element(&self, selector: &str) -> anyhow::Result<Element> {
        self.page()?
            .find_element(selector)
            .await
            .with_context(|| format!("no element matched {}", selector))
    }

    async fn shutdown(&mut self) -> anyhow::Result<()> {
        let mut result = Ok(());

        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Failed to close page: {}", e);
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                result = Err(anyhow!("Failed to close browser: {}", e));
            }
            if let Err(e) = browser.wait().await {
                debug!("Failed to wait for browser process: {}", e);
            }
        }

        if let Some(handler_task) = self.handler_task.take() {
            if tokio::time::timeout(HANDLER_SHUTDOWN_TIMEOUT, handler_task).await.is_err() {
                debug!("Browser handler did not stop in time");
            }
        }

        result
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn goto(&self, url: &str) -> anyhow::Result<()> {
        let page = self.page()?;
        page.goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {}", url))?;
        page.wait_for_navigation()
            .await
            .with_context(|| format!("Navigation to {} did not complete", url))?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> anyhow::Result<()> {
        let element = self.element(selector).await?;
        element.click().await.with_context(|| format!("Failed to focus {}", selector))?;
        element
            .type_str(value)
            .await
            .with_context(|| format!("Failed to type into {}", selector))?;
        Ok(())
    }

    async fn click(&self, selector: &str) -> anyhow::Result<()> {
        self.element(selector)
            .await?
            .click()
            .await
            .with_context(|| format!("Failed to click {}", selector))?;
        Ok(())
    }

    async fn text_content(&self, selector: &str) -> anyhow::Result<String> {
        let text = self
            .element(selector)
            .await?
            .inner_text()
            .await
            .with_context(|| format!("Failed to read text of {}", selector))?;
        Ok(text.unwrap_or_default())
    }

    async fn all_text_contents(&self, selector: &str) -> anyhow::Result<Vec<String>> {
        let elements = self
            .page()?
            .find_elements(selector)
            .await
            .with_context(|| format!("Failed to query {}", selector))?;

        let mut texts = Vec::with_capacity(elements.len());
        for element in elements {
            let text = element
                .inner_text()
                .await
                .with_context(|| format!("Failed to read text of {}", selector))?;
            texts.push(text.unwrap_or_default());
        }
        Ok(texts)
    }

    async fn exists(&self, selector: &str) -> anyhow::Result<bool> {
        Ok(self.page()?.find_element(selector).await.is_ok())
    }

    async fn set_input_file(&self, selector: &str, path: &Path) -> anyhow::Result<()> {
        let absolute = path
            .canonicalize()
            .with_context(|| format!("Cannot resolve upload file {}", path.display()))?;
        let element = self.element(selector).await?;

        let mut params = SetFileInputFilesParams::new(vec![absolute.to_string_lossy().into_owned()]);
        params.backend_node_id = Some(element.backend_node_id);
        self.page()?
            .execute(params)
            .await
            .with_context(|| format!("Failed to attach {} to {}", absolute.display(), selector))?;
        Ok(())
    }

    async fn current_url(&self) -> anyhow::Result<String> {
        Ok(self.page()?.url().await?.unwrap_or_default())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.shutdown().await?;
        info!("Browser session closed");
        Ok(())
    }
}

/// Well-known install locations, then PATH
pub fn find_system_chromium() -> Option<PathBuf> {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/opt/homebrew/bin/chromium",
            "/usr/local/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/snap/bin/chromium",
        ]
    };

    for candidate in candidates {
        let path = Path::new(candidate);
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    ["chromium", "chromium-browser", "google-chrome", "google-chrome-stable"]
        .iter()
        .find_map(|name| which(name).ok())
}

async fn fetch_chromium(download_dir: &Path) -> anyhow::Result<PathBuf> {
    tokio::fs::create_dir_all(download_dir)
        .await
        .with_context(|| format!("Failed to create {}", download_dir.display()))?;

    let fetcher = BrowserFetcher::new(
        BrowserFetcherOptions::builder()
            .with_path(download_dir)
            .build()
            .map_err(|e| anyhow!("Failed to create BrowserFetcherOptions: {}", e))?,
    );

    let installation = fetcher
        .fetch()
        .await
        .map_err(|e| anyhow!("Failed to fetch Chromium: {}", e))?;

    let executable = installation.executable_path;
    #[cfg(target_os = "macos")]
    {
        // Gatekeeper blocks the unsigned download
        let _ = std::process::Command::new("xattr")
            .arg("-d")
            .arg("com.apple.quarantine")
            .arg(&executable)
            .output();
    }

    info!(path = %executable.display(), "Chromium downloaded");
    Ok(executable)
}
