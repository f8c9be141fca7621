use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use landscout_core::{FetchConfig, LandError, Result};
use rand::Rng;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

const MARKER_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchMode {
    /// A single GET, no JavaScript.
    Http,
    /// Render in the browser session and wait for `marker` (a CSS selector) to appear.
    Browser { marker: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub url: Url,
    pub mode: FetchMode,
    pub headers: Vec<(String, String)>,
}

impl PageRequest {
    pub fn http(url: Url) -> Self {
        Self {
            url,
            mode: FetchMode::Http,
            headers: Vec::new(),
        }
    }

    pub fn browser(url: Url, marker: &str) -> Self {
        Self {
            url,
            mode: FetchMode::Browser {
                marker: marker.to_string(),
            },
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

/// Anything that can turn a [`PageRequest`] into page source.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, request: &PageRequest) -> Result<String>;
}

/// The browser process shared by every rendered fetch in a run.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
    render_timeout: Duration,
}

impl BrowserSession {
    pub async fn launch(config: &FetchConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .request_timeout(config.render_timeout())
            .arg(format!("--user-agent={}", config.user_agent));
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &config.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let browser_config = builder.build().map_err(LandError::Browser)?;

        info!("Launching browser session");
        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| LandError::Browser(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| LandError::Browser(e.to_string()))?;

        Ok(Self {
            browser,
            page,
            handler_task,
            render_timeout: config.render_timeout(),
        })
    }

    /// Navigates and waits for `marker`. A missing marker is not an error:
    /// whatever rendered before the timeout is returned.
    pub async fn render(&self, url: &Url, marker: &str) -> Result<String> {
        debug!("Rendering {} (waiting for {})", url, marker);
        self.page
            .goto(url.as_str())
            .await
            .map_err(|e| LandError::Browser(e.to_string()))?;

        wait_and_read(&self.page, url, marker, self.render_timeout).await
    }

    pub async fn close(mut self) {
        info!("Closing browser session");
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
    }
}

/// The parts of a loaded browser tab a render needs.
#[async_trait]
trait RenderedPage: Sync {
    async fn has_element(&self, selector: &str) -> bool;
    async fn html(&self) -> Result<String>;
}

#[async_trait]
impl RenderedPage for Page {
    async fn has_element(&self, selector: &str) -> bool {
        self.find_element(selector).await.is_ok()
    }

    async fn html(&self) -> Result<String> {
        self.content()
            .await
            .map_err(|e| LandError::Browser(e.to_string()))
    }
}

/// Polls for `marker` until it shows up or `timeout` passes, then reads the page.
async fn wait_and_read(
    page: &dyn RenderedPage,
    url: &Url,
    marker: &str,
    timeout: Duration,
) -> Result<String> {
    let wait = async {
        while !page.has_element(marker).await {
            tokio::time::sleep(MARKER_POLL_INTERVAL).await;
        }
    };
    if tokio::time::timeout(timeout, wait).await.is_err() {
        warn!(
            "{} did not appear within {:?} on {}, using partial content",
            marker, timeout, url
        );
    }

    page.html().await
}

/// HTTP client plus, when a source needs rendering, the browser session.
pub struct WebFetcher {
    client: Client,
    browser: Option<Mutex<BrowserSession>>,
}

impl WebFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            browser: None,
        })
    }

    pub async fn start_browser(&mut self, config: &FetchConfig) -> Result<()> {
        if self.browser.is_none() {
            self.browser = Some(Mutex::new(BrowserSession::launch(config).await?));
        }
        Ok(())
    }

    /// Releases the browser session, if one was started.
    pub async fn shutdown(&mut self) {
        if let Some(session) = self.browser.take() {
            session.into_inner().close().await;
        }
    }

    async fn fetch_page(&self, request: &PageRequest) -> Result<String> {
        let mut builder = self.client.get(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageFetcher for WebFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<String> {
        match &request.mode {
            FetchMode::Http => {
                debug!("GET {}", request.url);
                self.fetch_page(request).await
            }
            FetchMode::Browser { marker } => match &self.browser {
                Some(session) => session.lock().await.render(&request.url, marker).await,
                None => Err(LandError::Browser(format!(
                    "{} needs a browser session but none was started",
                    request.url
                ))),
            },
        }
    }
}

/// Random pause inserted after each listing fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    max_delay: Duration,
}

impl ThrottlePolicy {
    pub fn new(max_delay: Duration) -> Self {
        Self { max_delay }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_disabled(&self) -> bool {
        self.max_delay.is_zero()
    }

    /// A delay drawn uniformly from `0..=max_delay`, in whole milliseconds.
    pub fn next_delay(&self) -> Duration {
        if self.is_disabled() {
            return Duration::ZERO;
        }
        let max_ms = self.max_delay.as_millis() as u64;
        Duration::from_millis(rand::thread_rng().gen_range(0..=max_ms))
    }

    pub async fn pause(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            debug!("Throttling for {:?}", delay);
            tokio::time::sleep(delay).await;
        }
    }
}
