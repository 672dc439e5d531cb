//! Browser session for manual login and passive viewing
//!
//! Drives Chrome through a `chromedriver` child process with the fantoccini
//! WebDriver client. The session only navigates and types into input fields;
//! it never clicks, submits or turns pages.

use std::fmt::Display;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use fantoccini::error::NewSessionError;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder, Locator};
use reading_companion_common::LexileRange;
use serde_json::json;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::{BrowserConfig, Config};
use crate::error::{AssistError, Result};

const DRIVER_STARTUP_TIMEOUT: Duration = Duration::from_secs(15);
const ELEMENT_TIMEOUT: Duration = Duration::from_secs(20);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// `alwaysMatch` capabilities for a new Chrome session.
pub fn chrome_capabilities(config: &BrowserConfig) -> Capabilities {
    let mut args = vec![
        "--disable-gpu".to_string(),
        "--no-first-run".to_string(),
        "--no-default-browser-check".to_string(),
    ];
    if cfg!(target_os = "linux") {
        args.push("--no-sandbox".into());
        args.push("--disable-dev-shm-usage".into());
    }
    if config.headless {
        args.push("--headless=new".into());
    }

    let mut chrome_options = json!({ "args": args });
    if let Some(binary) = &config.chrome_binary {
        chrome_options["binary"] = json!(binary.to_string_lossy());
    }

    let mut caps = Capabilities::new();
    caps.insert("browserName".into(), json!("chrome"));
    caps.insert("goog:chromeOptions".into(), chrome_options);
    caps
}

/// The user is still on the page the session opened with.
pub fn still_on_login_page(current_url: &str, base_url: &str) -> bool {
    current_url.trim_end_matches('/') == base_url.trim_end_matches('/')
}

fn browser_error(err: impl Display) -> AssistError {
    AssistError::Browser(err.to_string())
}

pub struct BrowserSession {
    client: Client,
    driver: Option<Child>,
    browser: BrowserConfig,
    base_url: String,
    credentials: Option<(String, String)>,
    logged_in: bool,
}

impl BrowserSession {
    /// Start chromedriver, open a Chrome session and load the reader's login page.
    pub async fn launch(config: &Config) -> Result<Self> {
        let browser = config.browser.clone();
        let driver_path = browser
            .chromedriver_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("chromedriver"));

        info!(driver = %driver_path.display(), port = browser.port, "starting chromedriver");
        let mut driver = Command::new(&driver_path)
            .arg(format!("--port={}", browser.port))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                AssistError::Browser(format!("failed to start {}: {}", driver_path.display(), e))
            })?;

        let driver_url = format!("http://127.0.0.1:{}", browser.port);
        let client = match connect(&browser, &driver_url).await {
            Ok(client) => client,
            Err(err) => {
                let _ = driver.kill().await;
                return Err(err);
            }
        };
        debug!(%driver_url, "WebDriver session created");

        let credentials = match (&config.reader.username, &config.reader.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };

        let mut session = Self {
            client,
            driver: Some(driver),
            browser,
            base_url: config.reader.base_url.clone(),
            credentials,
            logged_in: false,
        };
        let url = session.base_url.clone();
        session.navigate(&url).await?;
        Ok(session)
    }

    pub async fn navigate(&mut self, url: &str) -> Result<()> {
        info!(%url, "navigating");
        self.client.goto(url).await.map_err(browser_error)
    }

    pub async fn current_url(&self) -> Result<String> {
        let url = self.client.current_url().await.map_err(browser_error)?;
        Ok(url.to_string())
    }

    /// Replace the value of the first input matched by `selector` (a CSS selector list).
    pub async fn fill_field(&self, selector: &str, value: &str) -> Result<()> {
        let field = self
            .client
            .wait()
            .at_most(ELEMENT_TIMEOUT)
            .every(POLL_INTERVAL)
            .for_element(Locator::Css(selector))
            .await
            .map_err(|e| AssistError::Browser(format!("no input matches {}: {}", selector, e)))?;
        field.clear().await.map_err(browser_error)?;
        field.send_keys(value).await.map_err(browser_error)?;
        Ok(())
    }

    /// Pre-fill username and password. The user still presses the login button.
    pub async fn fill_login_form(&self) -> Result<()> {
        let (username, password) = self.credentials.as_ref().ok_or_else(|| {
            AssistError::Config("READER_USERNAME and READER_PASSWORD are not set".into())
        })?;
        self.fill_field(&self.browser.username_selector, username)
            .await?;
        self.fill_field(&self.browser.password_selector, password)
            .await?;
        info!(user = %username, "login form filled; review it and log in manually");
        Ok(())
    }

    /// Put the Lexile bounds into the book filter fields.
    pub async fn fill_lexile_filter(&self, range: LexileRange) -> Result<()> {
        range.validate()?;
        self.fill_field(&self.browser.lexile_min_selector, &range.min.to_string())
            .await?;
        self.fill_field(&self.browser.lexile_max_selector, &range.max.to_string())
            .await?;
        info!(min = range.min, max = range.max, "Lexile filter filled");
        Ok(())
    }

    /// Record that the user finished logging in. Returns the page they landed on.
    pub async fn confirm_logged_in(&mut self) -> Result<String> {
        let url = self.current_url().await?;
        if still_on_login_page(&url, &self.base_url) {
            warn!(%url, "still on the login page");
        }
        self.logged_in = true;
        info!(%url, "login confirmed");
        Ok(url)
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Close the browser and stop chromedriver.
    pub async fn quit(self) -> Result<()> {
        let Self { client, driver, .. } = self;
        let closed = client.close().await;
        if let Some(mut driver) = driver {
            if let Err(e) = driver.kill().await {
                warn!("failed to stop chromedriver: {}", e);
            }
        }
        closed.map_err(browser_error)?;
        info!("browser closed");
        Ok(())
    }
}

/// Open a session, retrying while chromedriver is still starting up.
async fn connect(browser: &BrowserConfig, driver_url: &str) -> Result<Client> {
    let mut builder = ClientBuilder::native();
    builder.capabilities(chrome_capabilities(browser));

    let deadline = tokio::time::Instant::now() + DRIVER_STARTUP_TIMEOUT;
    loop {
        match builder.connect(driver_url).await {
            Ok(client) => return Ok(client),
            Err(NewSessionError::Failed(_)) if tokio::time::Instant::now() < deadline => {
                debug!(%driver_url, "chromedriver not ready yet");
                tokio::time::sleep(POLL_INTERVAL).await;
            }
            Err(e) => {
                return Err(AssistError::Browser(format!(
                    "could not open a Chrome session at {}: {}",
                    driver_url, e
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(caps: &Capabilities) -> Vec<String> {
        caps["goog:chromeOptions"]["args"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_capabilities_default() {
        let caps = chrome_capabilities(&BrowserConfig::default());
        let args = args(&caps);
        assert!(args.contains(&"--disable-gpu".to_string()));
        assert!(args.contains(&"--no-first-run".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--headless")));
        assert_eq!(caps["browserName"], "chrome");
        assert!(caps["goog:chromeOptions"].get("binary").is_none());
        if cfg!(target_os = "linux") {
            assert!(args.contains(&"--no-sandbox".to_string()));
        }
    }

    #[test]
    fn test_capabilities_headless_with_binary() {
        let config = BrowserConfig {
            headless: true,
            chrome_binary: Some(PathBuf::from("/usr/bin/chromium")),
            ..BrowserConfig::default()
        };
        let caps = chrome_capabilities(&config);
        assert!(args(&caps).contains(&"--headless=new".to_string()));
        assert_eq!(caps["goog:chromeOptions"]["binary"], "/usr/bin/chromium");
    }

    #[test]
    fn test_still_on_login_page() {
        let base = "https://reader.example.com";
        assert!(still_on_login_page("https://reader.example.com/", base));
        assert!(!still_on_login_page("https://reader.example.com/library", base));
    }

    #[test]
    fn test_browser_error_message() {
        let err = browser_error("session not created");
        assert_eq!(err.to_string(), "Browser error: session not created");
    }
}
