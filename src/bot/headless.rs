//! Headless-browser meeting participant.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, warn};

use super::cdp::CdpClient;
use super::chrome;
use super::driver::{MeetingDriver, MeetingDriverFactory};

/// Clicks any visible mute toggles by aria-label, as a fallback for rooms
/// that ignore the mute query parameters.
const MUTE_TOGGLE_JS: &str = r"
(() => {
  const buttons = document.querySelectorAll('[aria-label]');
  buttons.forEach((b) => {
    const label = b.getAttribute('aria-label') || '';
    if (/microphone/i.test(label) && /mute/i.test(label)) b.click();
    if (/camera/i.test(label) && /mute/i.test(label)) b.click();
  });
  return true;
})()
";

/// Joins a meeting room with a headless Chrome and keeps the tab alive.
pub struct HeadlessMeetingDriver {
    chrome_path: PathBuf,
    client: Option<CdpClient>,
}

impl HeadlessMeetingDriver {
    pub fn new(chrome_path: PathBuf) -> Self {
        Self {
            chrome_path,
            client: None,
        }
    }

    fn client(&mut self) -> Result<&mut CdpClient> {
        self.client.as_mut().context("meeting not joined")
    }
}

#[async_trait]
impl MeetingDriver for HeadlessMeetingDriver {
    async fn join(&mut self, join_url: &str) -> Result<()> {
        debug!(url = join_url, "launching headless browser");
        let mut client = CdpClient::launch(&self.chrome_path).await?;
        client.navigate(join_url).await?;
        self.client = Some(client);
        Ok(())
    }

    async fn set_display_name(&mut self, name: &str) -> Result<()> {
        let client = self.client()?;
        // The meeting service reads the stored name on page load, so a
        // reload is required for it to take effect.
        let expr = format!(
            "localStorage.setItem('displayname', {})",
            serde_json::to_string(name)?
        );
        client.evaluate(&expr).await?;
        client.reload().await
    }

    async fn set_mute(&mut self, audio: bool, video: bool) -> Result<()> {
        if !audio && !video {
            return Ok(());
        }
        let client = self.client()?;
        client.evaluate(MUTE_TOGGLE_JS).await.map(|_| ())
    }

    async fn keepalive(&mut self) -> Result<()> {
        self.client()?.evaluate("document.readyState").await.map(|_| ())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            client.close().await?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "headless-chrome"
    }
}

/// Factory handing one fresh headless driver per bot session.
pub struct HeadlessChromeFactory {
    chrome_path: Option<PathBuf>,
}

impl HeadlessChromeFactory {
    /// Probe for a Chrome binary. A missing binary is not fatal here; each
    /// launch attempt reports it and the session is marked failed.
    pub fn discover() -> Self {
        let chrome_path = chrome::find_chrome();
        if chrome_path.is_none() {
            warn!("no Chrome binary found, bot sessions will fail to launch");
        }
        Self { chrome_path }
    }
}

impl MeetingDriverFactory for HeadlessChromeFactory {
    fn create(&self) -> Result<Box<dyn MeetingDriver>> {
        let path = self
            .chrome_path
            .clone()
            .context("no Chrome binary available")?;
        Ok(Box::new(HeadlessMeetingDriver::new(path)))
    }
}
