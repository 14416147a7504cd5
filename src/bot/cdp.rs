//! Thin Chrome DevTools Protocol client over `tokio-tungstenite`.
//!
//! Only implements the commands the meeting driver needs, not the protocol.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// One headless Chrome process plus the CDP connection to its page target.
pub struct CdpClient {
    child: Child,
    ws: WsStream,
    next_id: u64,
}

impl CdpClient {
    /// Launch a headless Chrome and connect to its first page target.
    pub async fn launch(chrome_path: &Path) -> Result<Self> {
        let port = free_port()?;
        let user_data_dir =
            std::env::temp_dir().join(format!("incident-bot-{}", uuid::Uuid::new_v4()));

        // Fake media devices let the bot enter the room without prompting
        // for microphone or camera permissions.
        let mut child = Command::new(chrome_path)
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--use-fake-ui-for-media-stream")
            .arg("--use-fake-device-for-media-stream")
            .arg("--mute-audio")
            .arg(format!("--remote-debugging-port={port}"))
            .arg(format!("--user-data-dir={}", user_data_dir.display()))
            .arg("about:blank")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("spawning chrome")?;

        let ws_url = wait_for_ws_url(port, &mut child).await?;
        let (ws, _) = connect_async(&ws_url)
            .await
            .context("connecting to chrome devtools websocket")?;

        let mut client = Self {
            child,
            ws,
            next_id: 0,
        };
        client.command("Page.enable", json!({})).await?;
        Ok(client)
    }

    /// Send one CDP command and wait for its response, skipping interleaved
    /// protocol events.
    pub async fn command(&mut self, method: &str, params: Value) -> Result<Value> {
        self.next_id += 1;
        let id = self.next_id;
        let msg = json!({ "id": id, "method": method, "params": params });
        self.ws
            .send(Message::Text(msg.to_string().into()))
            .await
            .with_context(|| format!("sending CDP {method}"))?;

        let deadline = tokio::time::Instant::now() + COMMAND_TIMEOUT;
        loop {
            let frame = tokio::time::timeout_at(deadline, self.ws.next())
                .await
                .map_err(|_| anyhow!("CDP {method} timed out"))?
                .ok_or_else(|| anyhow!("devtools websocket closed during {method}"))?
                .with_context(|| format!("reading CDP response for {method}"))?;
            let Message::Text(text) = frame else { continue };
            let Ok(value) = serde_json::from_str::<Value>(&text) else {
                continue;
            };
            if value.get("id").and_then(Value::as_u64) != Some(id) {
                continue; // event or stale response
            }
            if let Some(err) = value.get("error") {
                bail!(
                    "CDP {method} failed: {}",
                    err["message"].as_str().unwrap_or("unknown error")
                );
            }
            return Ok(value["result"].clone());
        }
    }

    pub async fn navigate(&mut self, url: &str) -> Result<()> {
        let result = self.command("Page.navigate", json!({ "url": url })).await?;
        if let Some(text) = result.get("errorText").and_then(Value::as_str) {
            bail!("navigation to {url} failed: {text}");
        }
        Ok(())
    }

    pub async fn reload(&mut self) -> Result<()> {
        self.command("Page.reload", json!({})).await.map(|_| ())
    }

    /// Evaluate a JS expression in the page and return its value.
    pub async fn evaluate(&mut self, expression: &str) -> Result<Value> {
        let result = self
            .command(
                "Runtime.evaluate",
                json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                }),
            )
            .await?;
        if let Some(exception) = result.get("exceptionDetails") {
            let reason = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("evaluation error");
            bail!("page evaluation failed: {reason}");
        }
        Ok(result["result"]["value"].clone())
    }

    /// Close the browser and reap the child process.
    pub async fn close(mut self) -> Result<()> {
        let _ = self.command("Browser.close", json!({})).await;
        let _ = self.ws.close(None).await;
        if tokio::time::timeout(Duration::from_secs(5), self.child.wait())
            .await
            .is_err()
        {
            debug!("chrome did not exit after Browser.close, killing");
            self.child.kill().await.context("killing chrome")?;
        }
        Ok(())
    }
}

fn free_port() -> Result<u16> {
    let listener =
        std::net::TcpListener::bind("127.0.0.1:0").context("binding ephemeral port")?;
    Ok(listener.local_addr().context("reading ephemeral port")?.port())
}

/// Poll the DevTools `/json` endpoint until the first page target appears.
async fn wait_for_ws_url(port: u16, child: &mut Child) -> Result<String> {
    let url = format!("http://127.0.0.1:{port}/json");

    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(100)).await;

        if let Some(status) = child.try_wait().context("checking chrome process")? {
            bail!("chrome exited early with {status}");
        }

        let Ok(resp) = reqwest::get(&url).await else {
            continue;
        };
        let Ok(pages) = resp.json::<Vec<Value>>().await else {
            continue;
        };
        if let Some(ws_url) = pages
            .iter()
            .find_map(|p| p["webSocketDebuggerUrl"].as_str())
        {
            return Ok(ws_url.to_string());
        }
    }

    bail!("chrome devtools endpoint did not come up on port {port}")
}
