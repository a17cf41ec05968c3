//! Test server management.
//!
//! [`TestServer`] runs a hub, router and gateway inside the test process on
//! an ephemeral port. [`DaemonProcess`] spawns the real `huddled` binary.

use huddle::config::SessionSettings;
use huddle::network::Gateway;
use huddle::state::Hub;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::{Child, Command};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// An in-process test server instance.
#[allow(dead_code)]
pub struct TestServer {
    addr: SocketAddr,
    hub: Arc<Hub>,
    gateway: JoinHandle<anyhow::Result<()>>,
}

#[allow(dead_code)]
impl TestServer {
    /// Spawn a server with default session settings.
    pub async fn spawn() -> anyhow::Result<Self> {
        Self::spawn_with(SessionSettings::default()).await
    }

    /// Spawn a server with custom session settings.
    pub async fn spawn_with(settings: SessionSettings) -> anyhow::Result<Self> {
        let (hub, router) = Hub::new(settings);
        router.spawn();

        let gateway = Gateway::bind("127.0.0.1:0".parse()?, Arc::clone(&hub)).await?;
        let addr = gateway.local_addr()?;
        let gateway = tokio::spawn(gateway.run());

        Ok(Self { addr, hub, gateway })
    }

    /// Get the server address.
    pub fn address(&self) -> String {
        self.addr.to_string()
    }

    /// Shared state, for asserting on the registry directly.
    #[allow(dead_code)]
    pub fn hub(&self) -> &Arc<Hub> {
        &self.hub
    }

    /// Poll until the registry holds `count` sessions.
    #[allow(dead_code)]
    pub async fn wait_for_sessions(&self, count: usize) -> anyhow::Result<()> {
        for _ in 0..100 {
            if self.hub.registry.len() == count {
                return Ok(());
            }
            sleep(Duration::from_millis(20)).await;
        }
        anyhow::bail!(
            "expected {count} sessions, registry holds {}",
            self.hub.registry.len()
        )
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.gateway.abort();
    }
}

/// A `huddled` child process with its own config file.
#[allow(dead_code)]
pub struct DaemonProcess {
    child: Child,
    port: u16,
    _dir: TempDir,
}

#[allow(dead_code)]
impl DaemonProcess {
    /// Write a config for `port` and start the daemon.
    pub async fn spawn(port: u16, extra_config: &str) -> anyhow::Result<Self> {
        let dir = tempfile::tempdir()?;
        let config_path: PathBuf = dir.path().join("config.toml");
        let config_content = format!(
            r#"
[server]
metrics_port = 0

[listen]
address = "127.0.0.1:{port}"

{extra_config}
"#
        );
        std::fs::write(&config_path, config_content)?;

        let child = Command::new(env!("CARGO_BIN_EXE_huddled"))
            .arg(&config_path)
            .env("RUST_LOG", "warn")
            .spawn()?;

        let daemon = Self {
            child,
            port,
            _dir: dir,
        };
        daemon.wait_until_ready().await?;
        Ok(daemon)
    }

    /// Get the daemon address.
    pub fn address(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }

    async fn wait_until_ready(&self) -> anyhow::Result<()> {
        for _ in 0..100 {
            if tokio::net::TcpStream::connect(self.address()).await.is_ok() {
                return Ok(());
            }
            sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("daemon did not start listening on {}", self.address())
    }

    /// Whether the process has already exited.
    #[allow(dead_code)]
    pub fn has_exited(&mut self) -> anyhow::Result<bool> {
        Ok(self.child.try_wait()?.is_some())
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Pick a free local port by binding to port 0 and releasing it.
#[allow(dead_code)]
pub fn free_port() -> anyhow::Result<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
