//! Test chat client.
//!
//! Speaks the line protocol over real TCP and asserts on what comes back.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// A test chat client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    identity: String,
}

impl TestClient {
    /// Connect to a test server.
    ///
    /// The server keys sessions by remote address, which is our local one.
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        let identity = stream.local_addr()?.to_string();
        let (read_half, write_half) = stream.into_split();

        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            identity,
        })
    }

    /// Connect and consume our own login notice.
    ///
    /// Lines routed before it (notices about other clients that were still
    /// in flight when we registered) are skipped.
    pub async fn join(address: &str) -> anyhow::Result<Self> {
        let mut client = Self::connect(address).await?;
        let expected = client.notice(&client.identity, "logged in");
        while client.recv_line().await? != expected {}
        Ok(client)
    }

    /// The identity the server assigned to this client.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Build the notice line the server would publish for `identity`.
    pub fn notice(&self, display_name: &str, event: &str) -> String {
        format!("{}:{display_name} {event}", self.identity)
    }

    /// Send one line, newline appended.
    pub async fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Send raw bytes, no framing.
    #[allow(dead_code)]
    pub async fn send_raw(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive a single line from the server.
    pub async fn recv_line(&mut self) -> anyhow::Result<String> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    /// Receive a line with a timeout. Fails on EOF.
    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("connection closed by server");
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// Receive the next line and check it.
    pub async fn expect_line(&mut self, expected: &str) -> anyhow::Result<()> {
        let line = self.recv_line().await?;
        anyhow::ensure!(line == expected, "expected {expected:?}, got {line:?}");
        Ok(())
    }

    /// Receive `count` lines.
    #[allow(dead_code)]
    pub async fn recv_lines(&mut self, count: usize) -> anyhow::Result<Vec<String>> {
        let mut lines = Vec::with_capacity(count);
        for _ in 0..count {
            lines.push(self.recv_line().await?);
        }
        Ok(lines)
    }

    /// Assert nothing arrives within `dur`.
    #[allow(dead_code)]
    pub async fn expect_silence(&mut self, dur: Duration) -> anyhow::Result<()> {
        let mut line = String::new();
        match timeout(dur, self.reader.read_line(&mut line)).await {
            Err(_) => Ok(()),
            Ok(Ok(0)) => anyhow::bail!("connection closed while expecting silence"),
            Ok(Ok(_)) => anyhow::bail!("unexpected line: {:?}", line.trim_end()),
            Ok(Err(e)) => Err(e.into()),
        }
    }

    /// Wait for the server to close the connection, discarding any lines.
    #[allow(dead_code)]
    pub async fn expect_closed(&mut self, dur: Duration) -> anyhow::Result<()> {
        let deadline = tokio::time::Instant::now() + dur;
        loop {
            let mut line = String::new();
            let n = tokio::time::timeout_at(deadline, self.reader.read_line(&mut line)).await??;
            if n == 0 {
                return Ok(());
            }
        }
    }

    /// Close our side of the connection.
    pub async fn quit(mut self) -> anyhow::Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
