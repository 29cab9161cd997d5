#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use telmon::commands::StatusCommand;
use telmon::{Command, CommandError, CommandResult, Config, Console, Service};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::task::JoinHandle;

pub const PROMPT: &str = "ready> ";
const WAIT: Duration = Duration::from_secs(5);

/// Needs exactly one numeric argument.
pub struct Double;

#[async_trait]
impl Command for Double {
    fn name(&self) -> &str {
        "double"
    }

    fn description(&self) -> &str {
        "double a number"
    }

    async fn execute(&self, console: &mut Console, args: &[String]) -> CommandResult {
        let [n] = args else {
            return Err(CommandError::invalid_args("Usage: double <n>"));
        };
        let n: i64 = n
            .parse()
            .map_err(|_| CommandError::invalid_args(format!("Not a number: {n}")))?;
        console.line((n * 2).to_string()).await?;
        Ok(())
    }
}

/// Reads lines until it sees `end`, then reports how many it got.
pub struct Collect;

#[async_trait]
impl Command for Collect {
    fn name(&self) -> &str {
        "collect"
    }

    fn description(&self) -> &str {
        "collect lines until 'end'"
    }

    async fn execute(&self, console: &mut Console, _args: &[String]) -> CommandResult {
        let mut count = 0;
        loop {
            console.write("more> ").await?;
            match console.read_line().await? {
                Some(line) if line == "end" => break,
                Some(_) => count += 1,
                None => return Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof).into()),
            }
        }
        console.line(format!("collected {count}")).await?;
        Ok(())
    }
}

pub struct TestServer {
    pub service: Arc<Service>,
    pub addr: std::net::SocketAddr,
    pub task: JoinHandle<telmon::error::AppResult<()>>,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with(Config::default()).await
    }

    pub async fn spawn_with(cfg: Config) -> Self {
        let cfg = Config {
            host: "127.0.0.1".to_string(),
            port: 0,
            welcome_message: "Test monitor".to_string(),
            ready_message: "ready>".to_string(),
            accept_timeout_ms: 50,
            ..cfg
        };

        let service = Arc::new(Service::new(cfg));
        service.register_command(StatusCommand);
        service.register_command(Double);
        service.register_command(Collect);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let task = tokio::spawn(service.clone().serve(listener));

        Self { service, addr, task }
    }

    /// Connect and consume the banner up to the first prompt.
    pub async fn connect(&self) -> (TestClient, Vec<String>) {
        let stream = TcpStream::connect(self.addr).await.expect("Failed to connect");
        let (r, w) = stream.into_split();
        let mut client = TestClient {
            reader: BufReader::new(r),
            writer: w,
        };
        let banner = client.until_prompt().await;
        (client, banner)
    }

    pub async fn wait_for_sessions(&self, n: usize) {
        tokio::time::timeout(WAIT, async {
            while self.service.session_count() != n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("expected {n} sessions, have {}", self.service.session_count()));
    }
}

pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    pub async fn send(&mut self, line: &str) {
        self.send_raw(format!("{line}\r\n").as_bytes()).await;
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.expect("Failed to send");
    }

    /// Send a request and return the response lines up to the next prompt.
    pub async fn request(&mut self, line: &str) -> Vec<String> {
        self.send(line).await;
        self.until_prompt().await
    }

    pub async fn until_prompt(&mut self) -> Vec<String> {
        self.until(PROMPT).await
    }

    /// Read until the output ends with `marker`; return the lines before it.
    pub async fn until(&mut self, marker: &str) -> Vec<String> {
        let mut buf = Vec::new();
        let mut byte = [0u8; 1];
        while !buf.ends_with(marker.as_bytes()) {
            let n = tokio::time::timeout(WAIT, self.reader.read(&mut byte))
                .await
                .expect("Timed out waiting for output")
                .expect("Failed to read");
            assert!(n > 0, "connection closed early, got: {:?}", String::from_utf8_lossy(&buf));
            buf.push(byte[0]);
        }
        buf.truncate(buf.len() - marker.len());
        lines(&buf)
    }

    /// Read everything until the server closes the connection.
    pub async fn until_closed(&mut self) -> Vec<String> {
        let mut buf = Vec::new();
        tokio::time::timeout(WAIT, self.reader.read_to_end(&mut buf))
            .await
            .expect("Timed out waiting for close")
            .expect("Failed to read");
        lines(&buf)
    }
}

fn lines(buf: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(buf)
        .split('\n')
        .map(|l| l.trim_end_matches('\r').to_string())
        .filter(|l| !l.is_empty())
        .collect()
}
