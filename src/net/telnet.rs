mod connection;
mod crlf_wrapper;

pub use connection::{Session, SessionState};
pub use crlf_wrapper::CrlfWriter;

use crate::Service;
use crate::error::{AppResult, ServiceError};
use crate::net::console::Console;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::Instrument;

pub const TOO_MANY_SESSIONS: &str = "Too many sessions, try again later.";

/// Run the accept loop until the service stops running or the listener fails.
pub async fn serve(listener: TcpListener, service: Arc<Service>) -> AppResult<()> {
    let timeout = service.config().accept_timeout();
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, timeout_ms = timeout.as_millis() as u64, "listening to commands");

    let result = loop {
        if !service.is_running() {
            break Ok(());
        }

        match tokio::time::timeout(timeout, listener.accept()).await {
            // Nothing came in; go check the running flag again
            Err(_elapsed) => continue,
            Ok(Ok((stream, peer))) => {
                if !service.is_running() {
                    tracing::debug!(%peer, "service stopped, dropping connection");
                    break Ok(());
                }
                spawn_session(stream, peer, service.clone());
            }
            Ok(Err(e)) => {
                // Not retried: the service stops listening for good
                tracing::error!(error = %e, "error while listening to socket");
                service.stop_listening();
                break Err(ServiceError::Io(e));
            }
        }
    };

    tracing::info!(addr = %local, "socket listening is done");
    result
}

fn spawn_session(stream: TcpStream, peer: SocketAddr, service: Arc<Service>) {
    let Some((id, stop)) = service.admit(peer) else {
        tracing::warn!(%peer, "session limit reached, rejecting connection");
        tokio::spawn(reject(stream));
        return;
    };

    tracing::info!(%peer, session_id = %id, "client connected");

    let (read_half, write_half) = stream.into_split();
    let console = Console::new(BufReader::new(read_half), CrlfWriter::new(write_half));
    let session = Session::new(id, console, service, stop);

    let span = tracing::info_span!("session", id = id.0, %peer);
    tokio::spawn(
        async move {
            if let Err(e) = session.run().await {
                tracing::warn!(error = %e, "connection has been closed");
            }
            tracing::info!("client disconnected");
        }
        .instrument(span),
    );
}

async fn reject(stream: TcpStream) {
    let mut writer = CrlfWriter::new(stream);
    let _ = writer.write_all(TOO_MANY_SESSIONS.as_bytes()).await;
    let _ = writer.write_all(b"\n").await;
    let _ = writer.shutdown().await;
}
