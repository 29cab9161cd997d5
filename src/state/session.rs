use chrono::{DateTime, Utc};
use std::fmt;
use std::net::SocketAddr;
use tokio::sync::watch;

/// Process wide unique session id, handed out in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Snapshot of an active session, as reported by the service.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: SessionId,
    pub peer: SocketAddr,
    pub connected_at: DateTime<Utc>,
}

/// The service side of a running session. It can ask the session to stop,
/// but has no access to the session's connection.
#[derive(Debug)]
pub struct SessionHandle {
    info: SessionInfo,
    stop: watch::Sender<bool>,
}

impl SessionHandle {
    /// Create the handle together with the receiving end of its stop signal.
    pub fn new(id: SessionId, peer: SocketAddr) -> (Self, StopSignal) {
        let (stop, rx) = watch::channel(false);
        let handle = Self {
            info: SessionInfo {
                id,
                peer,
                connected_at: Utc::now(),
            },
            stop,
        };
        (handle, StopSignal { rx })
    }

    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    pub fn signal_stop(&self) {
        self.stop.send_replace(true);
    }
}

/// Session side of the stop signal.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the service has asked the session to stop.
    pub async fn stopped(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            // Handle is gone without a stop; never fire
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn peer() -> SocketAddr {
        "127.0.0.1:40000".parse().unwrap()
    }

    #[test]
    fn id_display() {
        assert_eq!(SessionId(7).to_string(), "session-7");
    }

    #[tokio::test]
    async fn stop_signal_fires() {
        let (handle, mut signal) = SessionHandle::new(SessionId(1), peer());
        assert!(!signal.is_stopped());

        let waiter = tokio::spawn(async move {
            signal.stopped().await;
            signal.is_stopped()
        });

        handle.signal_stop();
        let stopped = tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert!(stopped);
    }

    #[tokio::test]
    async fn stop_before_waiting_is_not_lost() {
        let (handle, mut signal) = SessionHandle::new(SessionId(2), peer());
        handle.signal_stop();
        tokio::time::timeout(Duration::from_secs(1), signal.stopped()).await.unwrap();
    }

    #[tokio::test]
    async fn dropped_handle_does_not_stop() {
        let (handle, mut signal) = SessionHandle::new(SessionId(3), peer());
        drop(handle);
        assert!(tokio::time::timeout(Duration::from_millis(50), signal.stopped()).await.is_err());
    }
}
