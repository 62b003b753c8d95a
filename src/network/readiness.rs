//! Readiness polling for a freshly started container's SSH port.
//!
//! Engines publish a port before the service behind it is listening, and a
//! userland proxy may accept connections that are closed straight away. The
//! waiter therefore optionally requires the first bytes from the port to carry
//! the SSH identification string before declaring the target ready.

use log::{debug, info};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::{sleep_until, timeout_at, Instant};

use crate::configuration::Config;
use crate::container_management::types::SessionTarget;
use crate::error_handling::types::ReadinessError;

/// Substring expected in the banner of an SSH server.
pub const SSH_BANNER_MARKER: &str = "SSH";

/// Upper bound of an SSH identification line.
const BANNER_BUF_LEN: usize = 255;

/// Fixed-interval poller; no backoff, no jitter.
#[derive(Debug, Clone)]
pub struct ReadinessWaiter {
    attempts: u32,
    interval: Duration,
    banner_check: bool,
}

impl ReadinessWaiter {
    pub fn new(attempts: u32, interval: Duration, banner_check: bool) -> Self {
        Self {
            attempts,
            interval,
            banner_check,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.ready_attempts,
            config.ready_interval(),
            config.banner_check,
        )
    }

    /// Polls `target` until it is ready, returning the 1-based attempt that
    /// succeeded.
    ///
    /// Attempts start one interval apart. Each attempt, connect and banner read
    /// together, must finish within its own interval slot, so a failed wait
    /// takes at most `attempts × interval`.
    pub async fn wait(&self, target: &SessionTarget) -> Result<u32, ReadinessError> {
        info!("Waiting for {} to become available", target);

        for attempt in 1..=self.attempts {
            let slot_end = Instant::now() + self.interval;
            let reason = match timeout_at(slot_end, self.probe(target)).await {
                Ok(Ok(())) => {
                    info!("{} is ready after {} attempt(s)", target, attempt);
                    return Ok(attempt);
                }
                Ok(Err(reason)) => reason,
                Err(_) => "timed out".to_string(),
            };
            debug!(
                "Readiness attempt {}/{} for {} failed: {}",
                attempt, self.attempts, target, reason
            );
            if attempt < self.attempts {
                sleep_until(slot_end).await;
            }
        }

        Err(ReadinessError::Timeout {
            target: target.to_string(),
            attempts: self.attempts,
        })
    }

    async fn probe(&self, target: &SessionTarget) -> Result<(), String> {
        let mut stream = TcpStream::connect((target.host.as_str(), target.port))
            .await
            .map_err(|e| e.to_string())?;

        if !self.banner_check {
            return Ok(());
        }

        let mut buf = [0u8; BANNER_BUF_LEN];
        let n = stream.read(&mut buf).await.map_err(|e| e.to_string())?;

        if contains_banner(&buf[..n]) {
            Ok(())
        } else if n == 0 {
            Err("connection closed before banner".to_string())
        } else {
            Err(format!(
                "unexpected banner {:?}",
                String::from_utf8_lossy(&buf[..n])
            ))
        }
    }
}

fn contains_banner(bytes: &[u8]) -> bool {
    let marker = SSH_BANNER_MARKER.as_bytes();
    bytes.windows(marker.len()).any(|w| w == marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    const INTERVAL: Duration = Duration::from_millis(50);

    /// A local port with nothing listening on it.
    async fn closed_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    /// Serves `greeting` to every connection, then closes it. The counter
    /// tracks accepted connections.
    async fn greeting_server(greeting: &'static [u8]) -> (u16, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = socket.write_all(greeting).await;
            }
        });
        (port, accepted)
    }

    /// Accepts and holds every connection without ever writing to it.
    async fn silent_server() -> (u16, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let accepted = Arc::new(AtomicUsize::new(0));
        let counter = accepted.clone();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                held.push(socket);
            }
        });
        (port, accepted)
    }

    #[test]
    fn test_banner_detection() {
        assert!(contains_banner(b"SSH-2.0-OpenSSH_9.6\r\n"));
        assert!(!contains_banner(b"HTTP/1.1 400 Bad Request"));
        assert!(!contains_banner(b""));
    }

    #[tokio::test]
    async fn test_ready_on_first_attempt_with_banner() {
        let (port, _) = greeting_server(b"SSH-2.0-OpenSSH\r\n").await;
        let waiter = ReadinessWaiter::new(60, Duration::from_millis(500), true);

        let started = std::time::Instant::now();
        let attempt = waiter
            .wait(&SessionTarget::new("127.0.0.1", port))
            .await
            .unwrap();

        assert_eq!(attempt, 1);
        assert!(started.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_gives_up_after_configured_attempts() {
        let port = closed_port().await;
        let waiter = ReadinessWaiter::new(5, INTERVAL, true);

        let started = std::time::Instant::now();
        let err = waiter
            .wait(&SessionTarget::new("127.0.0.1", port))
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        let ReadinessError::Timeout { target, attempts } = err;
        assert_eq!(attempts, 5);
        assert_eq!(target, format!("127.0.0.1:{}", port));
        // No sleep follows the final attempt.
        assert!(elapsed >= INTERVAL * 4, "gave up after {:?}", elapsed);
        assert!(elapsed < INTERVAL * 5 + Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_silent_port_stays_within_budget() {
        let (port, accepted) = silent_server().await;
        let interval = Duration::from_millis(100);
        let waiter = ReadinessWaiter::new(10, interval, true);

        let started = std::time::Instant::now();
        let result = waiter.wait(&SessionTarget::new("127.0.0.1", port)).await;
        let elapsed = started.elapsed();

        assert!(matches!(
            result,
            Err(ReadinessError::Timeout { attempts: 10, .. })
        ));
        assert!(
            elapsed < interval * 10 + Duration::from_millis(300),
            "gave up after {:?}",
            elapsed
        );
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(accepted.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn test_open_port_without_banner_is_not_ready() {
        let (port, accepted) = greeting_server(b"HTTP/1.1 200 OK\r\n\r\n").await;
        let waiter = ReadinessWaiter::new(3, INTERVAL, true);

        let result = waiter.wait(&SessionTarget::new("127.0.0.1", port)).await;
        assert!(matches!(
            result,
            Err(ReadinessError::Timeout { attempts: 3, .. })
        ));
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(accepted.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_plain_connect_suffices_without_banner_check() {
        let (port, accepted) = greeting_server(b"").await;
        let waiter = ReadinessWaiter::new(3, INTERVAL, false);

        let attempt = waiter
            .wait(&SessionTarget::new("127.0.0.1", port))
            .await
            .unwrap();
        assert_eq!(attempt, 1);
        tokio::time::sleep(INTERVAL).await;
        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_becomes_ready_once_service_starts() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let target = SessionTarget::new("127.0.0.1", port);
        let waiter = ReadinessWaiter::new(40, INTERVAL, true);
        let wait = tokio::spawn(async move { waiter.wait(&target).await });

        tokio::time::sleep(INTERVAL * 3).await;
        let listener = TcpListener::bind(("127.0.0.1", port)).await.unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let _ = socket.write_all(b"SSH-2.0-dropbear\r\n").await;
            }
        });

        let attempt = wait.await.unwrap().unwrap();
        assert!(attempt > 1);
    }

    #[test]
    fn test_from_config_uses_defaults() {
        let waiter = ReadinessWaiter::from_config(&Config::default());
        assert_eq!(waiter.attempts, 60);
        assert_eq!(waiter.interval, Duration::from_millis(500));
        assert!(waiter.banner_check);
    }
}
