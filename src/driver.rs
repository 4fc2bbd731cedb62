//! chromedriver lifecycle: locate the binary, start it on a local port,
//! connect a session, and tear everything down when the run ends.
//!
//! A missing binary is the one fatal setup fault of the whole program and
//! is reported before anything touches the network.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use thirtyfour::prelude::*;
use tokio::net::TcpStream;
use tracing::{info, warn};

use crate::error::{Result, ScrapeError};

pub const DEFAULT_PORT: u16 = 9515;

const BINARY_NAME: &str = if cfg!(windows) {
    "chromedriver.exe"
} else {
    "chromedriver"
};

const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// A running chromedriver process plus the browser session connected to it.
/// One exists per run; discovery and every rendered detail fetch share it.
pub struct DriverSession {
    pub driver: WebDriver,
    process: Child,
}

impl DriverSession {
    /// Locates the binary (a directory means "look for the executable
    /// inside it"), spawns it and connects. Fails before any scraping
    /// network activity if the binary is missing or never comes up.
    pub async fn start(binary: &Path, port: u16) -> Result<Self> {
        let binary = locate_binary(binary)?;
        info!("located web driver at {}", binary.display());

        let mut process = Command::new(&binary)
            .arg(format!("--port={port}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        let endpoint = format!("http://localhost:{port}");
        if !wait_reachable(port, READY_TIMEOUT).await {
            let _ = process.kill();
            let _ = process.wait();
            return Err(ScrapeError::DriverUnreachable(endpoint));
        }

        let caps = DesiredCapabilities::chrome();
        let driver = match WebDriver::new(&endpoint, caps).await {
            Ok(driver) => driver,
            Err(e) => {
                let _ = process.kill();
                let _ = process.wait();
                return Err(e.into());
            }
        };
        Ok(Self { driver, process })
    }

    /// Quits the browser and kills the driver process. Called on every exit
    /// path, including interrupts, before results are written.
    pub async fn shutdown(self) {
        let Self {
            driver,
            mut process,
        } = self;
        if let Err(e) = driver.quit().await {
            warn!(error = %e, "browser session did not quit cleanly");
        }
        let _ = process.kill();
        let _ = process.wait();
    }
}

fn locate_binary(path: &Path) -> Result<PathBuf> {
    let candidate = if path.is_dir() {
        info!(
            "provided path is a directory, looking for {BINARY_NAME} within {}",
            path.display()
        );
        path.join(BINARY_NAME)
    } else {
        path.to_path_buf()
    };
    if candidate.is_file() {
        Ok(candidate)
    } else {
        Err(ScrapeError::DriverMissing(candidate))
    }
}

async fn wait_reachable(port: u16, timeout: Duration) -> bool {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        let attempt = tokio::time::timeout(Duration::from_secs(2), TcpStream::connect(addr)).await;
        if matches!(attempt, Ok(Ok(_))) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
    }
    false
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_binary_is_a_setup_fault() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope");
        match locate_binary(&path) {
            Err(ScrapeError::DriverMissing(reported)) => assert_eq!(reported, path),
            other => panic!("expected DriverMissing, got {other:?}"),
        }
    }

    #[test]
    fn directory_argument_searches_for_the_executable_inside() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join(BINARY_NAME);
        std::fs::write(&binary, b"").unwrap();
        assert_eq!(locate_binary(dir.path()).unwrap(), binary);
    }

    #[test]
    fn file_argument_is_used_as_is() {
        let dir = TempDir::new().unwrap();
        let binary = dir.path().join("custom-driver");
        std::fs::write(&binary, b"").unwrap();
        assert_eq!(locate_binary(&binary).unwrap(), binary);
    }

    #[tokio::test]
    async fn reachability_poll_sees_a_listening_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(wait_reachable(port, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn reachability_poll_gives_up_on_a_closed_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        assert!(!wait_reachable(port, Duration::from_millis(300)).await);
    }
}
