use std::{path::Path, time::Duration};

use anyhow::{Result, anyhow};
use filmdb_server::config::{Parser, ServerConfig};
use rand::Rng as _;
use reqwest::Url;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::debug;

pub mod rest;

fn random_port() -> Result<u16> {
    let mut rng = rand::rng();

    let mut retries = 3;
    while retries > 0 {
        let port: u16 = rng.random_range(3030..4030);
        let addr: std::net::SocketAddr = format!("127.0.0.1:{}", port).parse()?;
        match std::net::TcpStream::connect_timeout(&addr, Duration::from_millis(100)) {
            Err(e) if e.kind() == std::io::ErrorKind::ConnectionRefused => return Ok(port),
            Err(_) => retries -= 1,
            Ok(_) => retries -= 1,
        }
    }

    Err(anyhow!("Could not find a free port"))
}

pub struct ConfigGuard {
    #[allow(dead_code)]
    data_dir: TempDir,
}

pub fn test_config(
    test_name: &str,
    base_dir: &Path,
    extra_args: &[&str],
) -> Result<(ServerConfig, ConfigGuard)> {
    let tmp_data_dir = TempDir::with_prefix_in(format!("{}_", test_name), base_dir)?;
    let data_dir = tmp_data_dir.path().to_string_lossy().to_string();
    let port = random_port()?.to_string();
    let mut args: Vec<&str> = vec!["filmdb-e2e-tests", "--data-dir", &data_dir, "--port", &port];
    args.extend_from_slice(extra_args);
    let config = ServerConfig::try_parse_from(args)?;
    Ok((
        config,
        ConfigGuard {
            data_dir: tmp_data_dir,
        },
    ))
}

/// Creates server config with fresh data directory in system temp directory
pub async fn prepare_env(
    test_name: &str,
    extra_args: &[&str],
) -> Result<(ServerConfig, ConfigGuard)> {
    test_config(test_name, &std::env::temp_dir(), extra_args)
}

/// Starts server in background and waits until it responds to health check
pub async fn launch_env(args: ServerConfig) -> Result<(reqwest::Client, JoinHandle<()>)> {
    let base_url = args.base_url()?;
    let handle = tokio::spawn(async move {
        if let Err(e) = filmdb_server::run::run(args).await {
            panic!("Server failed: {e}");
        }
    });

    let client = reqwest::Client::new();
    let health_url = base_url.join("health")?;
    for _ in 0..50 {
        match client.get(health_url.clone()).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("Server is up at {base_url}");
                return Ok((client, handle));
            }
            _ => tokio::time::sleep(Duration::from_millis(100)).await,
        }
    }

    handle.abort();
    Err(anyhow!("Server did not start at {base_url}"))
}

pub fn extend_url(url: &Url, segment: impl ToString) -> Url {
    let mut url = url.clone();
    url.path_segments_mut()
        .expect("Base URL cannot be a base")
        .pop_if_empty()
        .push(&segment.to_string());
    url
}
