//! End-to-end checks against the real `authgate` binary.
//!
//! Each test spawns the binary on a free port with its configuration passed
//! through the environment, then talks to it over plain HTTP.

use anyhow::{bail, Context, Result};
use reqwest::{header, StatusCode};
use serde_json::{json, Value};
use std::{
    net::TcpListener,
    process::{Child, Command, ExitStatus, Stdio},
    time::Duration,
};
use tokio::time::sleep;

const FRONTEND: &str = "http://localhost:5173";

struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

fn pick_port() -> Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").context("Failed to bind a local port")?;
    Ok(listener
        .local_addr()
        .context("Failed to read local port")?
        .port())
}

fn command(port: u16) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_authgate"));
    command
        .env("AUTH_SERVICE_PORT", port.to_string())
        .env("FRONTEND_ORIGIN", FRONTEND)
        .env("AUTH_LOG_LEVEL", "info")
        .env("AUTH_ARGON2_MEMORY_KIB", "8")
        .env("AUTH_ARGON2_ITERATIONS", "1")
        .env("AUTH_ARGON2_PARALLELISM", "1")
        .env_remove("AUTH_IDENTITY_PROVIDER_DISABLED")
        .env_remove("OTEL_EXPORTER_OTLP_ENDPOINT")
        .stdout(Stdio::null())
        .stderr(Stdio::inherit());
    command
}

fn client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(authgate::APP_USER_AGENT)
        .timeout(Duration::from_secs(5))
        .build()?)
}

async fn wait_for_ready(client: &reqwest::Client, base: &str) -> Result<()> {
    for _ in 0..80 {
        match client.get(format!("{base}/api/auth/ok")).send().await {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => sleep(Duration::from_millis(250)).await,
        }
    }
    bail!("authgate did not become ready at {base}");
}

async fn wait_for_exit(child: &mut Child) -> Result<ExitStatus> {
    for _ in 0..80 {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        sleep(Duration::from_millis(250)).await;
    }
    bail!("authgate did not exit");
}

#[tokio::test]
async fn active_mode_signup_login_and_session() -> Result<()> {
    let port = pick_port()?;
    let _child = ChildGuard(
        command(port)
            .spawn()
            .context("Failed to spawn authgate binary")?,
    );

    let client = client()?;
    let base = format!("http://127.0.0.1:{port}");
    wait_for_ready(&client, &base).await?;

    let resp = client.get(format!("{base}/health")).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let health: Value = resp.json().await?;
    assert_eq!(health["mode"], "active");

    let credentials = json!({"email": "Ada@Example.com", "password": "correct horse battery"});

    let resp = client
        .post(format!("{base}/api/auth/signup"))
        .header(header::ORIGIN, FRONTEND)
        .json(&credentials)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(
        resp.headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some(FRONTEND)
    );

    let resp = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({"email": "ada@example.com", "password": "correct horse battery"}))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await?;
    let token = body["sessionToken"]
        .as_str()
        .context("missing sessionToken")?
        .to_string();

    let resp = client
        .get(format!("{base}/api/auth/session"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let session: Value = resp.json().await?;
    assert_eq!(session["email"], "ada@example.com");

    let resp = client
        .post(format!("{base}/api/auth/login"))
        .header(header::ORIGIN, "https://evil.example")
        .json(&json!({"email": "ada@example.com", "password": "wrong password!"}))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());

    Ok(())
}

#[tokio::test]
async fn degraded_mode_serves_liveness_only() -> Result<()> {
    let port = pick_port()?;
    let _child = ChildGuard(
        command(port)
            .env("AUTH_IDENTITY_PROVIDER_DISABLED", "true")
            .spawn()
            .context("Failed to spawn authgate binary")?,
    );

    let client = client()?;
    let base = format!("http://127.0.0.1:{port}");
    wait_for_ready(&client, &base).await?;

    let resp = client
        .post(format!("{base}/api/auth/login"))
        .json(&json!({"email": "ada@example.com", "password": "correct horse battery"}))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let resp = client
        .post(format!("{base}/api/auth/signup"))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    Ok(())
}

#[tokio::test]
async fn provider_failure_exits_before_listening() -> Result<()> {
    let port = pick_port()?;
    let mut child = ChildGuard(
        command(port)
            .env("AUTH_ARGON2_MEMORY_KIB", "1")
            .spawn()
            .context("Failed to spawn authgate binary")?,
    );

    let status = wait_for_exit(&mut child.0).await?;
    assert!(!status.success());

    let client = client()?;
    let result = client
        .get(format!("http://127.0.0.1:{port}/api/auth/ok"))
        .send()
        .await;
    assert!(result.is_err(), "nothing should be listening on {port}");

    Ok(())
}
