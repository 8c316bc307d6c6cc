use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};

static SERVER: OnceLock<TestServer> = OnceLock::new();
static COUNTER: AtomicU32 = AtomicU32::new(0);

/// Integration tests need a reachable Postgres. Without DATABASE_URL the
/// suite is a no-op rather than a failure.
pub fn database_available() -> bool {
    std::env::var("DATABASE_URL").is_ok()
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        let mut cmd = Command::new("target/debug/partner-desk");
        cmd.env("PARTNER_DESK_PORT", port.to_string())
            .env("JWT_SECRET", "integration-test-secret")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server can see DATABASE_URL from .env
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Unique email per call so suites can re-run against the same database.
pub fn unique_email(prefix: &str) -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{}-{}-{}@test.example.com", prefix, nanos, n)
}

pub struct TestAccount {
    pub token: String,
    pub user_id: String,
    pub email: String,
}

/// Register a fresh account through the public endpoint and return its
/// token and id.
pub async fn register_account(
    client: &reqwest::Client,
    base_url: &str,
    role: &str,
) -> Result<TestAccount> {
    let email = unique_email(role);
    let resp = client
        .post(format!("{}/auth/register", base_url))
        .json(&json!({
            "email": email,
            "password": "correct horse battery staple",
            "name": format!("{} tester", role),
            "role": role,
        }))
        .send()
        .await?;

    anyhow::ensure!(
        resp.status() == StatusCode::CREATED,
        "registration for {} failed: {}",
        role,
        resp.status()
    );

    let body: Value = resp.json().await?;
    let token = body["token"]
        .as_str()
        .context("missing token in register response")?
        .to_string();
    let user_id = body["user"]["id"]
        .as_str()
        .context("missing user id in register response")?
        .to_string();

    Ok(TestAccount { token, user_id, email })
}

pub fn bearer(account: &TestAccount) -> String {
    format!("Bearer {}", account.token)
}
