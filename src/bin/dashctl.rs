//!
//! dashctl
//! -------
//! Operator CLI for the coordinator dashboard. Logs in against a coordinator,
//! keeps the session (on disk when `--retain` is given) and moves artifact and
//! attachment files through presigned URLs.

use std::io::{self, BufRead};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Method;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use coordinator_dashboard::config::ClientConfig;
use coordinator_dashboard::coordinator::{CoordinatorClient, CoordinatorRequest};
use coordinator_dashboard::identity::{Session, SessionStore};
use coordinator_dashboard::transfer::{self, ArtifactContentType, TransferTarget};

#[derive(Debug, Parser)]
#[command(name = "dashctl", version, about = "Coordinator dashboard operator CLI")]
struct Cli {
    /// Session file (env: DASHCTL_SESSION_FILE)
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,
    /// Session lifetime in hours, 0 disables expiry (env: DASHCTL_SESSION_TTL_HOURS, default 168)
    #[arg(long, global = true)]
    session_ttl_hours: Option<i64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Authenticate and store the session
    Login {
        #[arg(long)]
        coordinator: String,
        #[arg(long, short)]
        username: String,
        /// Read from DASHCTL_PASSWORD or stdin when omitted
        #[arg(long)]
        password: Option<String>,
        /// Keep the session on disk for later invocations. Without it the
        /// session ends when this process exits and the token is printed instead
        #[arg(long)]
        retain: bool,
    },
    /// Forget the stored session
    Logout,
    /// Show the stored session
    Status,
    UploadArtifact {
        #[arg(long)]
        uuid: String,
        #[arg(long)]
        content_type: ArtifactContentType,
        file: PathBuf,
    },
    UploadAttachment {
        #[arg(long)]
        group: String,
        #[arg(long)]
        key: String,
        file: PathBuf,
    },
    DownloadArtifact {
        #[arg(long)]
        uuid: String,
        #[arg(long)]
        content_type: ArtifactContentType,
        #[arg(long, short)]
        output: PathBuf,
    },
    DownloadAttachment {
        #[arg(long)]
        group: String,
        #[arg(long)]
        key: String,
        #[arg(long, short)]
        output: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct LoginReply {
    token: String,
}

fn read_password(arg: Option<String>) -> Result<String> {
    if let Some(p) = arg { return Ok(p); }
    if let Ok(p) = std::env::var("DASHCTL_PASSWORD") { return Ok(p); }
    eprint!("password: ");
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("While reading password from stdin")?;
    let p = line.trim_end_matches(['\r', '\n']).to_string();
    if p.is_empty() { bail!("empty password"); }
    Ok(p)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .try_init();

    let cli = Cli::parse();
    let cfg = ClientConfig::resolve(cli.session_file, cli.session_ttl_hours)?;
    let store = SessionStore::new(cfg.session_file.clone(), cfg.session_ttl);
    let client = CoordinatorClient::new();

    match cli.command {
        Command::Login { coordinator, username, password, retain } => {
            let password = read_password(password)?;
            let req = CoordinatorRequest::new(Method::POST, "/login").json(serde_json::json!({
                "username": username,
                "password": password,
                "retain": retain,
            }));
            let reply = client.send(&coordinator, req).await.map_err(|e| anyhow!("login failed: {}", e))?;
            let LoginReply { token } = reply.json().map_err(|e| anyhow!("login reply: {}", e))?;
            let session = Session::new(&username, &token, &coordinator, retain);
            store.save(&session)?;
            println!("logged in as {} at {}", session.username, session.coordinator_addr);
            if !retain {
                println!("session not retained; later commands will not see it (pass --retain to keep it)");
                println!("token: {}", session.token);
            }
        }
        Command::Logout => {
            store.clear()?;
            println!("logged out");
        }
        Command::Status => match store.load()? {
            Some(s) => {
                println!("user:        {}", s.username);
                println!("coordinator: {}", s.coordinator_addr);
                println!("login time:  {}", s.login_time.to_rfc3339());
                println!("retained:    {}", s.retain);
            }
            None => println!("not logged in"),
        },
        Command::UploadArtifact { uuid, content_type, file } => {
            let bytes = std::fs::read(&file).with_context(|| format!("While reading {}", file.display()))?;
            let target = TransferTarget::Artifact { uuid, content_type };
            let len = bytes.len();
            transfer::upload_with_store(&client, &store, &target, bytes).await?;
            println!("uploaded {} ({} bytes)", target, len);
        }
        Command::UploadAttachment { group, key, file } => {
            let bytes = std::fs::read(&file).with_context(|| format!("While reading {}", file.display()))?;
            let target = TransferTarget::Attachment { group_name: group, key };
            let len = bytes.len();
            transfer::upload_with_store(&client, &store, &target, bytes).await?;
            println!("uploaded {} ({} bytes)", target, len);
        }
        Command::DownloadArtifact { uuid, content_type, output } => {
            let target = TransferTarget::Artifact { uuid, content_type };
            let bytes = transfer::download_with_store(&client, &store, &target).await?;
            std::fs::write(&output, &bytes).with_context(|| format!("While writing {}", output.display()))?;
            println!("downloaded {} to {} ({} bytes)", target, output.display(), bytes.len());
        }
        Command::DownloadAttachment { group, key, output } => {
            let target = TransferTarget::Attachment { group_name: group, key };
            let bytes = transfer::download_with_store(&client, &store, &target).await?;
            std::fs::write(&output, &bytes).with_context(|| format!("While writing {}", output.display()))?;
            println!("downloaded {} to {} ({} bytes)", target, output.display(), bytes.len());
        }
    }
    Ok(())
}
