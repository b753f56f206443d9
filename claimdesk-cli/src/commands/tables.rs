//! Row access from the command line: fetch, upsert, whoami

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};

use claimdesk_backend::SupabaseClient;
use claimdesk_core::pipeline;
use claimdesk_core::{rows_from_json, AccessToken, Backend, DeskConfig, Row, TableName};

/// How to authenticate against the backend
#[derive(Args, Debug)]
pub struct AuthArgs {
    /// Access token of a signed-in user
    #[arg(long, env = "CLAIMDESK_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Email to sign in with (instead of an access token)
    #[arg(long, env = "CLAIMDESK_EMAIL")]
    pub email: Option<String>,

    /// Password for --email
    #[arg(long, env = "CLAIMDESK_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

impl AuthArgs {
    async fn token(&self, backend: &dyn Backend) -> Result<AccessToken> {
        if let Some(token) = &self.access_token {
            return Ok(AccessToken::new(token.clone()));
        }
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => {
                let session = backend
                    .sign_in(email, password)
                    .await
                    .context("Sign-in failed")?;
                Ok(session.access_token)
            }
            (Some(_), None) => bail!("--email requires --password (or CLAIMDESK_PASSWORD)"),
            _ => bail!("No credentials. Pass --access-token, or --email with --password"),
        }
    }
}

#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Table to read (claims or user_profiles)
    pub table: TableName,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub auth: AuthArgs,
}

#[derive(Parser, Debug)]
pub struct UpsertArgs {
    /// Table to write (claims or user_profiles)
    pub table: TableName,

    /// JSON file holding an array of rows
    #[arg(long, short = 'f')]
    pub file: PathBuf,

    #[command(flatten)]
    pub auth: AuthArgs,
}

#[derive(Parser, Debug)]
pub struct WhoamiArgs {
    #[command(flatten)]
    pub auth: AuthArgs,
}

fn client(config: &DeskConfig) -> Result<SupabaseClient> {
    SupabaseClient::from_config(config)
        .context("Backend not configured. Set SUPABASE_URL and SUPABASE_ANON_KEY")
}

/// Read a JSON array of rows
pub fn read_rows(path: &PathBuf) -> Result<Vec<Row>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(rows_from_json(&content, &path.display().to_string())?)
}

pub async fn run_fetch(args: FetchArgs, config: &DeskConfig) -> Result<()> {
    let backend = client(config)?;
    let token = args.auth.token(&backend).await?;

    let table = pipeline::load_table(&backend, &token, args.table)
        .await
        .context("Error fetching data")?;
    tracing::info!(table = %args.table, rows = table.len(), "Fetched rows");

    let output = if args.pretty {
        serde_json::to_string_pretty(&table.rows)?
    } else {
        serde_json::to_string(&table.rows)?
    };
    println!("{}", output);
    Ok(())
}

pub async fn run_upsert(args: UpsertArgs, config: &DeskConfig) -> Result<()> {
    let rows = read_rows(&args.file)?;
    let backend = client(config)?;
    let token = args.auth.token(&backend).await?;

    backend
        .upsert(&token, args.table, &rows)
        .await
        .with_context(|| format!("Error saving {}", args.table.noun()))?;
    println!("Upserted {} row(s) into {}", rows.len(), args.table);
    Ok(())
}

pub async fn run_whoami(args: WhoamiArgs, config: &DeskConfig) -> Result<()> {
    let backend = client(config)?;
    let token = args.auth.token(&backend).await?;

    match backend.get_user(&token).await? {
        Some(user) => {
            println!("{}", user.email.as_deref().unwrap_or(&user.id));
            Ok(())
        }
        None => bail!("Not signed in (token rejected)"),
    }
}
