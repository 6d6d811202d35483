#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::io::Read;
use std::process::ExitCode;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use clap::{Parser, Subcommand};
use rand::RngCore;
use token_service::{ExtraClaims, TokenService, TokenServiceConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Issue, verify, and inspect session tokens.
///
/// Signing configuration is read from `TOKEN_*` environment variables.
#[derive(Debug, Parser)]
#[command(name = "token-service", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Issue a token for SUBJECT and print it.
    Issue {
        subject: String,
        /// Token lifetime in seconds (default: `TOKEN_DEFAULT_TTL_SECS`).
        #[arg(long)]
        ttl_secs: Option<u64>,
        /// Role to embed; repeatable.
        #[arg(long = "role")]
        roles: Vec<String>,
        /// Custom claim as KEY=VALUE; VALUE is parsed as JSON, else taken as a string.
        #[arg(long = "claim", value_parser = parse_claim)]
        claims: Vec<(String, serde_json::Value)>,
    },
    /// Verify TOKEN ("-" reads stdin) and print its claims.
    Verify { token: String },
    /// Print TOKEN's claims WITHOUT verifying it ("-" reads stdin).
    Peek { token: String },
    /// Print a random base64url secret suitable for `TOKEN_SIGNING_SECRET`.
    GenerateSecret {
        #[arg(long, default_value_t = 32)]
        bytes: usize,
    },
    /// List configured key ids, newest first.
    Keys,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "token_service=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            tracing::error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Issue {
            subject,
            ttl_secs,
            roles,
            claims,
        } => {
            let service = load_service()?;
            let mut extra: ExtraClaims = claims.into_iter().collect();
            if !roles.is_empty() {
                extra.insert("roles".to_string(), serde_json::json!(roles));
            }
            let token = service
                .issue(&subject, extra, ttl_secs.map(Duration::from_secs))
                .map_err(|e| format!("failed to issue token: {e}"))?;
            println!("{token}");
        }
        Command::Verify { token } => {
            let service = load_service()?;
            let token = read_token(token)?;
            let claims = service
                .verify(&token)
                .map_err(|e| format!("{}: {e}", e.code()))?;
            print_json(&claims)?;
        }
        Command::Peek { token } => {
            let token = read_token(token)?;
            let claims = TokenService::peek_unverified_claims(&token)
                .map_err(|e| format!("{}: {e}", e.code()))?;
            print_json(&claims)?;
        }
        Command::GenerateSecret { bytes } => {
            if bytes == 0 {
                return Err("--bytes must be positive".to_string());
            }
            let mut secret = vec![0u8; bytes];
            rand::rng().fill_bytes(&mut secret);
            println!("{}", URL_SAFE_NO_PAD.encode(&secret));
        }
        Command::Keys => {
            let service = load_service()?;
            for key_id in service.key_ids() {
                println!("{key_id}");
            }
        }
    }
    Ok(())
}

fn load_service() -> Result<TokenService, String> {
    let config =
        TokenServiceConfig::from_env().map_err(|e| format!("failed to load configuration: {e}"))?;
    let service = TokenService::new(config);
    tracing::debug!(
        key_ids = ?service.key_ids(),
        default_ttl_secs = service.default_ttl().as_secs(),
        issuer = ?service.issuer(),
        "loaded configuration"
    );
    Ok(service)
}

/// Returns `token`, or the trimmed contents of stdin when `token` is "-".
fn read_token(token: String) -> Result<String, String> {
    if token != "-" {
        return Ok(token);
    }
    let mut buffer = String::new();
    std::io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|e| format!("failed to read token from stdin: {e}"))?;
    Ok(buffer.trim().to_string())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}

fn parse_claim(raw: &str) -> Result<(String, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.is_empty() {
        return Err("claim name must not be empty".to_string());
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}
