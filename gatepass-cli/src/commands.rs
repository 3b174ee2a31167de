//! Command implementations.

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use gatepass_core::{Credential, Namespace};
use gatepass_fetch::{Body, FetchGateway, RequestOptions};
use gatepass_store::{CredentialStore, JsonFileStore, default_credentials_path};

// ============================================================================
// Argument Types
// ============================================================================

/// Arguments for `gatepass get`.
#[derive(Args)]
pub struct GetArgs {
    /// The URL to fetch.
    pub url: String,

    /// Query parameter (key=value, repeatable).
    #[arg(long = "param", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,

    /// Request header (key=value, repeatable).
    #[arg(long = "header", value_parser = parse_key_val)]
    pub headers: Vec<(String, String)>,

    /// Request cookie (key=value, repeatable).
    #[arg(long = "cookie", value_parser = parse_key_val)]
    pub cookies: Vec<(String, String)>,

    /// Per-HTTP-call timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the full response as JSON instead of the body.
    #[arg(long)]
    pub json_output: bool,
}

/// Arguments for `gatepass post`.
#[derive(Args)]
pub struct PostArgs {
    /// The URL to post to.
    pub url: String,

    /// Form field (key=value, repeatable). Mutually exclusive with --json.
    #[arg(long = "form", value_parser = parse_key_val, conflicts_with = "json")]
    pub form: Vec<(String, String)>,

    /// JSON request body.
    #[arg(long)]
    pub json: Option<String>,

    /// Request header (key=value, repeatable).
    #[arg(long = "header", value_parser = parse_key_val)]
    pub headers: Vec<(String, String)>,

    /// Request cookie (key=value, repeatable).
    #[arg(long = "cookie", value_parser = parse_key_val)]
    pub cookies: Vec<(String, String)>,

    /// Per-HTTP-call timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the full response as JSON instead of the body.
    #[arg(long)]
    pub json_output: bool,
}

/// Credential store operations.
///
/// `set --login` is the explicit login procedure: it writes into the login
/// namespace, which always wins when merged into outgoing requests and is
/// never auto-evicted by the fetch path.
#[derive(Subcommand)]
pub enum CredsCommand {
    /// Store a credential for a domain, replacing any prior record.
    Set {
        /// Registrable domain the credential belongs to (e.g. example.com).
        domain: String,

        /// Write into the login namespace instead of the opportunistic one.
        #[arg(long)]
        login: bool,

        /// Credential header (key=value, repeatable).
        #[arg(long = "header", value_parser = parse_key_val)]
        headers: Vec<(String, String)>,

        /// Credential cookie (key=value, repeatable).
        #[arg(long = "cookie", value_parser = parse_key_val)]
        cookies: Vec<(String, String)>,
    },
    /// Show the stored credentials for a domain (both namespaces).
    Show {
        /// Registrable domain to inspect.
        domain: String,
    },
    /// Delete the stored credential for a domain.
    Clear {
        /// Registrable domain to clear.
        domain: String,

        /// Clear the login namespace instead of the opportunistic one.
        #[arg(long)]
        login: bool,
    },
}

/// Parses a `key=value` argument.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

// ============================================================================
// Gateway Construction
// ============================================================================

fn credentials_path(override_path: Option<PathBuf>) -> PathBuf {
    override_path.unwrap_or_else(default_credentials_path)
}

async fn build_gateway(credentials: Option<PathBuf>) -> Result<FetchGateway> {
    let path = credentials_path(credentials);
    info!(path = %path.display(), "Using credential store");
    let store = JsonFileStore::load(path)
        .await
        .context("failed to load credential store")?;

    // No external challenge solver is wired up here; the gateway still
    // reuses stored clearances and login sessions.
    let gateway = FetchGateway::builder()
        .store(Arc::new(store))
        .build()
        .context("failed to construct fetch gateway")?;
    Ok(gateway)
}

fn assemble_options(
    params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    cookies: Vec<(String, String)>,
    timeout: Option<u64>,
) -> RequestOptions {
    let mut options = RequestOptions::new();
    options.params = params;
    options.headers = headers.into_iter().collect();
    options.cookies = cookies.into_iter().collect();
    options.timeout = timeout.map(Duration::from_secs);
    options
}

fn print_response(response: &gatepass_core::FetchResponse, json_output: bool) -> Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(response)?);
    } else {
        eprintln!("{} {}", response.status, response.final_url);
        println!("{}", response.text);
    }
    Ok(())
}

// ============================================================================
// Command Handlers
// ============================================================================

/// Runs `gatepass get`.
pub async fn get(args: GetArgs, credentials: Option<PathBuf>) -> Result<()> {
    let gateway = build_gateway(credentials).await?;
    let options = assemble_options(args.params, args.headers, args.cookies, args.timeout);

    let response = gateway.get(&args.url, options).await?;
    print_response(&response, args.json_output)
}

/// Runs `gatepass post`.
pub async fn post(args: PostArgs, credentials: Option<PathBuf>) -> Result<()> {
    let gateway = build_gateway(credentials).await?;
    let options = assemble_options(Vec::new(), args.headers, args.cookies, args.timeout);

    let body = if let Some(json) = args.json {
        let value = serde_json::from_str(&json).context("invalid --json body")?;
        Body::Json(value)
    } else if args.form.is_empty() {
        Body::None
    } else {
        Body::Form(args.form.into_iter().collect())
    };

    let response = gateway.post(&args.url, body, options).await?;
    print_response(&response, args.json_output)
}

/// Runs `gatepass creds`.
pub async fn creds(command: CredsCommand, credentials: Option<PathBuf>) -> Result<()> {
    let store = JsonFileStore::load(credentials_path(credentials))
        .await
        .context("failed to load credential store")?;

    match command {
        CredsCommand::Set {
            domain,
            login,
            headers,
            cookies,
        } => {
            if headers.is_empty() && cookies.is_empty() {
                bail!("provide at least one --header or --cookie");
            }
            let namespace = if login {
                Namespace::Login
            } else {
                Namespace::Opportunistic
            };
            let credential = Credential::new(
                headers.into_iter().collect::<BTreeMap<_, _>>(),
                cookies.into_iter().collect::<BTreeMap<_, _>>(),
            );
            store.insert(&domain, namespace, credential).await?;
            println!("Stored {namespace} credential for {domain}");
        }
        CredsCommand::Show { domain } => {
            for namespace in [Namespace::Opportunistic, Namespace::Login] {
                match store.get(&domain, namespace).await? {
                    Some(credential) => {
                        println!("{namespace}:");
                        println!("{}", serde_json::to_string_pretty(&credential)?);
                    }
                    None => println!("{namespace}: (none)"),
                }
            }
        }
        CredsCommand::Clear { domain, login } => {
            let namespace = if login {
                Namespace::Login
            } else {
                Namespace::Opportunistic
            };
            store.delete(&domain, namespace).await?;
            println!("Cleared {namespace} credential for {domain}");
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("a=b").unwrap(),
            ("a".to_string(), "b".to_string())
        );
        assert_eq!(
            parse_key_val("a=b=c").unwrap(),
            ("a".to_string(), "b=c".to_string())
        );
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_assemble_options() {
        let options = assemble_options(
            vec![("page".to_string(), "2".to_string())],
            vec![("Accept".to_string(), "text/html".to_string())],
            Vec::new(),
            Some(15),
        );
        assert_eq!(options.timeout, Some(Duration::from_secs(15)));
        assert_eq!(options.params.len(), 1);
        assert_eq!(options.headers.len(), 1);
    }
}
