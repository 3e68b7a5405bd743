//! Pre-login and token acquisition example.
//!
//! Connects to a server, negotiates encryption and, when the connection
//! string selects a `fedauth` workflow, acquires the bearer token the login
//! stage would send.
//!
//! # Running
//!
//! ```bash
//! export MSSQL_CONNECTION_STRING="Server=myserver.database.windows.net;\
//!     fedauth=ActiveDirectoryMSI;Encrypt=true"
//!
//! # Managed identity and service principals need the Azure provider
//! cargo run --example prelogin --features azure-identity
//! ```
//!
//! Retrying is left to the caller: the handshake reports every failure and
//! classifies it, and only transient failures are worth another attempt.

use std::time::Duration;

use mssql_client::{CallContext, Config, Connector, Error, LogFlags, NegotiatedEncryption};

const MAX_ATTEMPTS: u32 = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let conn_str = std::env::var("MSSQL_CONNECTION_STRING")
        .unwrap_or_else(|_| "Server=localhost;Encrypt=optional".to_string());
    let config = Config::from_connection_string(&conn_str)?
        .log_flags(LogFlags::ERRORS | LogFlags::DEBUG);

    println!("Connecting to {}:{}", config.host, config.port);
    println!("  workflow: {}", config.fed_auth.workflow());

    let connector = with_provider(Connector::new(config));
    let ctx = CallContext::new().with_timeout(Duration::from_secs(60));

    let mut attempt = 1;
    let connection = loop {
        match connector.connect(&ctx).await {
            Ok(connection) => break connection,
            Err(e) if e.is_transient() && attempt < MAX_ATTEMPTS => {
                println!("  attempt {attempt} failed ({e}), retrying");
                tokio::time::sleep(Duration::from_millis(250 * u64::from(attempt))).await;
                attempt += 1;
            }
            Err(e) => {
                report(&e);
                return Err(e.into());
            }
        }
    };

    let session = connection.session();
    let outcome = connection.outcome();
    println!("Pre-login complete");
    println!("  connection id: {}", session.connection_id());
    println!("  activity id:   {}", session.activity_id());
    if let Some(version) = outcome.server.version {
        println!("  server:        {version}");
    }
    println!(
        "  encryption:    {}",
        match outcome.encryption {
            NegotiatedEncryption::Off => "off",
            NegotiatedEncryption::On => "on",
            NegotiatedEncryption::Strict => "strict",
            NegotiatedEncryption::LoginOnly => "login only",
        }
    );
    if let Some(token) = &outcome.token {
        println!("  token expires: {:?}", token.expires_at());
    }

    Ok(())
}

#[cfg(feature = "azure-identity")]
fn with_provider(connector: Connector) -> Connector {
    connector.with_identity_provider(std::sync::Arc::new(mssql_auth::AzureIdentityProvider::new()))
}

#[cfg(not(feature = "azure-identity"))]
fn with_provider(connector: Connector) -> Connector {
    connector
}

fn report(e: &Error) {
    if e.is_configuration_error() {
        eprintln!("Fix the connection string: {e}");
    } else if e.is_credential_error() {
        eprintln!("The identity provider rejected the credentials: {e}");
    } else if e.is_protocol_error() {
        eprintln!("The server answered with unexpected data: {e}");
    } else {
        eprintln!("Connection failed: {e}");
    }
}
