//! Connection establishment.
//!
//! [`Connector`] dials the server, creates a fresh [`Session`] per attempt
//! and runs the [`PreLoginHandshake`]. What it returns is ready for the
//! login stage: the negotiated transport, the agreed encryption mode and,
//! for federated workflows, the bearer token.

use std::sync::Arc;

use mssql_auth::{CallContext, IdentityProvider, WorkflowDispatcher};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::handshake::{HandshakeOutcome, PreLoginHandshake};
use crate::logging::ContextLogger;
use crate::session::{Session, TransportDefaults};

/// Opens connections for one configuration.
///
/// A connector can be shared between tasks; every attempt gets its own
/// session and identifiers.
#[derive(Clone)]
pub struct Connector {
    config: Config,
    dispatcher: WorkflowDispatcher,
    logger: Option<Arc<dyn ContextLogger>>,
}

impl Connector {
    /// Create a connector without an identity provider.
    ///
    /// Only the pre-supplied token workflow can complete until
    /// [`with_identity_provider`](Self::with_identity_provider) is called.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            dispatcher: WorkflowDispatcher::without_provider(),
            logger: None,
        }
    }

    /// Use `provider` for token acquisition.
    #[must_use]
    pub fn with_identity_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.dispatcher = WorkflowDispatcher::new(provider);
        self
    }

    /// Send session log lines to `logger`.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn ContextLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// The configuration connections are opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Dial the configured server over TCP and run pre-login.
    pub async fn connect(&self, ctx: &CallContext) -> Result<Connection<TcpStream>> {
        tracing::info!(
            host = %self.config.host,
            port = self.config.port,
            instance = ?self.config.instance,
            "connecting to SQL Server"
        );

        let addr = format!("{}:{}", self.config.host, self.config.port);
        let connect_timeout = self.config.timeouts.connect_timeout;
        let tcp_stream = ctx
            .run(async {
                timeout(connect_timeout, TcpStream::connect(&addr))
                    .await
                    .map_err(|_| Error::Timeout)?
                    .map_err(Error::Io)
            })
            .await?;

        // Enable TCP nodelay for better latency
        tcp_stream.set_nodelay(true)?;

        self.handshake(ctx, tcp_stream).await
    }

    /// Run pre-login over an already established transport.
    pub async fn handshake<T>(&self, ctx: &CallContext, transport: T) -> Result<Connection<T>>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut session = Session::new(
            TransportDefaults::from_config(&self.config),
            self.logger.clone(),
            &self.config,
        );
        tracing::debug!(
            connection_id = %session.connection_id(),
            activity_id = %session.activity_id(),
            workflow = %self.config.fed_auth.workflow(),
            "starting pre-login"
        );

        let outcome = PreLoginHandshake::new(&self.config, &mut session, &self.dispatcher)
            .run(ctx, transport)
            .await?;

        Ok(Connection { session, outcome })
    }
}

impl std::fmt::Debug for Connector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connector")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .field("has_logger", &self.logger.is_some())
            .finish()
    }
}

/// A connection that has completed pre-login.
#[derive(Debug)]
pub struct Connection<T> {
    session: Session,
    outcome: HandshakeOutcome<T>,
}

impl<T> Connection<T> {
    /// The session this connection belongs to.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// What pre-login produced.
    #[must_use]
    pub fn outcome(&self) -> &HandshakeOutcome<T> {
        &self.outcome
    }

    /// Split into session and handshake outcome for the login stage.
    #[must_use]
    pub fn into_parts(self) -> (Session, HandshakeOutcome<T>) {
        (self.session, self.outcome)
    }
}
