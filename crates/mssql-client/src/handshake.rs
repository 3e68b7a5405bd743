//! Pre-login handshake.
//!
//! The handshake writes the client's option block, reads the server's
//! answer, agrees on encryption and, when a federated workflow is
//! configured, acquires the bearer token that the login stage will send.
//!
//! It is strictly sequential and never retries. The transport is owned by
//! the handshake while it runs: on any failure, cancellation or timeout it
//! is dropped rather than handed back with a half-written frame.

use mssql_auth::{CallContext, CredentialToken, WorkflowDispatcher};
use tds_protocol::{
    EncryptionLevel, FedAuthFeature, OptionBlock, PacketType, PreLogin, ProtocolError,
};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::{Config, EncryptionPolicy};
use crate::error::{Error, Result};
use crate::logging::LogFlags;
use crate::session::{NegotiatedEncryption, Session};
use crate::state::HandshakeState;
use crate::transport;

/// Result of a completed handshake.
#[derive(Debug)]
pub struct HandshakeOutcome<T> {
    /// The transport, positioned after the pre-login response.
    pub transport: T,
    /// Options advertised by the server.
    pub server: PreLogin,
    /// Agreed encryption mode.
    pub encryption: NegotiatedEncryption,
    /// Bearer token for the login stage, when a workflow is configured.
    pub token: Option<CredentialToken>,
    /// FEDAUTH feature extension for LOGIN7, echoing the server's answer.
    pub fed_auth: Option<FedAuthFeature>,
}

/// Pre-login state machine for one connection attempt.
#[derive(Debug)]
pub struct PreLoginHandshake<'a> {
    config: &'a Config,
    session: &'a mut Session,
    dispatcher: &'a WorkflowDispatcher,
    state: HandshakeState,
}

impl<'a> PreLoginHandshake<'a> {
    /// Prepare a handshake. Nothing is sent until [`run`](Self::run).
    pub fn new(
        config: &'a Config,
        session: &'a mut Session,
        dispatcher: &'a WorkflowDispatcher,
    ) -> Self {
        Self {
            config,
            session,
            dispatcher,
            state: HandshakeState::Init,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Run the handshake over `transport`.
    ///
    /// Bounded by the configured login timeout in addition to any deadline
    /// on `ctx`. A handshake runs at most once.
    pub async fn run<T>(&mut self, ctx: &CallContext, transport: T) -> Result<HandshakeOutcome<T>>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        if self.state != HandshakeState::Init {
            return Err(Error::Config(format!(
                "pre-login handshake already ran (state: {})",
                self.state
            )));
        }

        let ctx = ctx.child().with_timeout(self.config.timeouts.login_timeout);
        match self.drive(&ctx, transport).await {
            Ok(outcome) => {
                self.transition(HandshakeState::Done);
                Ok(outcome)
            }
            Err(e) => {
                let failed_in = self.state;
                self.transition(HandshakeState::Aborted);
                self.session.log(
                    LogFlags::ERRORS,
                    format_args!("pre-login failed in state '{failed_in}': {e}"),
                );
                Err(e)
            }
        }
    }

    async fn drive<T>(&mut self, ctx: &CallContext, mut transport: T) -> Result<HandshakeOutcome<T>>
    where
        T: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let limits = self.session.transport();
        let feature = self.config.fed_auth.feature();
        let payload = self
            .session
            .prelogin_fields(self.config, feature.as_ref())?
            .encode()?;

        tracing::debug!(
            connection_id = %self.session.connection_id(),
            encryption = %self.config.encryption,
            fed_auth = feature.is_some(),
            "sending PreLogin"
        );
        ctx.run(transport::write_message(
            &mut transport,
            PacketType::PreLogin,
            &payload,
            limits.packet_size,
        ))
        .await?;
        self.transition(HandshakeState::OptionsSent);

        let response = ctx
            .run(transport::read_message(
                &mut transport,
                PacketType::TabularResult,
                limits.max_message_size,
            ))
            .await?;
        let server = PreLogin::from_options(&OptionBlock::decode(response)?)?;
        self.transition(HandshakeState::OptionsReceived);

        if let Some(ref version) = server.version {
            self.session.log(
                LogFlags::DEBUG,
                format_args!("server version {version}, encryption {:?}", server.encryption),
            );
        }

        let server_encryption = server
            .encryption
            .ok_or(ProtocolError::MissingOption("ENCRYPTION"))?;
        let encryption = negotiate_encryption(self.config.encryption, server_encryption)?;
        self.session.set_negotiated_encryption(encryption);
        self.transition(HandshakeState::EncryptionAgreed);
        tracing::debug!(
            policy = %self.config.encryption,
            server = ?server_encryption,
            negotiated = ?encryption,
            "encryption agreed"
        );

        let (token, fed_auth) = if self.config.fed_auth.is_federated() {
            self.transition(HandshakeState::FedAuthRequested);
            let token = self
                .dispatcher
                .provide_token(
                    ctx,
                    &self.config.fed_auth,
                    &self.config.token_scope,
                    &self.config.token_authority,
                )
                .await?;
            self.transition(HandshakeState::TokenAcquired);
            let fed_auth =
                feature.map(|f| f.with_server_response(server.fed_auth_required, server.nonce));
            (Some(token), fed_auth)
        } else {
            (None, None)
        };

        Ok(HandshakeOutcome {
            transport,
            server,
            encryption,
            token,
            fed_auth,
        })
    }

    fn transition(&mut self, next: HandshakeState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid pre-login transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!(from = %self.state, to = %next, "pre-login state");
        self.state = next;
    }
}

/// Agree on an encryption mode or reject the server's answer.
///
/// A strict policy requires a strict server. A client that refuses
/// encryption fails against a server that insists on it, and a client that
/// mandates encryption fails against a server that cannot provide it. Every
/// other combination follows the server's answer: OFF protects only the
/// login exchange.
pub fn negotiate_encryption(
    policy: EncryptionPolicy,
    server: EncryptionLevel,
) -> Result<NegotiatedEncryption> {
    use EncryptionLevel as Level;

    let violation = || Error::EncryptionPolicyViolation { policy, server };
    match (policy, server) {
        (EncryptionPolicy::Strict, Level::Strict) => Ok(NegotiatedEncryption::Strict),
        (EncryptionPolicy::Strict, _) => Err(violation()),
        (EncryptionPolicy::Disabled, Level::On | Level::Required | Level::Strict) => {
            Err(violation())
        }
        (EncryptionPolicy::Disabled, Level::Off | Level::NotSupported) => {
            Ok(NegotiatedEncryption::Off)
        }
        (EncryptionPolicy::Mandatory, Level::NotSupported) => Err(violation()),
        (EncryptionPolicy::Optional, Level::NotSupported) => Ok(NegotiatedEncryption::Off),
        (_, Level::Strict) => Ok(NegotiatedEncryption::Strict),
        (_, Level::Off) => Ok(NegotiatedEncryption::LoginOnly),
        (_, Level::On | Level::Required) => Ok(NegotiatedEncryption::On),
    }
}
