//! Pre-login handshake tests against a scripted in-memory server.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mssql_auth::{
    AuthError, ClientCredentialRequest, ManagedIdentityRequest, PasswordGrant,
};
use mssql_client::transport::{read_message, write_message};
use mssql_client::{
    CallContext, Config, Connector, CredentialToken, EncryptionPolicy, Error, FedAuthWorkflow,
    HandshakeState, IdentityProvider, NegotiatedEncryption, PreLoginHandshake, Session,
    TransportDefaults, WorkflowDispatcher,
};
use tds_protocol::{
    EncryptionLevel, FedAuthLibrary, PacketType, PreLogin, PreLoginVersion, guid,
};
use tokio::io::{AsyncWriteExt, DuplexStream};
use uuid::Uuid;

// ============================================================================
// Scripted server
// ============================================================================

fn server_prelogin(encryption: EncryptionLevel) -> PreLogin {
    PreLogin::new()
        .with_version(PreLoginVersion {
            major: 16,
            minor: 0,
            build: 4135,
            sub_build: 4,
        })
        .with_encryption(encryption)
        .with_mars(false)
}

/// Read the client's pre-login and answer with `response`.
async fn answer(server: &mut DuplexStream, response: &PreLogin) -> PreLogin {
    let request = read_message(server, PacketType::PreLogin, 64 * 1024)
        .await
        .unwrap();
    let client = PreLogin::decode(request).unwrap();
    write_message(
        server,
        PacketType::TabularResult,
        &response.encode().unwrap(),
        4096,
    )
    .await
    .unwrap();
    client
}

#[derive(Default)]
struct MockProvider {
    reject: bool,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    fn record(&self, call: String) -> Result<CredentialToken, AuthError> {
        self.calls.lock().unwrap().push(call);
        if self.reject {
            Err(AuthError::Credential("AADSTS7000215: invalid client secret".into()))
        } else {
            Ok(CredentialToken::new("provider-token", None))
        }
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    async fn password_grant(&self, grant: PasswordGrant<'_>) -> Result<CredentialToken, AuthError> {
        self.record(format!("password:{}", grant.user))
    }

    async fn client_credential(
        &self,
        request: ClientCredentialRequest<'_>,
    ) -> Result<CredentialToken, AuthError> {
        self.record(format!("client:{}", request.client_id))
    }

    async fn managed_identity(
        &self,
        request: ManagedIdentityRequest<'_>,
    ) -> Result<CredentialToken, AuthError> {
        self.record(format!("msi:{:?}", request.identity))
    }
}

fn session_for(config: &Config) -> Session {
    Session::new(TransportDefaults::from_config(config), None, config)
}

// ============================================================================
// Successful handshakes
// ============================================================================

#[tokio::test]
async fn test_plain_handshake() {
    let config = Config::new().encryption(EncryptionPolicy::Optional);
    let mut session = session_for(&config);
    let dispatcher = WorkflowDispatcher::without_provider();
    let (client_io, mut server_io) = tokio::io::duplex(64 * 1024);

    let server = tokio::spawn(async move {
        answer(&mut server_io, &server_prelogin(EncryptionLevel::Off)).await
    });

    let mut handshake = PreLoginHandshake::new(&config, &mut session, &dispatcher);
    let outcome = handshake.run(&CallContext::new(), client_io).await.unwrap();
    assert_eq!(handshake.state(), HandshakeState::Done);

    assert_eq!(outcome.encryption, NegotiatedEncryption::LoginOnly);
    assert!(outcome.token.is_none());
    assert!(outcome.fed_auth.is_none());
    assert_eq!(outcome.server.version.unwrap().major, 16);

    let client = server.await.unwrap();
    assert_eq!(client.encryption, Some(EncryptionLevel::Off));
    assert_eq!(client.thread_id, Some(0));
    assert!(!client.fed_auth_required);

    assert_eq!(session.negotiated_encryption(), Some(NegotiatedEncryption::LoginOnly));
    let trace_id = client.trace_id.unwrap();
    assert_eq!(
        Uuid::from_bytes(guid::from_wire(trace_id.connection_id)),
        session.connection_id()
    );
    assert_eq!(Uuid::from_bytes(trace_id.activity_id), session.activity_id());
}

#[tokio::test]
async fn test_presupplied_token_handshake() {
    let config = Config::from_connection_string(
        "encrypt=true;fedauth=ActiveDirectoryServicePrincipalAccessToken;password=eyJ0eXAi.token",
    )
    .unwrap();
    let mut session = session_for(&config);
    let dispatcher = WorkflowDispatcher::without_provider();
    let (client_io, mut server_io) = tokio::io::duplex(64 * 1024);

    let mut response = server_prelogin(EncryptionLevel::Required).with_fed_auth_required(true);
    response.nonce = Some([7u8; 32]);
    let server = tokio::spawn(async move { answer(&mut server_io, &response).await });

    let mut handshake = PreLoginHandshake::new(&config, &mut session, &dispatcher);
    let outcome = handshake.run(&CallContext::new(), client_io).await.unwrap();

    let client = server.await.unwrap();
    assert!(client.fed_auth_required);
    assert_eq!(client.encryption, Some(EncryptionLevel::On));

    assert_eq!(outcome.encryption, NegotiatedEncryption::On);
    let token = outcome.token.unwrap();
    assert_eq!(token.secret(), "eyJ0eXAi.token");
    assert!(token.expires_at().is_none());

    let fed_auth = outcome.fed_auth.unwrap();
    assert_eq!(fed_auth.library, FedAuthLibrary::SecurityToken);
    assert!(fed_auth.fed_auth_echo);
    assert_eq!(fed_auth.nonce, Some([7u8; 32]));
}

#[tokio::test]
async fn test_managed_identity_uses_provider() {
    let config = Config::from_connection_string(
        "encrypt=strict;fedauth=ActiveDirectoryMSI;user id=5d3c2b1a-client",
    )
    .unwrap();
    assert_eq!(
        config.fed_auth.workflow(),
        FedAuthWorkflow::ManagedIdentityWithClientId
    );

    let provider = Arc::new(MockProvider::default());
    let dispatcher = WorkflowDispatcher::new(provider.clone());
    let mut session = session_for(&config);
    let (client_io, mut server_io) = tokio::io::duplex(64 * 1024);

    let server = tokio::spawn(async move {
        let response = server_prelogin(EncryptionLevel::Strict).with_fed_auth_required(true);
        answer(&mut server_io, &response).await
    });

    let mut handshake = PreLoginHandshake::new(&config, &mut session, &dispatcher);
    let outcome = handshake.run(&CallContext::new(), client_io).await.unwrap();
    server.await.unwrap();

    assert_eq!(outcome.encryption, NegotiatedEncryption::Strict);
    assert_eq!(outcome.token.unwrap().secret(), "provider-token");
    assert_eq!(
        provider.calls.lock().unwrap().as_slice(),
        ["msi:ClientId(\"5d3c2b1a-client\")"]
    );
    let fed_auth = outcome.fed_auth.unwrap();
    assert_eq!(fed_auth.library, FedAuthLibrary::Adal);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_strict_policy_is_never_downgraded() {
    let config = Config::new().encryption(EncryptionPolicy::Strict);
    let mut session = session_for(&config);
    let dispatcher = WorkflowDispatcher::without_provider();
    let (client_io, mut server_io) = tokio::io::duplex(64 * 1024);

    tokio::spawn(async move {
        answer(&mut server_io, &server_prelogin(EncryptionLevel::Off)).await
    });

    let mut handshake = PreLoginHandshake::new(&config, &mut session, &dispatcher);
    let err = handshake
        .run(&CallContext::new(), client_io)
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            Error::EncryptionPolicyViolation {
                policy: EncryptionPolicy::Strict,
                server: EncryptionLevel::Off,
            }
        ),
        "{err:?}"
    );
    assert_eq!(handshake.state(), HandshakeState::Aborted);
    assert_eq!(session.negotiated_encryption(), None);
}

#[tokio::test]
async fn test_disabled_encryption_against_required_server() {
    let config = Config::new().encryption(EncryptionPolicy::Disabled);
    let mut session = session_for(&config);
    let dispatcher = WorkflowDispatcher::without_provider();
    let (client_io, mut server_io) = tokio::io::duplex(64 * 1024);

    tokio::spawn(async move {
        answer(&mut server_io, &server_prelogin(EncryptionLevel::Required)).await
    });

    let err = PreLoginHandshake::new(&config, &mut session, &dispatcher)
        .run(&CallContext::new(), client_io)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EncryptionPolicyViolation { .. }), "{err:?}");
}

#[tokio::test]
async fn test_malformed_response() {
    let config = Config::new();
    let mut session = session_for(&config);
    let dispatcher = WorkflowDispatcher::without_provider();
    let (client_io, mut server_io) = tokio::io::duplex(64 * 1024);

    tokio::spawn(async move {
        read_message(&mut server_io, PacketType::PreLogin, 64 * 1024)
            .await
            .unwrap();
        // One option header and no terminator
        write_message(
            &mut server_io,
            PacketType::TabularResult,
            &[0x00, 0x00, 0x05, 0x00, 0x06],
            4096,
        )
        .await
        .unwrap();
        server_io
    });

    let mut handshake = PreLoginHandshake::new(&config, &mut session, &dispatcher);
    let err = handshake
        .run(&CallContext::new(), client_io)
        .await
        .unwrap_err();

    assert!(err.is_protocol_error(), "{err:?}");
    assert!(!err.is_transient());
    assert_eq!(handshake.state(), HandshakeState::Aborted);
}

#[tokio::test]
async fn test_response_without_encryption_option() {
    let config = Config::new();
    let mut session = session_for(&config);
    let dispatcher = WorkflowDispatcher::without_provider();
    let (client_io, mut server_io) = tokio::io::duplex(64 * 1024);

    tokio::spawn(async move {
        let response = PreLogin::new().with_mars(false);
        answer(&mut server_io, &response).await
    });

    let err = PreLoginHandshake::new(&config, &mut session, &dispatcher)
        .run(&CallContext::new(), client_io)
        .await
        .unwrap_err();
    assert!(err.is_protocol_error(), "{err:?}");
}

#[tokio::test]
async fn test_server_closes_connection() {
    let config = Config::new();
    let mut session = session_for(&config);
    let dispatcher = WorkflowDispatcher::without_provider();
    let (client_io, mut server_io) = tokio::io::duplex(64 * 1024);

    tokio::spawn(async move {
        read_message(&mut server_io, PacketType::PreLogin, 64 * 1024)
            .await
            .unwrap();
        server_io.shutdown().await.unwrap();
        drop(server_io);
    });

    let err = PreLoginHandshake::new(&config, &mut session, &dispatcher)
        .run(&CallContext::new(), client_io)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed), "{err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_provider_rejection_is_surfaced_unchanged() {
    let config = Config::from_connection_string(
        "encrypt=true;fedauth=ActiveDirectoryServicePrincipal;user id=appid@tenantid;password=bad",
    )
    .unwrap();
    let provider = Arc::new(MockProvider {
        reject: true,
        ..MockProvider::default()
    });
    let dispatcher = WorkflowDispatcher::new(provider.clone());
    let mut session = session_for(&config);
    let (client_io, mut server_io) = tokio::io::duplex(64 * 1024);

    tokio::spawn(async move {
        let response = server_prelogin(EncryptionLevel::On).with_fed_auth_required(true);
        let client = answer(&mut server_io, &response).await;
        (client, server_io)
    });

    let mut handshake = PreLoginHandshake::new(&config, &mut session, &dispatcher);
    let err = handshake
        .run(&CallContext::new(), client_io)
        .await
        .unwrap_err();

    assert!(err.is_credential_error(), "{err:?}");
    assert!(matches!(err, Error::Authentication(AuthError::Credential(_))));
    assert_eq!(handshake.state(), HandshakeState::Aborted);
    assert_eq!(provider.calls.lock().unwrap().as_slice(), ["client:appid"]);
}

#[tokio::test]
async fn test_missing_provider_is_configuration_error() {
    let config =
        Config::from_connection_string("encrypt=true;fedauth=ActiveDirectoryManagedIdentity")
            .unwrap();
    let dispatcher = WorkflowDispatcher::without_provider();
    let mut session = session_for(&config);
    let (client_io, mut server_io) = tokio::io::duplex(64 * 1024);

    tokio::spawn(async move {
        let client = answer(&mut server_io, &server_prelogin(EncryptionLevel::On)).await;
        (client, server_io)
    });

    let err = PreLoginHandshake::new(&config, &mut session, &dispatcher)
        .run(&CallContext::new(), client_io)
        .await
        .unwrap_err();
    assert!(err.is_configuration_error(), "{err:?}");
}

// ============================================================================
// Cancellation and timeouts
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_login_timeout() {
    let config = Config::new().login_timeout(Duration::from_secs(2));
    let mut session = session_for(&config);
    let dispatcher = WorkflowDispatcher::without_provider();
    // The server never answers but keeps the stream open
    let (client_io, _server_io) = tokio::io::duplex(64 * 1024);

    let mut handshake = PreLoginHandshake::new(&config, &mut session, &dispatcher);
    let err = handshake
        .run(&CallContext::new(), client_io)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout), "{err:?}");
    assert!(err.is_transient());
    assert_eq!(handshake.state(), HandshakeState::Aborted);
}

#[tokio::test]
async fn test_cancellation_while_waiting_for_server() {
    let config = Config::new();
    let mut session = session_for(&config);
    let dispatcher = WorkflowDispatcher::without_provider();
    let (client_io, mut server_io) = tokio::io::duplex(64 * 1024);
    let ctx = CallContext::new();

    let canceller = ctx.clone();
    tokio::spawn(async move {
        read_message(&mut server_io, PacketType::PreLogin, 64 * 1024)
            .await
            .unwrap();
        canceller.cancel();
        // Keep the stream open so only cancellation can end the read
        tokio::time::sleep(Duration::from_secs(60)).await;
        drop(server_io);
    });

    let mut handshake = PreLoginHandshake::new(&config, &mut session, &dispatcher);
    let err = handshake.run(&ctx, client_io).await.unwrap_err();

    assert!(matches!(err, Error::Cancelled), "{err:?}");
    assert_eq!(handshake.state(), HandshakeState::Aborted);
}

#[tokio::test]
async fn test_handshake_runs_once() {
    let config = Config::new().encryption(EncryptionPolicy::Optional);
    let mut session = session_for(&config);
    let dispatcher = WorkflowDispatcher::without_provider();
    let (client_io, mut server_io) = tokio::io::duplex(64 * 1024);

    tokio::spawn(async move {
        answer(&mut server_io, &server_prelogin(EncryptionLevel::NotSupported)).await
    });

    let mut handshake = PreLoginHandshake::new(&config, &mut session, &dispatcher);
    let outcome = handshake.run(&CallContext::new(), client_io).await.unwrap();
    assert_eq!(outcome.encryption, NegotiatedEncryption::Off);

    let (second_io, _peer) = tokio::io::duplex(1024);
    let err = handshake
        .run(&CallContext::new(), second_io)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(handshake.state(), HandshakeState::Done);
}

// ============================================================================
// Connector
// ============================================================================

#[tokio::test]
async fn test_connector_over_tcp() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let request = read_message(&mut stream, PacketType::PreLogin, 64 * 1024)
            .await
            .unwrap();
        let client = PreLogin::decode(request).unwrap();
        let response = server_prelogin(EncryptionLevel::On).encode().unwrap();
        write_message(&mut stream, PacketType::TabularResult, &response, 4096)
            .await
            .unwrap();
        client
    });

    let config = Config::new().host("127.0.0.1").port(port).instance("SQLEXPRESS");
    let connection = Connector::new(config)
        .connect(&CallContext::new())
        .await
        .unwrap();

    let client = server.await.unwrap();
    assert_eq!(client.instance.as_deref(), Some("SQLEXPRESS"));
    assert_eq!(connection.outcome().encryption, NegotiatedEncryption::On);
    assert_eq!(
        connection.session().negotiated_encryption(),
        Some(NegotiatedEncryption::On)
    );
}

#[tokio::test]
async fn test_connector_sessions_are_fresh() {
    let connector = Connector::new(Config::new().encryption(EncryptionPolicy::Optional));
    let mut connection_ids = Vec::new();

    for _ in 0..2 {
        let (client_io, mut server_io) = tokio::io::duplex(64 * 1024);
        tokio::spawn(async move {
            answer(&mut server_io, &server_prelogin(EncryptionLevel::Off)).await
        });
        let connection = connector
            .handshake(&CallContext::new(), client_io)
            .await
            .unwrap();
        connection_ids.push(connection.session().connection_id());
    }

    assert_ne!(connection_ids[0], connection_ids[1]);
}
