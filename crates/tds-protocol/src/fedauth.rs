//! Federated authentication feature extension.
//!
//! A client that intends to authenticate with a bearer token advertises
//! `FEDAUTHREQUIRED` during pre-login and then sends a FEDAUTH feature
//! extension in LOGIN7. The extension data starts with an option byte
//! `(library << 1) | echo`, followed by library-specific data:
//!
//! - security token library: `u32` LE byte length, the UTF-16LE token, and
//!   the server nonce when one was received
//! - ADAL library: one workflow byte

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::ProtocolError;
use crate::prelogin::NONCE_LEN;
use crate::prelude::*;

/// Feature id of the FEDAUTH extension in LOGIN7.
pub const FEATURE_ID_FEDAUTH: u8 = 0x02;

/// Which on-wire feature-extension format the client uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FedAuthLibrary {
    /// Token acquired by the client before login.
    SecurityToken = 0x01,
    /// Token acquired through the legacy ADAL negotiation.
    Adal = 0x02,
    /// No federated authentication.
    Reserved = 0x7F,
}

impl FedAuthLibrary {
    /// Raw library byte.
    #[must_use]
    pub const fn to_byte(self) -> u8 {
        self as u8
    }
}

/// ADAL workflow byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AdalWorkflow {
    /// User name and password (also used for service principals).
    Password = 0x01,
    /// Windows integrated authentication.
    Integrated = 0x02,
    /// Managed service identity.
    Msi = 0x03,
}

/// FEDAUTH feature extension descriptor.
#[derive(Clone, PartialEq, Eq)]
pub struct FedAuthFeature {
    /// Feature-extension format.
    pub library: FedAuthLibrary,
    /// Echo of the server's `FEDAUTHREQUIRED` pre-login flag.
    pub fed_auth_echo: bool,
    /// Workflow byte for the ADAL library.
    pub adal_workflow: Option<AdalWorkflow>,
    /// Bearer token for the security token library.
    pub token: Option<String>,
    /// Nonce returned by the server in pre-login.
    pub nonce: Option<[u8; NONCE_LEN]>,
}

impl FedAuthFeature {
    /// Feature for the security token library.
    #[must_use]
    pub fn security_token() -> Self {
        Self {
            library: FedAuthLibrary::SecurityToken,
            fed_auth_echo: false,
            adal_workflow: None,
            token: None,
            nonce: None,
        }
    }

    /// Feature for the ADAL library with the given workflow.
    #[must_use]
    pub fn adal(workflow: AdalWorkflow) -> Self {
        Self {
            library: FedAuthLibrary::Adal,
            fed_auth_echo: false,
            adal_workflow: Some(workflow),
            token: None,
            nonce: None,
        }
    }

    /// Attach the acquired token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Record the server's pre-login answer.
    #[must_use]
    pub fn with_server_response(
        mut self,
        fed_auth_required: bool,
        nonce: Option<[u8; NONCE_LEN]>,
    ) -> Self {
        self.fed_auth_echo = fed_auth_required;
        self.nonce = nonce;
        self
    }

    /// Encode the feature data (without the feature id and length prefix).
    pub fn encode_data(&self) -> Result<Bytes, ProtocolError> {
        let mut buf = BytesMut::new();
        buf.put_u8((self.library.to_byte() << 1) | u8::from(self.fed_auth_echo));

        match self.library {
            FedAuthLibrary::SecurityToken => {
                let token = self
                    .token
                    .as_deref()
                    .ok_or(ProtocolError::MissingOption("FEDAUTH token"))?;
                let utf16: Vec<u8> = token.encode_utf16().flat_map(u16::to_le_bytes).collect();
                buf.put_u32_le(utf16.len() as u32);
                buf.put_slice(&utf16);
                if let Some(nonce) = self.nonce {
                    buf.put_slice(&nonce);
                }
            }
            FedAuthLibrary::Adal => {
                let workflow = self
                    .adal_workflow
                    .ok_or(ProtocolError::MissingOption("ADAL workflow"))?;
                buf.put_u8(workflow as u8);
            }
            FedAuthLibrary::Reserved => {}
        }

        Ok(buf.freeze())
    }

    /// Encode the complete feature-extension entry: id, `u32` LE length, data.
    pub fn encode(&self) -> Result<Bytes, ProtocolError> {
        let data = self.encode_data()?;
        let mut buf = BytesMut::with_capacity(5 + data.len());
        buf.put_u8(FEATURE_ID_FEDAUTH);
        buf.put_u32_le(data.len() as u32);
        buf.put_slice(&data);
        Ok(buf.freeze())
    }
}

impl core::fmt::Debug for FedAuthFeature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FedAuthFeature")
            .field("library", &self.library)
            .field("fed_auth_echo", &self.fed_auth_echo)
            .field("adal_workflow", &self.adal_workflow)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("nonce", &self.nonce.is_some())
            .finish()
    }
}
