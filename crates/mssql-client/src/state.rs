//! Pre-login handshake states.
//!
//! ## State Transitions
//!
//! ```text
//! Init -> OptionsSent (client options written)
//! OptionsSent -> OptionsReceived (server options decoded)
//! OptionsReceived -> EncryptionAgreed (policy check passed)
//! EncryptionAgreed -> FedAuthRequested (a workflow is configured)
//! FedAuthRequested -> TokenAcquired (dispatcher returned a token)
//! EncryptionAgreed | TokenAcquired -> Done
//! any non-terminal state -> Aborted
//! ```

use std::fmt;

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandshakeState {
    /// Nothing sent yet.
    Init,
    /// The client option block was written.
    OptionsSent,
    /// The server option block was read and decoded.
    OptionsReceived,
    /// Encryption mode agreed.
    EncryptionAgreed,
    /// A token is being acquired.
    FedAuthRequested,
    /// A token was acquired.
    TokenAcquired,
    /// Handshake complete.
    Done,
    /// Handshake failed; the transport has been dropped.
    Aborted,
}

impl HandshakeState {
    /// Check whether the state is final.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }

    /// Check whether `next` may follow this state.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        use HandshakeState::*;
        matches!(
            (self, next),
            (Init, OptionsSent)
                | (OptionsSent, OptionsReceived)
                | (OptionsReceived, EncryptionAgreed)
                | (EncryptionAgreed, FedAuthRequested)
                | (FedAuthRequested, TokenAcquired)
                | (EncryptionAgreed | TokenAcquired, Done)
                | (
                    Init | OptionsSent
                        | OptionsReceived
                        | EncryptionAgreed
                        | FedAuthRequested
                        | TokenAcquired,
                    Aborted
                )
        )
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Init => "init",
            Self::OptionsSent => "options sent",
            Self::OptionsReceived => "options received",
            Self::EncryptionAgreed => "encryption agreed",
            Self::FedAuthRequested => "fedauth requested",
            Self::TokenAcquired => "token acquired",
            Self::Done => "done",
            Self::Aborted => "aborted",
        })
    }
}
