use cp_core::ContractViolation;

/// Why a pairing handler stopped without finishing its session.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("pairing session stopped: {0}")]
    Contract(#[from] ContractViolation),

    /// Every sender was dropped while the session still waited for input.
    #[error("pairing session mailbox closed before the session finished")]
    MailboxClosed,
}
