//! openclaw-commands: chat command handling for tool overrides.
//!
//! A thin bridge between the chat dispatch loop and the session override
//! store. The dispatcher calls [`is_tools_reset_command`] on each message
//! body and, on a match, hands the message to [`handle_tools_reset`]; the
//! returned outcome tells it what to reply and that the message is consumed.

use openclaw_storage::SessionOverrideStore;
use tracing::debug;

/// The reset command, matched case-sensitively after trimming.
pub const TOOLS_RESET_COMMAND: &str = "/tools:reset";

/// Whether a message body invokes the reset command.
pub fn is_tools_reset_command(body: &str) -> bool {
    body.trim() == TOOLS_RESET_COMMAND
}

/// The result of handling a chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Reply to send back, if any.
    pub reply: Option<String>,
    /// Whether the dispatcher should stop routing this message.
    pub handled: bool,
}

/// A reset request assembled by the dispatcher.
pub struct ResetRequest<'a> {
    /// The override store, absent when storage failed to initialize.
    pub store: Option<&'a SessionOverrideStore>,
    /// The session the message belongs to, absent outside a session.
    pub session_key: Option<&'a str>,
    /// Whether the sender passed the dispatcher's authorization check.
    pub sender_authorized: bool,
}

/// Handle `/tools:reset`.
///
/// Unauthorized senders get no reply. Without an active session the mutation
/// is refused with an explanation. Storage errors propagate; in every case
/// the message is consumed.
pub async fn handle_tools_reset(request: ResetRequest<'_>) -> anyhow::Result<CommandOutcome> {
    if !request.sender_authorized {
        debug!("Ignoring /tools:reset from unauthorized sender");
        return Ok(CommandOutcome {
            reply: None,
            handled: true,
        });
    }

    let (Some(store), Some(session_key)) = (request.store, request.session_key) else {
        return Ok(CommandOutcome {
            reply: Some("Cannot reset tool overrides: no active session.".to_string()),
            handled: true,
        });
    };

    let had_overrides = store.reset(session_key).await?;
    let reply = if had_overrides {
        "Tool overrides cleared. Tools restored to config baseline."
    } else {
        "No tool overrides were active."
    };
    Ok(CommandOutcome {
        reply: Some(reply.to_string()),
        handled: true,
    })
}
