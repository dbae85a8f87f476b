//! Administrator direct-message grammar.
//!
//! ```text
//! .<ticket-id> open
//! .<ticket-id> close
//! .msg <text>
//! ```

use crate::model::TicketId;

const REPLY_KEYWORD: &str = ".msg";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    Open(TicketId),
    Close(TicketId),
    Reply(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("Please provide a message: .msg <text>")]
    EmptyReply,
}

impl AdminCommand {
    /// Parse an administrator's direct message.
    ///
    /// `Ok(None)` means the text is not a command and should be ignored.
    /// `.msg` is matched before ticket commands, so `.msg open` is a reply.
    pub fn parse(text: &str) -> Result<Option<Self>, CommandError> {
        let text = text.trim();

        if let Some(rest) = text.strip_prefix(REPLY_KEYWORD) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                let message = rest.trim();
                if message.is_empty() {
                    return Err(CommandError::EmptyReply);
                }
                return Ok(Some(AdminCommand::Reply(message.to_string())));
            }
        }

        let mut tokens = text.split_whitespace();
        let (Some(target), Some(action), None) = (tokens.next(), tokens.next(), tokens.next()) else {
            return Ok(None);
        };
        let Some(ticket) = target.strip_prefix('.').filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let command = if action.eq_ignore_ascii_case("open") {
            AdminCommand::Open(TicketId::new(ticket))
        } else if action.eq_ignore_ascii_case("close") {
            AdminCommand::Close(TicketId::new(ticket))
        } else {
            return Ok(None);
        };
        Ok(Some(command))
    }
}
