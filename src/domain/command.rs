//! Slash commands interpreted by the hub instead of being relayed.

/// A command a client may send when commands are enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    /// List the available commands.
    Help,
    /// Leave the chat.
    Quit,
    /// Anything else starting with `/`.
    Unknown(String),
}

/// Name and one-line description of each supported command.
pub const COMMANDS: &[(&str, &str)] = &[("/help", "Print this help"), ("/quit", "Quit")];

impl ChatCommand {
    /// Parses `text` as a command. Returns `None` for ordinary chat text.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if !trimmed.starts_with('/') {
            return None;
        }
        let name = trimmed.split_whitespace().next().unwrap_or(trimmed);
        Some(match name {
            "/help" => Self::Help,
            "/quit" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        })
    }

    /// Text written back to the sender for `/help`.
    #[must_use]
    pub fn help_text() -> String {
        let mut out = String::from("Usage:\r\n");
        for (name, desc) in COMMANDS {
            out.push_str(&format!("{name} - {desc}\r\n"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(ChatCommand::parse("hello /help"), None);
    }

    #[test]
    fn known_commands_parse_with_surrounding_whitespace() {
        assert_eq!(ChatCommand::parse("  /help\r\n"), Some(ChatCommand::Help));
        assert_eq!(ChatCommand::parse("/quit now"), Some(ChatCommand::Quit));
    }

    #[test]
    fn unknown_command_keeps_its_name() {
        assert_eq!(
            ChatCommand::parse("/nick bob"),
            Some(ChatCommand::Unknown("/nick".to_string()))
        );
    }

    #[test]
    fn help_lists_every_command() {
        let help = ChatCommand::help_text();
        for (name, _) in COMMANDS {
            assert!(help.contains(name));
        }
    }
}
