//! Server configuration
//!
//! Parsed from the command line (and `ROOM_CHAT_ADDR` for the listen
//! address) with clap.

use std::num::NonZeroUsize;

use clap::Parser;

use crate::error::AppError;

/// Default listen address
pub const DEFAULT_ADDR: &str = "0.0.0.0:6000";

/// Default room name
pub const DEFAULT_ROOM: &str = "lobby";

/// Default login banner name
pub const DEFAULT_SERVER_NAME: &str = "goChat";

/// Default mailbox queue length
pub const DEFAULT_MAILBOX_CAPACITY: NonZeroUsize = NonZeroUsize::MIN.saturating_add(31);

/// Multi-room line-based chat server
#[derive(Debug, Clone, Parser)]
#[command(name = "room_chat", version, about)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(env = "ROOM_CHAT_ADDR", default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// Room every user starts in and returns to with `/leave`
    #[arg(long, default_value = DEFAULT_ROOM)]
    pub default_room: String,

    /// Name shown in the login banner
    #[arg(long, default_value = DEFAULT_SERVER_NAME)]
    pub server_name: String,

    /// Queue length of each room's mailbox and of the dispatcher's
    #[arg(long, default_value_t = DEFAULT_MAILBOX_CAPACITY)]
    pub mailbox_capacity: NonZeroUsize,
}

impl ServerConfig {
    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), AppError> {
        if self.default_room.is_empty() {
            return Err(AppError::Config("default room name is empty".to_string()));
        }
        if self.default_room.chars().any(char::is_whitespace) {
            return Err(AppError::Config(format!(
                "default room name '{}' contains whitespace",
                self.default_room
            )));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: DEFAULT_ADDR.to_string(),
            default_room: DEFAULT_ROOM.to_string(),
            server_name: DEFAULT_SERVER_NAME.to_string(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_defaults_from_empty_command_line() {
        let config = ServerConfig::try_parse_from(["room_chat"]).unwrap();

        assert_eq!(config.default_room, "lobby");
        assert_eq!(config.server_name, "goChat");
        assert_eq!(config.mailbox_capacity.get(), 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_matches_parser() {
        let config = ServerConfig::default();

        assert_eq!(config.addr, DEFAULT_ADDR);
        assert_eq!(config.mailbox_capacity.get(), 32);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = ServerConfig::try_parse_from([
            "room_chat",
            "127.0.0.1:7000",
            "--default-room",
            "hall",
            "--mailbox-capacity",
            "4",
        ])
        .unwrap();

        assert_eq!(config.addr, "127.0.0.1:7000");
        assert_eq!(config.default_room, "hall");
        assert_eq!(config.mailbox_capacity.get(), 4);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert!(ServerConfig::try_parse_from(["room_chat", "--mailbox-capacity", "0"]).is_err());
    }

    #[rstest]
    #[case::empty("")]
    #[case::space("main hall")]
    fn test_bad_default_room(#[case] name: &str) {
        let config = ServerConfig {
            default_room: name.to_string(),
            ..ServerConfig::default()
        };

        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }
}
