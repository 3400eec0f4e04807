//! Line protocol definitions
//!
//! Client → server lines are parsed into a [`Command`]; every piece of
//! server → client text is a [`Notice`] rendered through `Display`.

use std::fmt;

use crate::error::AppError;
use crate::types::RoomName;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/rooms`: list registered rooms with member counts
    ListRooms,
    /// `/leave`: go back to the default room
    Leave,
    /// `/quit`: disconnect
    Quit,
    /// `/join <room>`: move to a room, creating it on first use
    Join(RoomName),
    /// Anything else is chat text for the current room
    Say(String),
}

impl Command {
    /// Parse one input line.
    ///
    /// The keyword is everything before the first space. Unknown
    /// slash-commands fall through to [`Command::Say`] and are sent as
    /// literal text.
    pub fn parse(line: &str) -> Result<Self, AppError> {
        let (keyword, rest) = line.split_once(' ').unwrap_or((line, ""));

        match keyword {
            "/rooms" => Ok(Command::ListRooms),
            "/leave" => Ok(Command::Leave),
            "/quit" => Ok(Command::Quit),
            "/join" => {
                let args: Vec<&str> = rest.split_whitespace().collect();
                match args.as_slice() {
                    [room] => Ok(Command::Join(RoomName::from(*room))),
                    _ => Err(AppError::InvalidArgumentCount {
                        command: "/join",
                        expected: 1,
                        found: args.len(),
                    }),
                }
            }
            _ => Ok(Command::Say(line.to_string())),
        }
    }
}

/// Server → client text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Banner and login prompt written before the name is read
    Greeting { server: String },
    /// Fresh room prompt
    Prompt(RoomName),
    /// Written to a user when a room accepts them
    Entering(RoomName),
    /// Written to a user when a room lets them go
    Leaving(RoomName),
    /// One broadcast line delivered to a room member
    Broadcast { text: String, room: RoomName },
    /// `/rooms` output
    RoomList {
        rooms: Vec<(RoomName, usize)>,
        current: RoomName,
    },
    /// `/quit` acknowledgement
    Quitting,
    /// Inline error report
    Error { message: String, room: RoomName },
}

impl Notice {
    /// Build an inline error report from a user-facing error.
    pub fn error(err: &AppError, room: &RoomName) -> Self {
        Notice::Error {
            message: err.to_string(),
            room: room.clone(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Greeting { server } => write!(f, "Welcome to {}\nLogin Name: ", server),
            Notice::Prompt(room) => write!(f, "[{}]> ", room),
            Notice::Entering(room) => write!(f, "Entering {}...\n[{}]> ", room, room),
            Notice::Leaving(room) => write!(f, "Leaving {}...\n", room),
            Notice::Broadcast { text, room } => write!(f, "{}\n[{}]> ", text, room),
            Notice::RoomList { rooms, current } => {
                writeln!(f, "Active rooms:")?;
                for (name, count) in rooms {
                    writeln!(f, "/{} ({})", name, count)?;
                }
                write!(f, "[{}]> ", current)
            }
            Notice::Quitting => f.write_str("Quitting...\n"),
            Notice::Error { message, room } => write!(f, "{}\n[{}]> ", message, room),
        }
    }
}

/// `Welcome <name>!`
pub fn welcome(name: &str) -> String {
    format!("Welcome {}!", name)
}

/// `<name> has left.`
pub fn has_left(name: &str) -> String {
    format!("{} has left.", name)
}

/// `<name> has quit.`
pub fn has_quit(name: &str) -> String {
    format!("{} has quit.", name)
}

/// `<name>> <text>`
pub fn chat_line(name: &str, text: &str) -> String {
    format!("{}> {}", name, text)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::rooms("/rooms", Command::ListRooms)]
    #[case::rooms_extra_args("/rooms please", Command::ListRooms)]
    #[case::leave("/leave", Command::Leave)]
    #[case::quit("/quit", Command::Quit)]
    #[case::join("/join rust", Command::Join(RoomName::from("rust")))]
    #[case::join_extra_spaces("/join   rust", Command::Join(RoomName::from("rust")))]
    #[case::join_trailing_space("/join rust ", Command::Join(RoomName::from("rust")))]
    #[case::plain("hello there", Command::Say("hello there".to_string()))]
    #[case::empty("", Command::Say(String::new()))]
    #[case::unknown_slash("/shrug ok", Command::Say("/shrug ok".to_string()))]
    #[case::keyword_needs_exact_match("/roomsx", Command::Say("/roomsx".to_string()))]
    fn parse_command(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(Command::parse(line).unwrap(), expected);
    }

    #[rstest]
    #[case::no_room("/join", 0)]
    #[case::blank_room("/join ", 0)]
    #[case::two_rooms("/join a b", 2)]
    fn parse_join_argument_count(#[case] line: &str, #[case] found_args: usize) {
        match Command::parse(line) {
            Err(AppError::InvalidArgumentCount {
                command,
                expected,
                found,
            }) => {
                assert_eq!(command, "/join");
                assert_eq!(expected, 1);
                assert_eq!(found, found_args);
            }
            other => panic!("unexpected parse result: {:?}", other),
        }
    }

    #[test]
    fn test_banner_text() {
        let room = RoomName::from("rust");
        assert_eq!(Notice::Prompt(room.clone()).to_string(), "[rust]> ");
        assert_eq!(
            Notice::Entering(room.clone()).to_string(),
            "Entering rust...\n[rust]> "
        );
        assert_eq!(Notice::Leaving(room).to_string(), "Leaving rust...\n");
        assert_eq!(
            Notice::Greeting {
                server: "goChat".to_string()
            }
            .to_string(),
            "Welcome to goChat\nLogin Name: "
        );
    }

    #[test]
    fn test_broadcast_is_followed_by_prompt() {
        let notice = Notice::Broadcast {
            text: chat_line("alice", "hello"),
            room: RoomName::from("R"),
        };
        assert_eq!(notice.to_string(), "alice> hello\n[R]> ");
    }

    #[test]
    fn test_room_list_format() {
        let notice = Notice::RoomList {
            rooms: vec![(RoomName::from("lobby"), 2), (RoomName::from("rust"), 1)],
            current: RoomName::from("lobby"),
        };
        assert_eq!(
            notice.to_string(),
            "Active rooms:\n/lobby (2)\n/rust (1)\n[lobby]> "
        );
    }

    #[test]
    fn test_error_notice() {
        let room = RoomName::from("lobby");
        let notice = Notice::error(&AppError::AlreadyInRoom(room.clone()), &room);
        assert_eq!(
            notice.to_string(),
            "You are already in the room.\n[lobby]> "
        );
    }

    #[test]
    fn test_broadcast_text_builders() {
        assert_eq!(welcome("bob"), "Welcome bob!");
        assert_eq!(has_left("bob"), "bob has left.");
        assert_eq!(has_quit("bob"), "bob has quit.");
    }
}
