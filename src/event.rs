//! Events crossing the boundary from the external event source into the
//! aggregator, plus the line protocol the binary's stdin driver speaks.

use std::str::FromStr;

use crate::aggregator::Status;

/// One observed change for a tracked subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    /// A subject's presence state changed.
    Status { subject: String, status: Status },
    /// A subject's current activity changed; `None` means it ended.
    Activity {
        subject: String,
        activity: Option<String>,
    },
    /// A direct message arrived.
    DirectMessage { sender: String, body: String },
}

/// Errors from parsing a protocol line.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    EmptyLine,
    UnknownCommand(String),
    UnknownStatus(String),
    MissingField(&'static str),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::EmptyLine => write!(f, "empty line"),
            ParseError::UnknownCommand(cmd) => write!(f, "unknown command '{cmd}'"),
            ParseError::UnknownStatus(status) => write!(f, "unknown status '{status}'"),
            ParseError::MissingField(field) => write!(f, "missing field '{field}'"),
        }
    }
}

impl std::error::Error for ParseError {}

impl FromStr for Status {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "online" => Ok(Status::Online),
            "idle" => Ok(Status::Idle),
            "dnd" | "donotdisturb" => Ok(Status::DoNotDisturb),
            "offline" => Ok(Status::Offline),
            "unknown" => Ok(Status::Unknown),
            other => Err(ParseError::UnknownStatus(other.to_string())),
        }
    }
}

impl PresenceEvent {
    /// Parse one protocol line:
    ///
    /// ```text
    /// status <subject> <online|idle|dnd|offline>
    /// activity <subject> [name…]        (no name: activity ended)
    /// dm <sender> <text…>
    /// ```
    pub fn parse_line(line: &str) -> Result<Self, ParseError> {
        let mut parts = line.trim().splitn(3, char::is_whitespace);
        let command = parts.next().filter(|c| !c.is_empty()).ok_or(ParseError::EmptyLine)?;

        match command {
            "status" => {
                let subject = parts.next().ok_or(ParseError::MissingField("subject"))?;
                let status = parts
                    .next()
                    .ok_or(ParseError::MissingField("status"))?
                    .trim()
                    .parse()?;
                Ok(PresenceEvent::Status {
                    subject: subject.to_string(),
                    status,
                })
            }
            "activity" => {
                let subject = parts.next().ok_or(ParseError::MissingField("subject"))?;
                let activity = parts
                    .next()
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(String::from);
                Ok(PresenceEvent::Activity {
                    subject: subject.to_string(),
                    activity,
                })
            }
            "dm" => {
                let sender = parts.next().ok_or(ParseError::MissingField("sender"))?;
                let body = parts.next().ok_or(ParseError::MissingField("text"))?;
                Ok(PresenceEvent::DirectMessage {
                    sender: sender.to_string(),
                    body: body.trim().to_string(),
                })
            }
            other => Err(ParseError::UnknownCommand(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(
            PresenceEvent::parse_line("status alice online"),
            Ok(PresenceEvent::Status {
                subject: "alice".into(),
                status: Status::Online,
            })
        );
        assert_eq!(
            PresenceEvent::parse_line("status bob dnd"),
            Ok(PresenceEvent::Status {
                subject: "bob".into(),
                status: Status::DoNotDisturb,
            })
        );
    }

    #[test]
    fn test_parse_activity_with_and_without_name() {
        assert_eq!(
            PresenceEvent::parse_line("activity alice Dwarf Fortress"),
            Ok(PresenceEvent::Activity {
                subject: "alice".into(),
                activity: Some("Dwarf Fortress".into()),
            })
        );
        assert_eq!(
            PresenceEvent::parse_line("activity alice"),
            Ok(PresenceEvent::Activity {
                subject: "alice".into(),
                activity: None,
            })
        );
    }

    #[test]
    fn test_parse_direct_message_keeps_body() {
        assert_eq!(
            PresenceEvent::parse_line("dm mallory hello there agent"),
            Ok(PresenceEvent::DirectMessage {
                sender: "mallory".into(),
                body: "hello there agent".into(),
            })
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(PresenceEvent::parse_line("   "), Err(ParseError::EmptyLine));
        assert_eq!(
            PresenceEvent::parse_line("ping alice"),
            Err(ParseError::UnknownCommand("ping".into()))
        );
        assert_eq!(
            PresenceEvent::parse_line("status alice levitating"),
            Err(ParseError::UnknownStatus("levitating".into()))
        );
        assert_eq!(
            PresenceEvent::parse_line("status alice"),
            Err(ParseError::MissingField("status"))
        );
    }
}
