//! Inbound line classification.
//!
//! Recognition is exact and case-sensitive:
//!
//! | Input              | Command                  |
//! |--------------------|--------------------------|
//! | `\who`             | [`Command::ListUsers`]   |
//! | `\rename|<name>`   | [`Command::Rename`]      |
//! | `\rename...` else  | [`Command::Malformed`]   |
//! | anything else      | [`Command::Broadcast`]   |

const WHO: &str = "\\who";
const RENAME: &str = "\\rename";
const RENAME_SEPARATOR: char = '|';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every connected identity and display name.
    ListUsers,
    /// Change this session's display name.
    Rename(String),
    /// Publish the line verbatim to every session.
    Broadcast(String),
    /// Recognized command with unusable arguments.
    Malformed(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        if line == WHO {
            return Self::ListUsers;
        }

        let Some(rest) = line.strip_prefix(RENAME) else {
            return Self::Broadcast(line.to_string());
        };

        match rest.strip_prefix(RENAME_SEPARATOR) {
            None => Self::Malformed(format!(
                "expected {RENAME}{RENAME_SEPARATOR}<newName>"
            )),
            Some("") => Self::Malformed("new name is empty".to_string()),
            Some(name) => Self::Rename(name.to_string()),
        }
    }

    /// Static label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ListUsers => "who",
            Self::Rename(_) => "rename",
            Self::Broadcast(_) => "message",
            Self::Malformed(_) => "malformed",
        }
    }
}
