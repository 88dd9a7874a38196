//! Navigation command language.
//!
//! A command string is a program over `=<>+-`, executed left to right until
//! one primitive lands on a record.

use oxide_cursor_core::StatementKind;

use crate::error::{CursorError, Result};

/// Where a cursor stands relative to its result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorState {
    /// Not attached to a record; fields form an insert buffer.
    #[default]
    Detached,
    /// Current and shadow records hold a fetched row.
    OnRecord,
    /// Moved before the first matching record.
    BeforeFirst,
    /// Moved past the last matching record.
    AfterLast,
    /// The current key no longer identifies a known row.
    Unknown,
}

/// One navigation primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavCommand {
    /// `=`: re-read the current key under the filters.
    Refresh,
    /// `>`: next matching record.
    Next,
    /// `<`: previous matching record.
    Previous,
    /// `+`: first matching record.
    First,
    /// `-`: last matching record.
    Last,
}

impl NavCommand {
    /// Parses one command character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '=' => Some(Self::Refresh),
            '>' => Some(Self::Next),
            '<' => Some(Self::Previous),
            '+' => Some(Self::First),
            '-' => Some(Self::Last),
            _ => None,
        }
    }

    /// The command character.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Refresh => '=',
            Self::Next => '>',
            Self::Previous => '<',
            Self::First => '+',
            Self::Last => '-',
        }
    }

    /// Statement executed for this primitive.
    #[must_use]
    pub const fn statement_kind(self) -> StatementKind {
        match self {
            Self::Refresh => StatementKind::Here,
            Self::Next => StatementKind::Forwards,
            Self::Previous => StatementKind::Backwards,
            Self::First => StatementKind::First,
            Self::Last => StatementKind::Last,
        }
    }

    /// Whether the primitive starts from the current key.
    #[must_use]
    pub const fn needs_anchor(self) -> bool {
        matches!(self, Self::Refresh | Self::Next | Self::Previous)
    }

    /// State after the primitive finds nothing.
    #[must_use]
    pub const fn miss_state(self) -> CursorState {
        match self {
            Self::Refresh => CursorState::Unknown,
            Self::Next | Self::Last => CursorState::AfterLast,
            Self::Previous | Self::First => CursorState::BeforeFirst,
        }
    }
}

/// A validated navigation command string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavProgram {
    commands: Vec<NavCommand>,
}

impl NavProgram {
    /// Validates the whole string before anything runs.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::InvalidNavigationCommand`] with the first
    /// character outside `=<>+-`.
    pub fn parse(source: &str) -> Result<Self> {
        let commands = source
            .chars()
            .map(|c| NavCommand::from_char(c).ok_or(CursorError::InvalidNavigationCommand(c)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { commands })
    }

    /// Primitives in execution order.
    #[must_use]
    pub fn commands(&self) -> &[NavCommand] {
        &self.commands
    }

    /// Whether the program has no primitives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
