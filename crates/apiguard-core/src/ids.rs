//! Gateway group identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A gateway group identifier.
///
/// Groups partition gateway instances and their routing rules. On the wire a
/// group id is a string of exactly one character.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GroupId(char);

impl GroupId {
    /// Create a group id from its character.
    #[must_use]
    pub const fn new(id: char) -> Self {
        Self(id)
    }

    /// Return the underlying character.
    #[must_use]
    pub const fn as_char(self) -> char {
        self.0
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GroupId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(Self(c)),
            _ => Err(CoreError::InvalidGroupId(s.to_string())),
        }
    }
}

impl TryFrom<String> for GroupId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<GroupId> for String {
    fn from(id: GroupId) -> Self {
        id.0.to_string()
    }
}

impl From<char> for GroupId {
    fn from(c: char) -> Self {
        Self(c)
    }
}
