use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

pub mod entities;
pub mod utils;

/// Denotes which edges of a vertex a phase iterates over. Can be incoming, outgoing or both.
///
/// When read from configuration a direction may be given by name (`"in"`, `"out"`, `"both"`)
/// or by its numeric code (`1`, `2`, `3`).
#[derive(Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Debug, Serialize, Deserialize)]
#[serde(try_from = "DirectionRepr", into = "&'static str")]
pub enum Direction {
    OUT,
    IN,
    BOTH,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DirectionError {
    #[error("Unknown edge direction '{0}', expected one of in, out, both")]
    UnknownName(String),
    #[error("Unknown edge direction code {0}, expected 1 (in), 2 (out) or 3 (both)")]
    UnknownCode(i64),
}

impl Direction {
    pub fn code(&self) -> u8 {
        match self {
            Direction::IN => 1,
            Direction::OUT => 2,
            Direction::BOTH => 3,
        }
    }

    pub fn from_code(code: i64) -> Result<Self, DirectionError> {
        match code {
            1 => Ok(Direction::IN),
            2 => Ok(Direction::OUT),
            3 => Ok(Direction::BOTH),
            other => Err(DirectionError::UnknownCode(other)),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::IN => "in",
            Direction::OUT => "out",
            Direction::BOTH => "both",
        }
    }

    pub fn includes_in(&self) -> bool {
        matches!(self, Direction::IN | Direction::BOTH)
    }

    pub fn includes_out(&self) -> bool {
        matches!(self, Direction::OUT | Direction::BOTH)
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(code) = trimmed.parse::<i64>() {
            return Direction::from_code(code);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "in" | "incoming" => Ok(Direction::IN),
            "out" | "outgoing" => Ok(Direction::OUT),
            "both" | "all" => Ok(Direction::BOTH),
            _ => Err(DirectionError::UnknownName(s.to_owned())),
        }
    }
}

impl From<Direction> for &'static str {
    fn from(value: Direction) -> Self {
        value.as_str()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DirectionRepr {
    Code(i64),
    Name(String),
}

impl TryFrom<DirectionRepr> for Direction {
    type Error = DirectionError;

    fn try_from(value: DirectionRepr) -> Result<Self, Self::Error> {
        match value {
            DirectionRepr::Code(code) => Direction::from_code(code),
            DirectionRepr::Name(name) => name.parse(),
        }
    }
}
