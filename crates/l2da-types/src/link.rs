//! Member link state and the transmit-capable predicate.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Administrative state of a member link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminState {
    #[default]
    Down,
    Up,
}

impl AdminState {
    pub const fn is_up(&self) -> bool {
        matches!(self, AdminState::Up)
    }
}

impl fmt::Display for AdminState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminState::Up => write!(f, "up"),
            AdminState::Down => write!(f, "down"),
        }
    }
}

impl FromStr for AdminState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(AdminState::Up),
            "down" => Ok(AdminState::Down),
            _ => Err(ParseError::InvalidAdminState(s.to_string())),
        }
    }
}

/// Carrier (link-layer) state of a member link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperState {
    #[default]
    Down,
    Up,
    /// Carrier lost, waiting for the down-delay to expire.
    Fail,
    /// Carrier seen, waiting for the up-delay to expire.
    Back,
}

impl OperState {
    /// Only a settled `Up` counts; `Back` is still in its up-delay.
    pub const fn is_up(&self) -> bool {
        matches!(self, OperState::Up)
    }
}

impl fmt::Display for OperState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperState::Up => write!(f, "up"),
            OperState::Down => write!(f, "down"),
            OperState::Fail => write!(f, "fail"),
            OperState::Back => write!(f, "back"),
        }
    }
}

impl FromStr for OperState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "up" => Ok(OperState::Up),
            "down" => Ok(OperState::Down),
            "fail" => Ok(OperState::Fail),
            "back" => Ok(OperState::Back),
            _ => Err(ParseError::InvalidOperState(s.to_string())),
        }
    }
}

/// Snapshot of everything that decides whether a member link may transmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct LinkState {
    pub admin: AdminState,
    pub oper: OperState,
    /// Whether the aggregate currently treats the link as an active member.
    pub active: bool,
}

impl LinkState {
    /// Admin up, carrier up and active.
    pub const UP: LinkState = LinkState {
        admin: AdminState::Up,
        oper: OperState::Up,
        active: true,
    };

    pub const fn new(admin: AdminState, oper: OperState, active: bool) -> Self {
        Self {
            admin,
            oper,
            active,
        }
    }

    /// Administratively up AND link-state up AND an active member.
    pub const fn can_transmit(&self) -> bool {
        self.admin.is_up() && self.oper.is_up() && self.active
    }

    /// Returns a copy with the carrier state replaced.
    pub const fn with_oper(self, oper: OperState) -> Self {
        Self { oper, ..self }
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "admin {} oper {}{}",
            self.admin,
            self.oper,
            if self.active { "" } else { " (inactive)" }
        )
    }
}
