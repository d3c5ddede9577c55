//! Standard controller layout
//!
//! Fixed index layouts for buttons and axes as reported by a controller in the
//! "standard" mapping. Raw positional indices are converted into these
//! identifiers exactly once, so nothing downstream treats a bare `usize` as a
//! named input.
//!
//! ```text
//!          [4]                       [5]
//!          [6]                       [7]
//!      [12]        [8] [16] [9]       [3]
//!  [14]    [15]                   [2]     [1]
//!      [13]     (10)        (11)      [0]
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use thiserror::Error;

/// Number of buttons in the standard layout
pub const BUTTON_COUNT: usize = 17;

/// Number of axes sampled: four stick axes plus two trigger axes
pub const AXIS_COUNT: usize = 6;

/// Index did not name anything in the standard layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("index {index} is outside the standard {kind} layout")]
pub struct LayoutIndexError {
    pub kind: &'static str,
    pub index: usize,
}

// Button positions of the standard mapping, in index order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandardButton {
    RightClusterBottom,
    RightClusterRight,
    RightClusterLeft,
    RightClusterTop,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    CenterLeft,
    CenterRight,
    LeftStick,
    RightStick,
    LeftClusterTop,
    LeftClusterBottom,
    LeftClusterLeft,
    LeftClusterRight,
    Center,
}

impl StandardButton {
    /// All buttons in index order
    pub const ALL: [StandardButton; BUTTON_COUNT] = [
        StandardButton::RightClusterBottom,
        StandardButton::RightClusterRight,
        StandardButton::RightClusterLeft,
        StandardButton::RightClusterTop,
        StandardButton::TopLeft,
        StandardButton::TopRight,
        StandardButton::BottomLeft,
        StandardButton::BottomRight,
        StandardButton::CenterLeft,
        StandardButton::CenterRight,
        StandardButton::LeftStick,
        StandardButton::RightStick,
        StandardButton::LeftClusterTop,
        StandardButton::LeftClusterBottom,
        StandardButton::LeftClusterLeft,
        StandardButton::LeftClusterRight,
        StandardButton::Center,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for StandardButton {
    type Error = LayoutIndexError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        StandardButton::ALL
            .get(index)
            .copied()
            .ok_or(LayoutIndexError {
                kind: "button",
                index,
            })
    }
}

impl Display for StandardButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StandardButton::RightClusterBottom => "right-cluster-bottom",
            StandardButton::RightClusterRight => "right-cluster-right",
            StandardButton::RightClusterLeft => "right-cluster-left",
            StandardButton::RightClusterTop => "right-cluster-top",
            StandardButton::TopLeft => "top-left",
            StandardButton::TopRight => "top-right",
            StandardButton::BottomLeft => "bottom-left",
            StandardButton::BottomRight => "bottom-right",
            StandardButton::CenterLeft => "center-left",
            StandardButton::CenterRight => "center-right",
            StandardButton::LeftStick => "left-stick-click",
            StandardButton::RightStick => "right-stick-click",
            StandardButton::LeftClusterTop => "left-cluster-top",
            StandardButton::LeftClusterBottom => "left-cluster-bottom",
            StandardButton::LeftClusterLeft => "left-cluster-left",
            StandardButton::LeftClusterRight => "left-cluster-right",
            StandardButton::Center => "center",
        };
        write!(f, "{}", name)
    }
}

// Stick axes of the standard mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardAxis {
    LeftStickHorizontal,
    LeftStickVertical,
    RightStickHorizontal,
    RightStickVertical,
}

impl StandardAxis {
    pub const ALL: [StandardAxis; 4] = [
        StandardAxis::LeftStickHorizontal,
        StandardAxis::LeftStickVertical,
        StandardAxis::RightStickHorizontal,
        StandardAxis::RightStickVertical,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for StandardAxis {
    type Error = LayoutIndexError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        StandardAxis::ALL
            .get(index)
            .copied()
            .ok_or(LayoutIndexError { kind: "axis", index })
    }
}

/// Analog triggers, reported as axes 4 and 5
///
/// Not part of the standard mapping, but widely exposed this way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Left,
    Right,
}

impl Trigger {
    /// Dispatch order
    pub const ALL: [Trigger; 2] = [Trigger::Left, Trigger::Right];

    /// Position in the raw axis array
    pub const fn axis_index(self) -> usize {
        match self {
            Trigger::Left => 4,
            Trigger::Right => 5,
        }
    }

    /// Position in the trigger flag arrays
    pub const fn slot(self) -> usize {
        match self {
            Trigger::Left => 0,
            Trigger::Right => 1,
        }
    }
}

impl Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Left => write!(f, "left-trigger"),
            Trigger::Right => write!(f, "right-trigger"),
        }
    }
}
