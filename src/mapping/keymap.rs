//! Keymap: which synthetic key each signal produces
//!
//! [`KeymapConfig`] is the serializable form read from the config file, with
//! one optional key per button and trigger. It is validated and frozen into a
//! [`Keymap`] once at startup; nothing mutates the keymap afterwards.
//!
//! A `[buttons]` or `[triggers]` table given in the file replaces the whole
//! table, so leaving an entry out unbinds it. A table left out of the file
//! keeps the default bindings.
//!
//! Stick directions have no entries of their own. They share the entries of
//! the left-cluster buttons, so a d-pad and a stick push produce the same key.

use crate::controller::layout::{StandardButton, Trigger, BUTTON_COUNT};
use crate::mapping::error::MappingError;
use crate::mapping::normalize::StickDirection;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use tracing::{debug, info};

/// Synthetic key to emit for a signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDescriptor {
    pub key: String,
}

impl KeyDescriptor {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl Display for KeyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Key per button, `None` meaning unbound
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ButtonKeys {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_cluster_bottom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_cluster_right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_cluster_left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_cluster_top: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom_left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom_right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_stick: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_stick: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_cluster_top: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_cluster_bottom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_cluster_left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_cluster_right: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center: Option<String>,
}

impl ButtonKeys {
    pub fn get(&self, button: StandardButton) -> Option<&str> {
        let entry = match button {
            StandardButton::RightClusterBottom => &self.right_cluster_bottom,
            StandardButton::RightClusterRight => &self.right_cluster_right,
            StandardButton::RightClusterLeft => &self.right_cluster_left,
            StandardButton::RightClusterTop => &self.right_cluster_top,
            StandardButton::TopLeft => &self.top_left,
            StandardButton::TopRight => &self.top_right,
            StandardButton::BottomLeft => &self.bottom_left,
            StandardButton::BottomRight => &self.bottom_right,
            StandardButton::CenterLeft => &self.center_left,
            StandardButton::CenterRight => &self.center_right,
            StandardButton::LeftStick => &self.left_stick,
            StandardButton::RightStick => &self.right_stick,
            StandardButton::LeftClusterTop => &self.left_cluster_top,
            StandardButton::LeftClusterBottom => &self.left_cluster_bottom,
            StandardButton::LeftClusterLeft => &self.left_cluster_left,
            StandardButton::LeftClusterRight => &self.left_cluster_right,
            StandardButton::Center => &self.center,
        };
        entry.as_deref()
    }
}

/// Key per trigger, `None` meaning unbound
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TriggerKeys {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
}

impl TriggerKeys {
    pub fn get(&self, trigger: Trigger) -> Option<&str> {
        match trigger {
            Trigger::Left => self.left.as_deref(),
            Trigger::Right => self.right.as_deref(),
        }
    }
}

/// Serializable keymap configuration
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct KeymapConfig {
    pub buttons: ButtonKeys,
    pub triggers: TriggerKeys,
}

impl Default for KeymapConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

fn bound(key: &str) -> Option<String> {
    Some(key.to_string())
}

impl KeymapConfig {
    /// Arrows on the d-pad and left stick, letters on face buttons, shoulders
    /// and triggers. Rear triggers-as-buttons, stick clicks and the center
    /// button stay unbound.
    pub fn default_config() -> Self {
        KeymapConfig {
            buttons: ButtonKeys {
                right_cluster_bottom: bound("z"),
                right_cluster_right: bound("x"),
                right_cluster_left: bound("s"),
                right_cluster_top: bound("d"),
                top_left: bound("w"),
                top_right: bound("r"),
                bottom_left: None,
                bottom_right: None,
                center_left: bound("c"),
                center_right: bound("v"),
                left_stick: None,
                right_stick: None,
                left_cluster_top: bound("ArrowUp"),
                left_cluster_bottom: bound("ArrowDown"),
                left_cluster_left: bound("ArrowLeft"),
                left_cluster_right: bound("ArrowRight"),
                center: None,
            },
            triggers: TriggerKeys {
                left: bound("e"),
                right: bound("t"),
            },
        }
    }

    pub fn validate(&self) -> Result<(), MappingError> {
        for button in StandardButton::ALL {
            if let Some(key) = self.buttons.get(button) {
                validate_key(&button.to_string(), key)?;
            }
        }
        for trigger in Trigger::ALL {
            if let Some(key) = self.triggers.get(trigger) {
                validate_key(&trigger.to_string(), key)?;
            }
        }
        Ok(())
    }
}

fn validate_key(signal: &str, key: &str) -> Result<(), MappingError> {
    if key.is_empty() {
        return Err(MappingError::InvalidKey {
            signal: signal.to_string(),
            reason: "key identifier is empty".to_string(),
        });
    }
    Ok(())
}

/// Frozen lookup table from signal to key
#[derive(Debug, Clone, PartialEq)]
pub struct Keymap {
    buttons: [Option<KeyDescriptor>; BUTTON_COUNT],
    triggers: [Option<KeyDescriptor>; 2],
}

impl Keymap {
    pub fn from_config(config: &KeymapConfig) -> Result<Self, MappingError> {
        config.validate()?;

        let keymap = Self::freeze(config);
        info!("Loaded keymap with {} bound signals", keymap.bound_count());
        for button in StandardButton::ALL {
            debug!("  {} -> {:?}", button, keymap.button(button).map(|k| &k.key));
        }
        Ok(keymap)
    }

    fn freeze(config: &KeymapConfig) -> Self {
        Self {
            buttons: StandardButton::ALL
                .map(|button| config.buttons.get(button).map(KeyDescriptor::new)),
            triggers: Trigger::ALL
                .map(|trigger| config.triggers.get(trigger).map(KeyDescriptor::new)),
        }
    }

    pub fn button(&self, button: StandardButton) -> Option<&KeyDescriptor> {
        self.buttons[button.index()].as_ref()
    }

    pub fn stick_direction(&self, direction: StickDirection) -> Option<&KeyDescriptor> {
        self.button(direction.as_button())
    }

    pub fn trigger(&self, trigger: Trigger) -> Option<&KeyDescriptor> {
        self.triggers[trigger.slot()].as_ref()
    }

    pub fn bound_count(&self) -> usize {
        self.buttons.iter().chain(self.triggers.iter()).flatten().count()
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::freeze(&KeymapConfig::default_config())
    }
}
