use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Declares a menu value type: a fixed set of known values plus an `Other`
/// fallback that keeps the raw text, so a value the front end invented still
/// deserializes and can be rejected later with the offending value attached.
macro_rules! menu_value {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $text,)+
                    $name::Other(raw) => raw.as_str(),
                }
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, $name::Other(_))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                match value {
                    $($text => $name::$variant,)+
                    other => $name::Other(other.to_string()),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match $name::from(value.as_str()) {
                    $name::Other(_) => $name::Other(value),
                    known => known,
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(raw) => raw,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok($name::from(s))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

menu_value!(ActionKind {
    Up => "up",
    Down => "down",
    Middle => "middle",
    Quarter => "quarter",
    ThreeQuarter => "threequarter",
    HorizontalRight => "horizontal_right",
    Vertical => "vertical",
    HorizontalLeft => "horizontal_left",
    Horizontal => "horizontal",
    Open => "open",
    Close => "close",
    Colorize => "colorize",
});

menu_value!(SideKind {
    Left => "left",
    Right => "right",
});

impl SideKind {
    pub fn side(&self) -> Option<Side> {
        match self {
            SideKind::Left => Some(Side::Left),
            SideKind::Right => Some(Side::Right),
            SideKind::Other(_) => None,
        }
    }
}

impl From<Side> for SideKind {
    fn from(side: Side) -> Self {
        match side {
            Side::Left => SideKind::Left,
            Side::Right => SideKind::Right,
        }
    }
}

menu_value!(PositionKind {
    Left => "left",
    Middle => "middle",
    Right => "right",
});

/// Addressable sub-systems of the suit. Each one owns its own topic namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Arm,
    Hand,
    Helmet,
    Head,
    Eyes,
    Energy,
    /// Colors the energy indicator and the eyes with one command.
    #[serde(alias = "energyEyes")]
    EnergyEyes,
}

impl EntityKind {
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Arm,
        EntityKind::Hand,
        EntityKind::Helmet,
        EntityKind::Head,
        EntityKind::Eyes,
        EntityKind::Energy,
        EntityKind::EnergyEyes,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Arm => "arm",
            EntityKind::Hand => "hand",
            EntityKind::Helmet => "helmet",
            EntityKind::Head => "head",
            EntityKind::Eyes => "eyes",
            EntityKind::Energy => "energy",
            EntityKind::EnergyEyes => "energy_eyes",
        }
    }

    pub fn requires_side(self) -> bool {
        matches!(self, EntityKind::Arm | EntityKind::Hand)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "arm" => Ok(EntityKind::Arm),
            "hand" => Ok(EntityKind::Hand),
            "helmet" => Ok(EntityKind::Helmet),
            "head" => Ok(EntityKind::Head),
            "eyes" => Ok(EntityKind::Eyes),
            "energy" => Ok(EntityKind::Energy),
            "energy_eyes" | "energyEyes" => Ok(EntityKind::EnergyEyes),
            other => Err(format!("unknown entity '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Right, Side::Left];

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Side::Left),
            "right" => Ok(Side::Right),
            other => Err(format!("unknown side '{other}'")),
        }
    }
}

/// One user-triggered block execution, as delivered by the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalCommand {
    pub entity: EntityKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<SideKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionKind>,
    /// `#`-prefixed hex color as produced by the color picker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl LogicalCommand {
    pub fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            action: None,
            side: None,
            position: None,
            color: None,
        }
    }

    pub fn with_action(mut self, action: impl Into<ActionKind>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_side(mut self, side: impl Into<SideKind>) -> Self {
        self.side = Some(side.into());
        self
    }

    pub fn with_position(mut self, position: impl Into<PositionKind>) -> Self {
        self.position = Some(position.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_action_keeps_raw_text() {
        let action: ActionKind = serde_json::from_str("\"wave\"").expect("action");
        assert_eq!(action, ActionKind::Other("wave".into()));
        assert!(!action.is_known());
        assert_eq!(serde_json::to_string(&action).expect("json"), "\"wave\"");
    }

    #[test]
    fn unknown_side_deserializes_for_later_rejection() {
        let cmd: LogicalCommand =
            serde_json::from_str(r#"{"entity":"hand","side":"middle","action":"vertical"}"#)
                .expect("command");
        assert_eq!(cmd.side, Some(SideKind::Other("middle".into())));
        assert_eq!(cmd.side.and_then(|side| side.side()), None);
        assert_eq!(SideKind::from(Side::Left).side(), Some(Side::Left));
    }

    #[test]
    fn command_accepts_camel_case_combined_entity() {
        let cmd: LogicalCommand =
            serde_json::from_str(r##"{"entity":"energyEyes","color":"#112233"}"##)
                .expect("command");
        assert_eq!(cmd.entity, EntityKind::EnergyEyes);
        assert_eq!(cmd.color.as_deref(), Some("#112233"));
    }

    #[test]
    fn command_parses_side_and_action() {
        let cmd: LogicalCommand =
            serde_json::from_str(r#"{"entity":"arm","side":"right","action":"threequarter"}"#)
                .expect("command");
        assert_eq!(
            cmd,
            LogicalCommand::new(EntityKind::Arm)
                .with_side(Side::Right)
                .with_action(ActionKind::ThreeQuarter)
        );
    }
}
