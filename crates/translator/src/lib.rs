//! Maps block-level commands onto bus topics and payloads.
//!
//! Translation is pure: the same [`LogicalCommand`] always yields the same
//! messages, and a rejected command yields none at all.

use std::{
    str::FromStr,
    sync::{Arc, OnceLock},
};

use serde::{Deserialize, Serialize};
use shared::{
    domain::{ActionKind, EntityKind, LogicalCommand, Side},
    error::{CommandField, TranslateError},
    protocol::{command, CommandPayload, NormalizedMessage, Topic},
};

pub mod calibration;
mod catalog;

pub use calibration::{
    Calibration, CalibrationError, CalibrationTable, HandCalibration, HandCommand,
};
pub use catalog::EntityCatalog;

/// What to do with a color that is not six hex digits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorPolicy {
    /// Reject with [`TranslateError::MalformedColor`].
    #[default]
    Strict,
    /// Forward whatever is left after dropping the `#`.
    Passthrough,
}

impl FromStr for ColorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(ColorPolicy::Strict),
            "passthrough" => Ok(ColorPolicy::Passthrough),
            other => Err(format!("unknown color policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Translator {
    calibration: Arc<Calibration>,
    color_policy: ColorPolicy,
}

impl Default for Translator {
    fn default() -> Self {
        Self::new(Calibration::default(), ColorPolicy::default())
    }
}

/// Translates with the current hardware revision and strict colors.
pub fn translate(cmd: &LogicalCommand) -> Result<Vec<NormalizedMessage>, TranslateError> {
    static DEFAULT: OnceLock<Translator> = OnceLock::new();
    DEFAULT.get_or_init(Translator::default).translate(cmd)
}

impl Translator {
    pub fn new(calibration: Calibration, color_policy: ColorPolicy) -> Self {
        Self {
            calibration: Arc::new(calibration),
            color_policy,
        }
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn revision(&self) -> &str {
        &self.calibration.revision
    }

    pub fn color_policy(&self) -> ColorPolicy {
        self.color_policy
    }

    /// Returns one message per addressed entity, in publish order. Only the
    /// combined `energy_eyes` command yields more than one.
    pub fn translate(
        &self,
        cmd: &LogicalCommand,
    ) -> Result<Vec<NormalizedMessage>, TranslateError> {
        match cmd.entity {
            EntityKind::Arm => self.arm(cmd).map(|message| vec![message]),
            EntityKind::Hand => self.hand(cmd).map(|message| vec![message]),
            EntityKind::Helmet => helmet(cmd).map(|message| vec![message]),
            EntityKind::Head => self.head(cmd).map(|message| vec![message]),
            EntityKind::Eyes | EntityKind::Energy => {
                let rgb = self.rgb(cmd)?;
                Ok(vec![colorize(cmd.entity, rgb)])
            }
            EntityKind::EnergyEyes => {
                let rgb = self.rgb(cmd)?;
                Ok(vec![
                    colorize(EntityKind::Energy, rgb.clone()),
                    colorize(EntityKind::Eyes, rgb),
                ])
            }
        }
    }

    fn arm(&self, cmd: &LogicalCommand) -> Result<NormalizedMessage, TranslateError> {
        let side = required_side(cmd)?;
        let action = required_action(cmd)?;
        let topic = |name: &str| Topic::for_command(EntityKind::Arm, Some(side), name);

        match action {
            ActionKind::Up | ActionKind::Down => Ok(NormalizedMessage::new(
                topic(action.as_str()),
                CommandPayload::bare(),
            )),
            other => {
                let position = lookup(
                    &self.calibration.arm,
                    cmd.entity,
                    CommandField::Action,
                    other.as_str(),
                )?;
                Ok(NormalizedMessage::new(
                    topic(command::SET),
                    CommandPayload::position(position),
                ))
            }
        }
    }

    fn hand(&self, cmd: &LogicalCommand) -> Result<NormalizedMessage, TranslateError> {
        let side = required_side(cmd)?;
        let action = required_action(cmd)?;
        let hand = &self.calibration.hand;
        let position = lookup(
            hand.for_side(side),
            cmd.entity,
            CommandField::Action,
            action.as_str(),
        )?;
        let name = match hand.command {
            HandCommand::Set => command::SET,
            HandCommand::Action => action.as_str(),
        };
        Ok(NormalizedMessage::new(
            Topic::for_command(EntityKind::Hand, Some(side), name),
            CommandPayload::position(position),
        ))
    }

    fn head(&self, cmd: &LogicalCommand) -> Result<NormalizedMessage, TranslateError> {
        let position = cmd.position.as_ref().ok_or(TranslateError::MissingField {
            entity: cmd.entity,
            field: CommandField::Position,
        })?;
        let abs_position = lookup(
            &self.calibration.head,
            cmd.entity,
            CommandField::Position,
            position.as_str(),
        )?;
        Ok(NormalizedMessage::new(
            Topic::for_command(EntityKind::Head, None, command::FACETRACK_MOVE),
            CommandPayload::position(abs_position),
        ))
    }

    fn rgb(&self, cmd: &LogicalCommand) -> Result<String, TranslateError> {
        match &cmd.action {
            None | Some(ActionKind::Colorize) => {}
            Some(other) => {
                return Err(unsupported(cmd.entity, CommandField::Action, other.as_str()))
            }
        }
        let color = cmd.color.as_deref().ok_or(TranslateError::MissingField {
            entity: cmd.entity,
            field: CommandField::Color,
        })?;
        let rgb = color.strip_prefix('#').unwrap_or(color);

        if self.color_policy == ColorPolicy::Strict && !is_hex_rgb(rgb) {
            return Err(TranslateError::MalformedColor {
                entity: cmd.entity,
                value: color.to_string(),
            });
        }
        Ok(rgb.to_string())
    }
}

fn helmet(cmd: &LogicalCommand) -> Result<NormalizedMessage, TranslateError> {
    let action = required_action(cmd)?;
    match action {
        ActionKind::Open | ActionKind::Close => Ok(NormalizedMessage::new(
            Topic::for_command(EntityKind::Helmet, None, action.as_str()),
            CommandPayload::bare(),
        )),
        other => Err(unsupported(cmd.entity, CommandField::Action, other.as_str())),
    }
}

fn colorize(entity: EntityKind, rgb: String) -> NormalizedMessage {
    NormalizedMessage::new(
        Topic::for_command(entity, None, command::COLORIZE),
        CommandPayload::color(rgb),
    )
}

fn required_side(cmd: &LogicalCommand) -> Result<Side, TranslateError> {
    let kind = cmd.side.as_ref().ok_or(TranslateError::MissingField {
        entity: cmd.entity,
        field: CommandField::Side,
    })?;
    kind.side()
        .ok_or_else(|| unsupported(cmd.entity, CommandField::Side, kind.as_str()))
}

fn required_action(cmd: &LogicalCommand) -> Result<&ActionKind, TranslateError> {
    cmd.action.as_ref().ok_or(TranslateError::MissingField {
        entity: cmd.entity,
        field: CommandField::Action,
    })
}

fn lookup(
    table: &CalibrationTable,
    entity: EntityKind,
    field: CommandField,
    name: &str,
) -> Result<i32, TranslateError> {
    table.get(name).ok_or_else(|| unsupported(entity, field, name))
}

fn unsupported(entity: EntityKind, field: CommandField, value: &str) -> TranslateError {
    TranslateError::UnsupportedAction {
        entity,
        field,
        value: value.to_string(),
    }
}

fn is_hex_rgb(rgb: &str) -> bool {
    rgb.len() == 6 && rgb.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
