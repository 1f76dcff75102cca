use serde::Serialize;
use shared::domain::{ActionKind, EntityKind, Side};

use crate::Translator;

/// Values a front end may offer for one entity. Labels and localization are
/// the front end's business; this only lists what translation accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityCatalog {
    pub entity: EntityKind,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sides: Vec<Side>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<String>,
    pub takes_color: bool,
}

impl EntityCatalog {
    fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            sides: if entity.requires_side() {
                Side::ALL.to_vec()
            } else {
                Vec::new()
            },
            actions: Vec::new(),
            positions: Vec::new(),
            takes_color: false,
        }
    }
}

impl Translator {
    pub fn catalog(&self) -> Vec<EntityCatalog> {
        let calibration = self.calibration();
        EntityKind::ALL
            .into_iter()
            .map(|entity| {
                let mut entry = EntityCatalog::new(entity);
                match entity {
                    EntityKind::Arm => {
                        entry.actions = [ActionKind::Up, ActionKind::Down]
                            .iter()
                            .map(ToString::to_string)
                            .chain(calibration.arm.names().map(str::to_string))
                            .collect();
                    }
                    // Hand tables are validated to share their names.
                    EntityKind::Hand => {
                        entry.actions =
                            calibration.hand.right.names().map(str::to_string).collect();
                    }
                    EntityKind::Helmet => {
                        entry.actions = vec![
                            ActionKind::Open.to_string(),
                            ActionKind::Close.to_string(),
                        ];
                    }
                    EntityKind::Head => {
                        entry.positions =
                            calibration.head.names().map(str::to_string).collect();
                    }
                    EntityKind::Eyes | EntityKind::Energy | EntityKind::EnergyEyes => {
                        entry.actions = vec![ActionKind::Colorize.to_string()];
                        entry.takes_color = true;
                    }
                }
                entry
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Calibration, ColorPolicy, Translator};
    use shared::domain::EntityKind;

    #[test]
    fn catalog_lists_every_entity() {
        let catalog = Translator::default().catalog();
        assert_eq!(catalog.len(), EntityKind::ALL.len());
    }

    #[test]
    fn catalog_follows_calibration_revision() {
        let translator = Translator::new(Calibration::symmetric(), ColorPolicy::Strict);
        let hand = translator
            .catalog()
            .into_iter()
            .find(|entry| entry.entity == EntityKind::Hand)
            .expect("hand entry");
        assert_eq!(hand.actions, vec!["down", "horizontal", "up"]);
        assert_eq!(hand.sides.len(), 2);
    }

    #[test]
    fn arm_catalog_starts_with_binary_actions() {
        let arm = Translator::default()
            .catalog()
            .into_iter()
            .find(|entry| entry.entity == EntityKind::Arm)
            .expect("arm entry");
        assert_eq!(&arm.actions[..2], &["up".to_string(), "down".to_string()]);
        assert!(arm.actions.contains(&"threequarter".to_string()));
    }
}
