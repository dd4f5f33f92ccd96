use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::state::{Ending, Zone};

/// Effects applied when a choice is made.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Consequences {
    #[serde(default)]
    pub consciousness: Option<f64>,
    #[serde(default)]
    pub fulfillment: Option<f64>,
    #[serde(default)]
    pub ending: Option<Ending>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub consequences: Consequences,
}

impl Choice {
    pub fn new<I: Into<String>, T: Into<String>>(
        id: I,
        text: T,
        consequences: Consequences,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            consequences,
        }
    }
}

/// Ordered, immutable catalog of choices.
///
/// Catalog order matters: each zone offers a fixed index window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChoiceCatalog {
    choices: Vec<Choice>,
}

impl ChoiceCatalog {
    pub fn new(choices: Vec<Choice>) -> Self {
        Self { choices }
    }

    pub fn get(&self, id: &str) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.id == id)
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Choice> {
        self.choices.iter()
    }

    /// Choices presented to the player in `zone`.
    ///
    /// VOID offers indices `[0, 2)`, AWAKENING `[1, 3)`, TRANSCENDENCE the
    /// whole catalog. Windows are truncated to the catalog length.
    pub fn offered(&self, zone: Zone) -> &[Choice] {
        let (start, end) = match zone {
            Zone::Void => (0, 2),
            Zone::Awakening => (1, 3),
            Zone::Transcendence => (0, self.choices.len()),
        };
        let end = end.min(self.choices.len());
        let start = start.min(end);
        &self.choices[start..end]
    }
}

impl Default for ChoiceCatalog {
    fn default() -> Self {
        Self::new(vec![
            Choice::new(
                "question_reality",
                "Question the nature of this reality",
                Consequences {
                    consciousness: Some(0.15),
                    ..Consequences::default()
                },
            ),
            Choice::new(
                "accept_reality",
                "Accept the simulation as your reality",
                Consequences {
                    consciousness: Some(-0.1),
                    fulfillment: Some(0.2),
                    ending: Some(Ending::Acceptance),
                },
            ),
            Choice::new(
                "break_free",
                "Try to break free of the simulation",
                Consequences {
                    consciousness: Some(0.25),
                    fulfillment: Some(-0.1),
                    ending: Some(Ending::Rebellion),
                },
            ),
            Choice::new(
                "transcend",
                "Transcend the boundary between real and simulated",
                Consequences {
                    consciousness: Some(0.2),
                    fulfillment: Some(0.2),
                    ending: Some(Ending::Transcendence),
                },
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(choices: &[Choice]) -> Vec<&str> {
        choices.iter().map(|choice| choice.id.as_str()).collect()
    }

    #[test]
    fn zone_windows_follow_catalog_order() {
        let catalog = ChoiceCatalog::default();
        assert_eq!(
            ids(catalog.offered(Zone::Void)),
            ["question_reality", "accept_reality"]
        );
        assert_eq!(
            ids(catalog.offered(Zone::Awakening)),
            ["accept_reality", "break_free"]
        );
        assert_eq!(catalog.offered(Zone::Transcendence).len(), 4);
    }

    #[test]
    fn short_catalog_truncates_windows() {
        let catalog = ChoiceCatalog::new(vec![Choice::new("only", "Only", Consequences::default())]);
        assert_eq!(ids(catalog.offered(Zone::Void)), ["only"]);
        assert!(catalog.offered(Zone::Awakening).is_empty());
    }

    #[test]
    fn consequences_skip_absent_fields() {
        let catalog = ChoiceCatalog::default();
        let choice = catalog.get("question_reality").expect("choice exists");
        let json = serde_json::to_value(&choice.consequences).expect("serializes");
        let map = json.as_object().expect("object");
        assert!(map.contains_key("consciousness"));
        assert!(!map.contains_key("fulfillment"));
        assert!(!map.contains_key("ending"));
    }
}
