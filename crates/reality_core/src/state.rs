use std::fmt;

use serde::{Deserialize, Serialize};

use crate::unit::clamp_unit;

/// Narrative phase derived from fulfillment. Ordering follows progression.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Zone {
    Void,
    Awakening,
    Transcendence,
}

impl Zone {
    pub fn as_str(self) -> &'static str {
        match self {
            Zone::Void => "VOID",
            Zone::Awakening => "AWAKENING",
            Zone::Transcendence => "TRANSCENDENCE",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal narrative outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ending {
    Dissolution,
    Acceptance,
    Transcendence,
    Rebellion,
}

impl Ending {
    pub fn as_str(self) -> &'static str {
        match self {
            Ending::Dissolution => "DISSOLUTION",
            Ending::Acceptance => "ACCEPTANCE",
            Ending::Transcendence => "TRANSCENDENCE",
            Ending::Rebellion => "REBELLION",
        }
    }
}

impl fmt::Display for Ending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable player record owned by the narrative system.
///
/// The two progress scalars are private so every write goes through
/// [`PlayerState::set_consciousness`] / [`PlayerState::set_fulfillment`],
/// which clamp to `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerState {
    consciousness: f64,
    fulfillment: f64,
    pub current_zone: Zone,
    pub choices: Vec<String>,
    pub discovered_glitches: u32,
    pub time_elapsed: f64,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            consciousness: 0.0,
            fulfillment: 0.0,
            current_zone: Zone::Void,
            choices: Vec::new(),
            discovered_glitches: 0,
            time_elapsed: 0.0,
        }
    }
}

impl PlayerState {
    pub fn consciousness(&self) -> f64 {
        self.consciousness
    }

    pub fn fulfillment(&self) -> f64 {
        self.fulfillment
    }

    pub fn set_consciousness(&mut self, value: f64) {
        self.consciousness = clamp_unit(value);
    }

    pub fn set_fulfillment(&mut self, value: f64) {
        self.fulfillment = clamp_unit(value);
    }

    pub fn last_choice(&self) -> Option<&str> {
        self.choices.last().map(String::as_str)
    }

    /// Either accumulator has saturated.
    pub fn is_saturated(&self) -> bool {
        self.consciousness >= 1.0 || self.fulfillment >= 1.0
    }

    pub fn snapshot(&self) -> PlayerStateSnapshot {
        PlayerStateSnapshot {
            consciousness: self.consciousness,
            fulfillment: self.fulfillment,
            current_zone: self.current_zone,
            choices: self.choices.clone(),
            discovered_glitches: self.discovered_glitches,
            time_elapsed: self.time_elapsed,
        }
    }
}

/// Read-only copy of [`PlayerState`] handed to other components.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerStateSnapshot {
    pub consciousness: f64,
    pub fulfillment: f64,
    pub current_zone: Zone,
    pub choices: Vec<String>,
    pub discovered_glitches: u32,
    pub time_elapsed: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_clamp() {
        let mut state = PlayerState::default();
        state.set_consciousness(1.7);
        state.set_fulfillment(-0.2);
        assert_eq!(state.consciousness(), 1.0);
        assert_eq!(state.fulfillment(), 0.0);
        assert!(state.is_saturated());
    }

    #[test]
    fn zones_order_by_progression() {
        assert!(Zone::Void < Zone::Awakening);
        assert!(Zone::Awakening < Zone::Transcendence);
    }

    #[test]
    fn enums_serialize_upper_case() {
        let zone = serde_json::to_string(&Zone::Awakening).expect("zone serializes");
        let ending = serde_json::to_string(&Ending::Rebellion).expect("ending serializes");
        assert_eq!(zone, "\"AWAKENING\"");
        assert_eq!(ending, "\"REBELLION\"");
    }
}
