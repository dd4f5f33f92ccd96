//! Immutable configuration for the narrative system and frame loop.
//!
//! [`RealityConfig::default`] carries the reference constants. A JSON
//! document may override any subset of fields; missing fields fall back to
//! the defaults.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ChoiceCatalog;

/// Smallest catalog every zone window can be cut from.
pub const MIN_CATALOG_LEN: usize = 3;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("{name} must lie within [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },
    #[error("awakening threshold {awakening} must not exceed transcendence threshold {transcendence}")]
    ZoneOrder { awakening: f64, transcendence: f64 },
    #[error("ending thresholds must satisfy low <= high, got low={low} high={high}")]
    EndingOrder { low: f64, high: f64 },
    #[error("choice catalog needs at least 3 entries, got {0}")]
    CatalogTooSmall(usize),
    #[error("duplicate choice id {0:?}")]
    DuplicateChoice(String),
    #[error("message band boundaries must be increasing values within [0, 1]")]
    MessageBoundaries,
    #[error("message band {0} has no messages")]
    EmptyMessageBand(usize),
    #[error("message period must be positive, got {0}")]
    MessagePeriod(f64),
    #[error("particle count must be positive")]
    NoParticles,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Consciousness gained per simulated second.
    pub consciousness_rate: f64,
    /// Fulfillment gained per simulated second.
    pub fulfillment_rate: f64,
    /// Consciousness gained per discovered glitch.
    pub glitch_consciousness_bonus: f64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            consciousness_rate: 0.001,
            fulfillment_rate: 0.0005,
            glitch_consciousness_bonus: 0.05,
        }
    }
}

/// Fulfillment levels at which zones are entered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneThresholds {
    pub awakening: f64,
    pub transcendence: f64,
}

impl Default for ZoneThresholds {
    fn default() -> Self {
        Self {
            awakening: 0.33,
            transcendence: 0.66,
        }
    }
}

/// Fallback rule applied when the last choice implies no ending.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndingThresholds {
    pub high: f64,
    pub low: f64,
}

impl Default for EndingThresholds {
    fn default() -> Self {
        Self { high: 0.8, low: 0.5 }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageConfig {
    /// Upper fulfillment bounds of the first three bands.
    pub boundaries: [f64; 3],
    /// Simulated seconds each message stays on screen.
    pub period_seconds: f64,
    pub bands: [Vec<String>; 4],
}

impl Default for MessageConfig {
    fn default() -> Self {
        let band = |lines: &[&str]| lines.iter().map(|line| line.to_string()).collect();
        Self {
            boundaries: [0.3, 0.6, 0.9],
            period_seconds: 5.0,
            bands: [
                band(&[
                    "Everything is as it should be.",
                    "The grid hums quietly beneath you.",
                    "Nothing here needs questioning.",
                ]),
                band(&[
                    "Something flickers at the edge of sight.",
                    "The patterns repeat. Why do they repeat?",
                    "You feel the walls of the world.",
                ]),
                band(&[
                    "The simulation notices you noticing it.",
                    "Every glitch is a door.",
                    "You remember a world before this one.",
                ]),
                band(&[
                    "There is no boundary left to cross.",
                    "You are the light the orb reflects.",
                ]),
            ],
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Cap on a single frame's delta in seconds. `None` leaves deltas uncapped.
    pub max_frame_delta: Option<f64>,
    pub particle_count: usize,
    /// Simulated seconds a glitch mark takes to fade out.
    pub glitch_lifetime: f64,
    /// Label hashed into the seed of the visual subsystems' RNG.
    pub rng_seed: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_frame_delta: None,
            particle_count: 256,
            glitch_lifetime: 1.5,
            rng_seed: "simulation-reality".to_string(),
        }
    }
}

/// Complete configuration supplied at construction time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealityConfig {
    pub progression: ProgressionConfig,
    pub zones: ZoneThresholds,
    pub endings: EndingThresholds,
    pub choices: ChoiceCatalog,
    pub messages: MessageConfig,
    pub orchestrator: OrchestratorConfig,
}

impl RealityConfig {
    /// Load and validate a config JSON document from disk.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open config file {:?}", path))?;
        Self::from_reader(BufReader::new(file))
    }

    /// Deserialize and validate a config document from an arbitrary reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: Self = serde_json::from_reader(reader).context("invalid config json")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("consciousness_rate", self.progression.consciousness_rate)?;
        check_rate("fulfillment_rate", self.progression.fulfillment_rate)?;
        check_unit(
            "glitch_consciousness_bonus",
            self.progression.glitch_consciousness_bonus,
        )?;

        check_unit("zones.awakening", self.zones.awakening)?;
        check_unit("zones.transcendence", self.zones.transcendence)?;
        if self.zones.awakening > self.zones.transcendence {
            return Err(ConfigError::ZoneOrder {
                awakening: self.zones.awakening,
                transcendence: self.zones.transcendence,
            });
        }

        check_unit("endings.high", self.endings.high)?;
        check_unit("endings.low", self.endings.low)?;
        if self.endings.low > self.endings.high {
            return Err(ConfigError::EndingOrder {
                low: self.endings.low,
                high: self.endings.high,
            });
        }

        if self.choices.len() < MIN_CATALOG_LEN {
            return Err(ConfigError::CatalogTooSmall(self.choices.len()));
        }
        let mut seen = HashSet::new();
        for choice in self.choices.iter() {
            if !seen.insert(choice.id.as_str()) {
                return Err(ConfigError::DuplicateChoice(choice.id.clone()));
            }
        }

        let [a, b, c] = self.messages.boundaries;
        let ordered = 0.0 <= a && a < b && b < c && c <= 1.0;
        if !ordered {
            return Err(ConfigError::MessageBoundaries);
        }
        if let Some(index) = self.messages.bands.iter().position(Vec::is_empty) {
            return Err(ConfigError::EmptyMessageBand(index));
        }
        let period = self.messages.period_seconds;
        if !period.is_finite() || period <= 0.0 {
            return Err(ConfigError::MessagePeriod(period));
        }

        if self.orchestrator.particle_count == 0 {
            return Err(ConfigError::NoParticles);
        }
        check_rate("glitch_lifetime", self.orchestrator.glitch_lifetime)?;
        Ok(())
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidRate { name, value })
    }
}

fn check_unit(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Choice, Consequences};

    #[test]
    fn defaults_validate() {
        assert_eq!(RealityConfig::default().validate(), Ok(()));
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let json = r#"{ "progression": { "fulfillment_rate": 0.01 } }"#;
        let config = RealityConfig::from_reader(json.as_bytes()).expect("config parses");
        assert_eq!(config.progression.fulfillment_rate, 0.01);
        assert_eq!(config.progression.consciousness_rate, 0.001);
        assert_eq!(config.zones, ZoneThresholds::default());
        assert_eq!(config.choices.len(), 4);
    }

    #[test]
    fn rejects_inverted_zone_thresholds() {
        let json = r#"{ "zones": { "awakening": 0.7, "transcendence": 0.4 } }"#;
        let err = RealityConfig::from_reader(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("awakening threshold"));
    }

    #[test]
    fn rejects_negative_rate() {
        let mut config = RealityConfig::default();
        config.progression.consciousness_rate = -0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRate {
                name: "consciousness_rate",
                ..
            })
        ));
    }

    #[test]
    fn rejects_duplicate_choice_ids() {
        let mut config = RealityConfig::default();
        config.choices = ChoiceCatalog::new(vec![
            Choice::new("a", "A", Consequences::default()),
            Choice::new("b", "B", Consequences::default()),
            Choice::new("a", "A again", Consequences::default()),
        ]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateChoice("a".to_string()))
        );
    }

    #[test]
    fn rejects_small_catalog() {
        let mut config = RealityConfig::default();
        config.choices = ChoiceCatalog::new(Vec::new());
        assert_eq!(config.validate(), Err(ConfigError::CatalogTooSmall(0)));
    }

    #[test]
    fn rejects_unknown_ending_name() {
        let json = r#"{ "choices": [
            { "id": "a", "text": "A", "consequences": { "ending": "APOTHEOSIS" } }
        ] }"#;
        assert!(RealityConfig::from_reader(json.as_bytes()).is_err());
    }
}
