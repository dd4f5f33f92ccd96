//! Narrative progression: accumulation, zone latching, choices, glitches and
//! the one-shot ending.
//!
//! Every mutating operation returns the events it produced. The caller is
//! responsible for publishing them on the [`crate::events::EventBus`].

use tracing::{debug, info};

use crate::catalog::{Choice, ChoiceCatalog};
use crate::config::{
    EndingThresholds, MessageConfig, ProgressionConfig, RealityConfig, ZoneThresholds,
};
use crate::events::Event;
use crate::message;
use crate::state::{Ending, PlayerState, PlayerStateSnapshot};
use crate::unit::sanitize_delta;
use crate::zone::next_zone;

#[derive(Clone, Debug)]
pub struct NarrativeSystem {
    progression: ProgressionConfig,
    zones: ZoneThresholds,
    endings: EndingThresholds,
    catalog: ChoiceCatalog,
    messages: MessageConfig,
    state: PlayerState,
    ending: Option<Ending>,
}

impl NarrativeSystem {
    pub fn new(config: &RealityConfig) -> Self {
        Self {
            progression: config.progression.clone(),
            zones: config.zones.clone(),
            endings: config.endings.clone(),
            catalog: config.choices.clone(),
            messages: config.messages.clone(),
            state: PlayerState::default(),
            ending: None,
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn snapshot(&self) -> PlayerStateSnapshot {
        self.state.snapshot()
    }

    pub fn ending(&self) -> Option<Ending> {
        self.ending
    }

    pub fn is_ended(&self) -> bool {
        self.ending.is_some()
    }

    pub fn catalog(&self) -> &ChoiceCatalog {
        &self.catalog
    }

    /// Accumulate `delta_seconds` of simulated time.
    ///
    /// Negative or non-finite deltas are treated as zero. No-op once an
    /// ending has been resolved.
    pub fn advance(&mut self, delta_seconds: f64) {
        if self.is_ended() {
            return;
        }
        let dt = sanitize_delta(delta_seconds, None);
        self.state.time_elapsed += dt;
        let consciousness = self.state.consciousness() + self.progression.consciousness_rate * dt;
        let fulfillment = self.state.fulfillment() + self.progression.fulfillment_rate * dt;
        self.state.set_consciousness(consciousness);
        self.state.set_fulfillment(fulfillment);
    }

    /// Latch the zone upward if fulfillment crossed a threshold.
    ///
    /// Entering a zone emits `zone_change` followed by `request_choices`.
    pub fn update_zone(&mut self) -> Vec<Event> {
        if self.is_ended() {
            return Vec::new();
        }
        let Some(zone) = next_zone(self.state.current_zone, self.state.fulfillment(), &self.zones)
        else {
            return Vec::new();
        };
        debug!(from = %self.state.current_zone, to = %zone, "zone transition");
        self.state.current_zone = zone;
        vec![Event::ZoneChange { zone }, Event::RequestChoices]
    }

    /// Whether the ending check should run this frame.
    pub fn should_end(&self) -> bool {
        !self.is_ended() && self.state.is_saturated()
    }

    /// Resolve the terminal outcome and freeze the state.
    ///
    /// Returns `None` when an ending was already resolved.
    pub fn resolve_ending(&mut self) -> Option<Event> {
        if self.is_ended() {
            return None;
        }
        let ending = derive_ending(&self.state, &self.catalog, &self.endings);
        self.ending = Some(ending);
        info!(
            %ending,
            consciousness = self.state.consciousness(),
            fulfillment = self.state.fulfillment(),
            "ending resolved"
        );
        Some(Event::Ending {
            ending,
            state: self.state.snapshot(),
        })
    }

    /// One frame of narrative progression: accumulate, latch zones, then
    /// resolve the ending if an accumulator saturated.
    pub fn step(&mut self, delta_seconds: f64) -> Vec<Event> {
        if self.is_ended() {
            return Vec::new();
        }
        self.advance(delta_seconds);
        let mut events = self.update_zone();
        if self.should_end() {
            events.extend(self.resolve_ending());
        }
        events
    }

    /// Apply the consequences of `choice_id`.
    ///
    /// Unknown ids leave the state untouched and produce no event.
    pub fn resolve_choice(&mut self, choice_id: &str) -> Vec<Event> {
        if self.is_ended() {
            return Vec::new();
        }
        let Some(choice) = self.catalog.get(choice_id) else {
            debug!(choice_id, "ignoring unknown choice");
            return Vec::new();
        };
        let consequences = choice.consequences.clone();
        if let Some(delta) = consequences.consciousness {
            self.state.set_consciousness(self.state.consciousness() + delta);
        }
        if let Some(delta) = consequences.fulfillment {
            self.state.set_fulfillment(self.state.fulfillment() + delta);
        }
        self.state.choices.push(choice.id.clone());
        debug!(choice_id, "choice made");
        vec![Event::ChoiceMade {
            choice: choice.id.clone(),
            consequences,
        }]
    }

    pub fn on_glitch_discovered(&mut self) -> Vec<Event> {
        if self.is_ended() {
            return Vec::new();
        }
        self.state.discovered_glitches += 1;
        let consciousness =
            self.state.consciousness() + self.progression.glitch_consciousness_bonus;
        self.state.set_consciousness(consciousness);
        let count = self.state.discovered_glitches;
        debug!(count, "glitch discovered");
        vec![Event::GlitchDiscovered { count }]
    }

    /// Choices offered in the current zone.
    pub fn offered_choices(&self) -> &[Choice] {
        self.catalog.offered(self.state.current_zone)
    }

    pub fn current_message(&self) -> &str {
        message::current_message(
            &self.messages,
            self.state.fulfillment(),
            self.state.time_elapsed,
        )
    }

    pub fn debug_set_rates(&mut self, consciousness_rate: f64, fulfillment_rate: f64) {
        if self.is_ended() {
            return;
        }
        self.progression.consciousness_rate = sanitize_delta(consciousness_rate, None);
        self.progression.fulfillment_rate = sanitize_delta(fulfillment_rate, None);
    }

    pub fn debug_set_consciousness(&mut self, value: f64) {
        if self.is_ended() {
            return;
        }
        self.state.set_consciousness(value);
    }

    pub fn debug_set_fulfillment(&mut self, value: f64) {
        if self.is_ended() {
            return;
        }
        self.state.set_fulfillment(value);
    }
}

/// Terminal outcome for `state`: the last choice's implied ending if it has
/// one, otherwise the threshold fallback.
pub fn derive_ending(
    state: &PlayerState,
    catalog: &ChoiceCatalog,
    thresholds: &EndingThresholds,
) -> Ending {
    state
        .last_choice()
        .and_then(|id| catalog.get(id))
        .and_then(|choice| choice.consequences.ending)
        .unwrap_or_else(|| {
            fallback_ending(state.consciousness(), state.fulfillment(), thresholds)
        })
}

pub fn fallback_ending(
    consciousness: f64,
    fulfillment: f64,
    thresholds: &EndingThresholds,
) -> Ending {
    let high = thresholds.high;
    let low = thresholds.low;
    if consciousness > high && fulfillment > high {
        Ending::Transcendence
    } else if consciousness > high && fulfillment < low {
        Ending::Rebellion
    } else if fulfillment > high && consciousness < low {
        Ending::Acceptance
    } else {
        Ending::Dissolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Zone;

    fn system() -> NarrativeSystem {
        NarrativeSystem::new(&RealityConfig::default())
    }

    #[test]
    fn fallback_table() {
        let t = EndingThresholds::default();
        assert_eq!(fallback_ending(0.9, 0.9, &t), Ending::Transcendence);
        assert_eq!(fallback_ending(0.9, 0.3, &t), Ending::Rebellion);
        assert_eq!(fallback_ending(0.3, 0.9, &t), Ending::Acceptance);
        assert_eq!(fallback_ending(0.6, 1.0, &t), Ending::Dissolution);
        assert_eq!(fallback_ending(0.8, 0.8, &t), Ending::Dissolution);
    }

    #[test]
    fn negative_delta_is_ignored() {
        let mut narrative = system();
        narrative.advance(-5.0);
        narrative.advance(f64::NAN);
        assert_eq!(narrative.state(), &PlayerState::default());
    }

    #[test]
    fn question_reality_has_no_implied_ending() {
        let mut narrative = system();
        narrative.resolve_choice("question_reality");
        narrative.debug_set_consciousness(1.0);
        narrative.debug_set_fulfillment(0.2);
        let event = narrative.resolve_ending().expect("ending fires");
        assert!(matches!(
            event,
            Event::Ending {
                ending: Ending::Rebellion,
                ..
            }
        ));
    }

    #[test]
    fn ended_state_is_frozen() {
        let mut narrative = system();
        narrative.debug_set_fulfillment(1.0);
        assert_eq!(narrative.step(0.016).len(), 3);
        let frozen = narrative.state().clone();

        assert!(narrative.step(10.0).is_empty());
        assert!(narrative.resolve_choice("transcend").is_empty());
        assert!(narrative.on_glitch_discovered().is_empty());
        assert!(narrative.resolve_ending().is_none());
        narrative.debug_set_fulfillment(0.2);
        narrative.debug_set_consciousness(0.9);
        narrative.debug_set_rates(1.0, 1.0);
        narrative.advance(1.0);
        assert_eq!(narrative.state(), &frozen);
    }

    #[test]
    fn offered_choices_follow_latched_zone() {
        let mut narrative = system();
        narrative.debug_set_fulfillment(0.5);
        narrative.update_zone();
        assert_eq!(narrative.state().current_zone, Zone::Awakening);
        let ids: Vec<&str> = narrative
            .offered_choices()
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(ids, ["accept_reality", "break_free"]);

        narrative.debug_set_fulfillment(0.1);
        assert!(narrative.update_zone().is_empty());
        assert_eq!(narrative.state().current_zone, Zone::Awakening);
    }

    #[test]
    fn debug_rates_reject_negative_values() {
        let mut narrative = system();
        narrative.debug_set_rates(-1.0, 0.5);
        narrative.advance(1.0);
        assert_eq!(narrative.state().consciousness(), 0.0);
        assert_eq!(narrative.state().fulfillment(), 0.5);
    }
}
