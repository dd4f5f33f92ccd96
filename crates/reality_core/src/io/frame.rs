use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::events::Event;
use crate::narrative::NarrativeSystem;
use crate::orchestrator::LoopState;
use crate::scene::{Scene, SceneUniforms};
use crate::state::{Ending, PlayerStateSnapshot};

/// Everything a renderer needs to draw one frame.
#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Frame {
    pub t: u64,
    pub loop_state: LoopState,
    pub delta: f64,
    pub state: PlayerStateSnapshot,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub offered: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub events: Vec<Event>,
    pub uniforms: SceneUniforms,
    pub ending: Option<Ending>,
}

pub fn make_frame(
    t: u64,
    loop_state: LoopState,
    delta: f64,
    narrative: &NarrativeSystem,
    scene: &Scene,
    events: Vec<Event>,
) -> Frame {
    let offered = if narrative.is_ended() {
        Vec::new()
    } else {
        narrative
            .offered_choices()
            .iter()
            .map(|choice| choice.id.clone())
            .collect()
    };
    Frame {
        t,
        loop_state,
        delta,
        state: narrative.snapshot(),
        message: narrative.current_message().to_string(),
        offered,
        events,
        uniforms: scene.uniforms(),
        ending: narrative.ending(),
    }
}

impl Frame {
    pub fn is_ended(&self) -> bool {
        self.ending.is_some()
    }

    pub fn to_ndjson(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string(self)?;
        json.push('\n');
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RealityConfig;

    fn parts() -> (NarrativeSystem, Scene) {
        let config = RealityConfig::default();
        (
            NarrativeSystem::new(&config),
            Scene::new(&config.orchestrator),
        )
    }

    #[test]
    fn quiet_frame_omits_empty_fields() {
        let (mut narrative, scene) = parts();
        narrative.debug_set_fulfillment(1.0);
        narrative.resolve_ending();
        let frame = make_frame(3, LoopState::Running, 0.016, &narrative, &scene, Vec::new());
        let line = frame.to_ndjson().expect("frame serializes");
        assert!(line.ends_with('\n'));
        let value: serde_json::Value = serde_json::from_str(line.trim_end()).expect("valid json");
        let map = value.as_object().expect("frame is object");
        assert!(!map.contains_key("events"));
        assert!(!map.contains_key("offered"));
        assert_eq!(map.get("ending").and_then(|v| v.as_str()), Some("ACCEPTANCE"));
        assert_eq!(map.get("loop_state").and_then(|v| v.as_str()), Some("running"));
    }

    #[test]
    fn frame_lists_offered_choices_and_events() {
        let (narrative, scene) = parts();
        let events = vec![Event::GlitchDiscovered { count: 1 }];
        let frame = make_frame(0, LoopState::Paused, 0.0, &narrative, &scene, events);
        let value = serde_json::to_value(&frame).expect("frame serializes");
        assert_eq!(value["offered"][0], "question_reality");
        assert_eq!(value["events"][0]["channel"], "glitch_discovered");
        assert!(value.get("ending").is_none());
        assert_eq!(value["uniforms"]["particles"], 256);
    }
}
