use crate::state::{Ending, Zone};

/// Cue requests sent to the generative audio layer.
pub trait AudioCues {
    fn zone_transition(&mut self, zone: Zone);
    fn glitch(&mut self, count: u32);
    fn ending(&mut self, ending: Ending);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SilentAudio;

impl AudioCues for SilentAudio {
    fn zone_transition(&mut self, _zone: Zone) {}
    fn glitch(&mut self, _count: u32) {}
    fn ending(&mut self, _ending: Ending) {}
}
