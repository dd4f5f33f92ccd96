use crate::config::ZoneThresholds;
use crate::state::Zone;

/// Map a fulfillment level to its zone.
pub fn classify(fulfillment: f64, thresholds: &ZoneThresholds) -> Zone {
    if fulfillment >= thresholds.transcendence {
        Zone::Transcendence
    } else if fulfillment >= thresholds.awakening {
        Zone::Awakening
    } else {
        Zone::Void
    }
}

/// Latch the cached zone upward.
///
/// Returns the newly entered zone when `fulfillment` classifies above
/// `current`. A lower classification never moves the latch back down.
pub fn next_zone(current: Zone, fulfillment: f64, thresholds: &ZoneThresholds) -> Option<Zone> {
    let classified = classify(fulfillment, thresholds);
    (classified > current).then_some(classified)
}
