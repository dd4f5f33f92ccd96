use crate::config::MessageConfig;

/// Select the on-screen message for the given fulfillment and elapsed time.
///
/// Fulfillment picks one of four bands; within a band the message rotates
/// every `period_seconds` of simulated time.
pub fn current_message(config: &MessageConfig, fulfillment: f64, time_elapsed: f64) -> &str {
    let band = band_index(config, fulfillment);
    let lines = &config.bands[band];
    if lines.is_empty() {
        return "";
    }
    let slot = if time_elapsed.is_finite() && time_elapsed > 0.0 {
        (time_elapsed / config.period_seconds).floor() as usize
    } else {
        0
    };
    &lines[slot % lines.len()]
}

pub fn band_index(config: &MessageConfig, fulfillment: f64) -> usize {
    config
        .boundaries
        .iter()
        .position(|&bound| fulfillment < bound)
        .unwrap_or(config.boundaries.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_split_at_boundaries() {
        let config = MessageConfig::default();
        assert_eq!(band_index(&config, 0.0), 0);
        assert_eq!(band_index(&config, 0.29), 0);
        assert_eq!(band_index(&config, 0.3), 1);
        assert_eq!(band_index(&config, 0.6), 2);
        assert_eq!(band_index(&config, 0.9), 3);
        assert_eq!(band_index(&config, 1.0), 3);
    }

    #[test]
    fn rotates_every_period() {
        let config = MessageConfig::default();
        let first = current_message(&config, 0.1, 0.0);
        assert_eq!(first, config.bands[0][0]);
        assert_eq!(current_message(&config, 0.1, 4.99), first);
        assert_eq!(current_message(&config, 0.1, 5.0), config.bands[0][1]);
        assert_eq!(current_message(&config, 0.1, 10.0), config.bands[0][2]);
        assert_eq!(current_message(&config, 0.1, 15.0), config.bands[0][0]);
    }

    #[test]
    fn top_band_wraps_on_its_own_length() {
        let config = MessageConfig::default();
        assert_eq!(current_message(&config, 0.95, 10.0), config.bands[3][0]);
    }
}
