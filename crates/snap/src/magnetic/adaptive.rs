use canvas_geometry::{clamp_unit, smoothstep};

use super::MagneticConfig;

/// Capture radius for the current drag.
///
/// Faster pointers reach further, crowded regions shrink the radius so
/// neighbouring targets do not all fire, and strong nearby targets widen it.
/// The result always lies in `[min_snap_distance, max_snap_distance]`.
pub fn snap_distance(
    config: &MagneticConfig,
    speed: f64,
    nearby_targets: usize,
    average_strength: f64,
) -> f64 {
    let velocity = 1.0 + speed.max(0.0) * config.velocity_scale;
    let density = 1.0 / (1.0 + nearby_targets as f64 * config.density_scale);
    let strength = 0.5 + clamp_unit(average_strength);
    (config.base_snap_distance * velocity * density * strength)
        .clamp(config.min_snap_distance, config.max_snap_distance)
}

/// Pull weakens as the pointer moves faster so quick sweeps do not stick.
pub fn velocity_factor(config: &MagneticConfig, speed: f64) -> f64 {
    1.0 / (1.0 + speed.max(0.0) * config.velocity_damping)
}

/// Strength of one target at `distance` within a capture radius of
/// `max_distance`, clamped to `[0, 1]`.
pub fn attenuated_strength(
    base: f64,
    distance: f64,
    max_distance: f64,
    velocity_factor: f64,
    mass: f64,
    charge: f64,
    global: f64,
) -> f64 {
    if max_distance <= 0.0 {
        return 0.0;
    }
    let falloff = smoothstep(1.0 - distance / max_distance);
    clamp_unit(base * falloff * velocity_factor * mass.max(0.0).sqrt() * charge.abs() * global)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_stays_in_bounds() {
        let config = MagneticConfig::default();
        for speed in [0.0, 10.0, 1e6] {
            for nearby in [0, 3, 1000] {
                for strength in [0.0, 0.5, 1.0] {
                    let d = snap_distance(&config, speed, nearby, strength);
                    assert!(d >= config.min_snap_distance && d <= config.max_snap_distance);
                }
            }
        }
    }

    #[test]
    fn test_faster_reaches_further() {
        let config = MagneticConfig::default();
        let slow = snap_distance(&config, 0.0, 0, 0.5);
        let fast = snap_distance(&config, 200.0, 0, 0.5);
        assert!(fast > slow);
        let crowded = snap_distance(&config, 0.0, 20, 0.5);
        assert!(crowded < slow);
    }

    #[test]
    fn test_strength_falls_off() {
        let near = attenuated_strength(1.0, 1.0, 20.0, 1.0, 1.0, 1.0, 1.0);
        let far = attenuated_strength(1.0, 15.0, 20.0, 1.0, 1.0, 1.0, 1.0);
        assert!(near > far && far > 0.0);
        assert_eq!(attenuated_strength(1.0, 25.0, 20.0, 1.0, 1.0, 1.0, 1.0), 0.0);
        // heavy targets saturate at 1
        assert_eq!(attenuated_strength(1.0, 0.0, 20.0, 1.0, 100.0, 1.0, 1.0), 1.0);
        // a repelling charge still yields a positive magnitude
        assert!(attenuated_strength(1.0, 1.0, 20.0, 1.0, 1.0, -1.0, 1.0) > 0.0);
    }
}
