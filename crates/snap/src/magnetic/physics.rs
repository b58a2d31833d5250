use canvas_geometry::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SnapError};

/// Speeds below this after damping are zeroed.
const REST_SPEED: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhysicsBody {
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
}

impl PhysicsBody {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Advance one step under `force`: accelerate, lose `friction`, apply
    /// `damping`, cap the speed, then move.
    pub fn integrate(&mut self, force: Vec2, mass: f64, config: &PhysicsConfig) {
        let dt = config.time_step;
        self.acceleration = force / mass.max(f64::EPSILON);
        let mut velocity = (self.velocity + self.acceleration * dt) * (1.0 - config.friction);
        velocity = (velocity * config.damping).clamp_length(config.max_speed);
        if velocity.length() < REST_SPEED {
            velocity = Vec2::ZERO;
        }
        self.velocity = velocity;
        self.position += velocity * dt;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub enabled: bool,
    /// Fraction of velocity lost per step, in `[0, 1]`.
    pub friction: f64,
    /// Multiplier applied to velocity per step, in `[0, 1]`.
    pub damping: f64,
    pub max_speed: f64,
    /// Seconds per step.
    pub time_step: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            friction: 0.1,
            damping: 0.9,
            max_speed: 2000.0,
            time_step: 1.0 / 60.0,
        }
    }
}

impl PhysicsConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.friction) || !(0.0..=1.0).contains(&self.damping) {
            return Err(SnapError::invalid_config(
                "friction and damping must lie in [0, 1]",
            ));
        }
        if !(self.max_speed > 0.0 && self.time_step > 0.0 && self.time_step.is_finite()) {
            return Err(SnapError::invalid_config(
                "max_speed and time_step must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friction_slows_body() {
        let config = PhysicsConfig::default();
        let mut body = PhysicsBody {
            velocity: Vec2::new(600.0, 0.0),
            ..Default::default()
        };
        body.integrate(Vec2::ZERO, 1.0, &config);
        assert!(body.velocity.x < 600.0);
        assert!(body.position.x > 0.0);
    }

    #[test]
    fn test_speed_is_capped() {
        let config = PhysicsConfig {
            max_speed: 100.0,
            friction: 0.0,
            damping: 1.0,
            ..Default::default()
        };
        let mut body = PhysicsBody::default();
        body.integrate(Vec2::new(1e9, 0.0), 1.0, &config);
        assert!((body.velocity.length() - 100.0).abs() < 1e-9);
        assert_eq!(body.acceleration, Vec2::new(1e9, 0.0));
    }

    #[test]
    fn test_tiny_velocity_comes_to_rest() {
        let mut body = PhysicsBody {
            velocity: Vec2::new(0.05, 0.0),
            ..PhysicsBody::at(Vec2::new(5.0, 5.0))
        };
        body.integrate(Vec2::ZERO, 1.0, &PhysicsConfig::default());
        assert_eq!(body.velocity, Vec2::ZERO);
        assert_eq!(body.position, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_validate() {
        assert!(PhysicsConfig::default().validate().is_ok());
        let bad = PhysicsConfig {
            friction: 2.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
