use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Ambient/diffuse/specular color triple shared by every light kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Phong {
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
}

impl Default for Phong {
    fn default() -> Self {
        Self {
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::splat(0.8),
            specular: Vec3::ONE,
        }
    }
}

impl Phong {
    /// White light at full strength, as used by the earliest demos.
    pub fn white() -> Self {
        Self {
            ambient: Vec3::splat(0.1),
            diffuse: Vec3::ONE,
            specular: Vec3::ONE,
        }
    }
}

/// Distance falloff terms for point and spot lights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for Attenuation {
    fn default() -> Self {
        // ~50 unit range
        Self {
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

impl Attenuation {
    pub fn factor_at(&self, distance: f32) -> f32 {
        1.0 / (self.constant + self.linear * distance + self.quadratic * distance * distance)
    }
}

/// The shape of a light source.
///
/// Spot cutoffs hold the cosines of the inner and outer half-angles, which
/// is what the shader compares against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    Directional {
        direction: Vec3,
    },
    Point {
        position: Vec3,
        attenuation: Attenuation,
    },
    Spot {
        position: Vec3,
        direction: Vec3,
        cut_off: f32,
        outer_cut_off: f32,
        attenuation: Attenuation,
    },
}

impl LightKind {
    pub fn point(position: Vec3) -> Self {
        Self::Point {
            position,
            attenuation: Attenuation::default(),
        }
    }

    pub fn directional(direction: Vec3) -> Self {
        Self::Directional { direction }
    }

    /// Builds a spot light from half-angles given in degrees.
    pub fn spot(position: Vec3, direction: Vec3, inner_deg: f32, outer_deg: f32) -> Self {
        Self::Spot {
            position,
            direction,
            cut_off: inner_deg.to_radians().cos(),
            outer_cut_off: outer_deg.to_radians().cos(),
            attenuation: Attenuation::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Directional { .. } => "directional",
            Self::Point { .. } => "point",
            Self::Spot { .. } => "spot",
        }
    }
}

/// Circular motion applied to a light's position over elapsed time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orbit {
    pub radius_x: f32,
    pub radius_z: f32,
    pub height: f32,
    pub speed: f32,
}

impl Orbit {
    /// Orbit matching the tutorial loop: the light starts at
    /// `(1.2, 1.0, 2.0)` and circles the origin at twice realtime.
    pub fn tutorial() -> Self {
        Self {
            radius_x: 1.2,
            radius_z: 2.0,
            height: 1.0,
            speed: 2.0,
        }
    }

    pub fn position_at(&self, elapsed: f32) -> Vec3 {
        let angle = self.speed * elapsed;
        Vec3::new(
            angle.sin() * self.radius_x,
            self.height,
            angle.cos() * self.radius_z,
        )
    }
}

/// A complete light source description: shape, color triple, and the
/// optional orbit animation applied each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    pub color: Phong,
    pub orbit: Option<Orbit>,
}

impl Light {
    pub fn new(kind: LightKind, color: Phong) -> Self {
        Self {
            kind,
            color,
            orbit: None,
        }
    }

    pub fn with_orbit(mut self, orbit: Orbit) -> Self {
        self.orbit = Some(orbit);
        self
    }

    /// Current world position, if the light has one.
    pub fn position(&self) -> Option<Vec3> {
        match self.kind {
            LightKind::Directional { .. } => None,
            LightKind::Point { position, .. } | LightKind::Spot { position, .. } => Some(position),
        }
    }

    /// Returns the light with its orbit evaluated at `elapsed` seconds.
    ///
    /// Directional lights are unaffected; point and spot lights move to the
    /// orbit position while keeping every other parameter.
    pub fn animated(&self, elapsed: f32) -> Light {
        let Some(orbit) = self.orbit else {
            return *self;
        };
        let mut light = *self;
        let position = orbit.position_at(elapsed);
        match &mut light.kind {
            LightKind::Directional { .. } => {}
            LightKind::Point { position: p, .. } | LightKind::Spot { position: p, .. } => {
                *p = position;
            }
        }
        light
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_starts_on_the_z_radius() {
        let orbit = Orbit::tutorial();
        let start = orbit.position_at(0.0);
        assert_eq!(start, Vec3::new(0.0, 1.0, 2.0));
    }

    #[test]
    fn orbit_quarter_period_lands_on_the_x_radius() {
        let orbit = Orbit::tutorial();
        // speed 2.0 reaches a quarter turn at t = pi/4
        let quarter = orbit.position_at(std::f32::consts::FRAC_PI_4);
        assert!((quarter.x - 1.2).abs() < 1e-5);
        assert!(quarter.z.abs() < 1e-5);
        assert_eq!(quarter.y, 1.0);
    }

    #[test]
    fn animated_moves_point_lights_only() {
        let orbit = Orbit::tutorial();
        let point = Light::new(LightKind::point(Vec3::new(9.0, 9.0, 9.0)), Phong::default())
            .with_orbit(orbit);
        assert_eq!(
            point.animated(0.0).position(),
            Some(Vec3::new(0.0, 1.0, 2.0))
        );

        let sun = Light::new(LightKind::directional(Vec3::NEG_Y), Phong::default())
            .with_orbit(orbit);
        assert_eq!(sun.animated(1.0).kind, sun.kind);
    }

    #[test]
    fn lights_without_orbit_are_static() {
        let light = Light::new(LightKind::point(Vec3::ONE), Phong::default());
        assert_eq!(light.animated(42.0).position(), Some(Vec3::ONE));
    }

    #[test]
    fn spot_cutoffs_are_cosines() {
        let LightKind::Spot {
            cut_off,
            outer_cut_off,
            ..
        } = LightKind::spot(Vec3::ZERO, Vec3::NEG_Z, 12.5, 17.5)
        else {
            panic!("expected spot light");
        };
        assert!((cut_off - 12.5f32.to_radians().cos()).abs() < 1e-6);
        assert!(outer_cut_off < cut_off);
    }

    #[test]
    fn attenuation_decreases_with_distance() {
        let attenuation = Attenuation::default();
        assert_eq!(attenuation.factor_at(0.0), 1.0);
        assert!(attenuation.factor_at(10.0) < attenuation.factor_at(5.0));
    }
}
