use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Static per-object reflectance description, set once before the frame
/// loop and uploaded with every draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub diffuse: Vec3,
    pub specular: Vec3,
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self::coral()
    }
}

impl Material {
    pub fn new(diffuse: Vec3, specular: Vec3, shininess: f32) -> Self {
        Self {
            diffuse,
            specular,
            shininess,
        }
    }

    /// The orange-ish cube color used by the early tutorials.
    pub fn coral() -> Self {
        Self::new(Vec3::new(1.0, 0.5, 0.31), Vec3::splat(0.5), 32.0)
    }

    pub fn emerald() -> Self {
        Self::new(
            Vec3::new(0.0757, 0.6142, 0.0757),
            Vec3::new(0.633, 0.7278, 0.633),
            76.8,
        )
    }

    pub fn gold() -> Self {
        Self::new(
            Vec3::new(0.7516, 0.6065, 0.2265),
            Vec3::new(0.6283, 0.5559, 0.3661),
            51.2,
        )
    }

    pub fn chrome() -> Self {
        Self::new(Vec3::splat(0.4), Vec3::new(0.7746, 0.7746, 0.7746), 76.8)
    }

    /// Neutral base used when texture maps supply the surface colors.
    pub fn mapped() -> Self {
        Self::new(Vec3::ONE, Vec3::ONE, 64.0)
    }

    /// Resolves a named preset, as referenced from scene files.
    pub fn preset(name: &str) -> Option<Self> {
        let material = match name {
            "coral" => Self::coral(),
            "emerald" => Self::emerald(),
            "gold" => Self::gold(),
            "chrome" => Self::chrome(),
            "mapped" => Self::mapped(),
            _ => return None,
        };
        Some(material)
    }
}

/// Optional texture maps replacing the material's flat colors.
///
/// Paths are resolved relative to the scene file (or the working directory
/// for built-in demos).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaterialMaps {
    pub diffuse: Option<String>,
    pub specular: Option<String>,
}

impl MaterialMaps {
    pub fn is_empty(&self) -> bool {
        self.diffuse.is_none() && self.specular.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_resolve_by_name() {
        assert_eq!(Material::preset("coral"), Some(Material::coral()));
        assert_eq!(Material::preset("emerald"), Some(Material::emerald()));
        assert_eq!(Material::preset("obsidian"), None);
    }

    #[test]
    fn default_is_the_tutorial_cube_color() {
        let material = Material::default();
        assert_eq!(material.diffuse, Vec3::new(1.0, 0.5, 0.31));
        assert_eq!(material.shininess, 32.0);
    }

    #[test]
    fn maps_report_emptiness() {
        assert!(MaterialMaps::default().is_empty());
        let maps = MaterialMaps {
            diffuse: Some("assets/container2.png".to_string()),
            specular: None,
        };
        assert!(!maps.is_empty());
    }
}
