use anyhow::{anyhow, Result};
use glam::Vec3;

use crate::light::{Light, LightKind, Orbit, Phong};
use crate::material::{Material, MaterialMaps};
use crate::scene::{CameraStart, Scene, SceneObject};

/// The incremental tutorial sequence, one entry per original demo program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    /// Flat object color, no shading.
    Colors,
    /// Ambient/diffuse/specular shading with an orbiting white light.
    Phong,
    /// A row of material presets under a fixed light.
    Materials,
    /// Diffuse/specular texture maps on the container cube.
    LightingMaps,
    /// A cube field lit by a directional light.
    Directional,
    /// The same cube field with point light attenuation.
    Point,
    /// The same cube field under a narrow spot light.
    Spot,
}

impl Demo {
    pub const ALL: [Demo; 7] = [
        Demo::Colors,
        Demo::Phong,
        Demo::Materials,
        Demo::LightingMaps,
        Demo::Directional,
        Demo::Point,
        Demo::Spot,
    ];

    pub fn from_name(name: &str) -> Result<Self> {
        let demo = match name {
            "colors" => Demo::Colors,
            "phong" => Demo::Phong,
            "materials" => Demo::Materials,
            "maps" => Demo::LightingMaps,
            "directional" => Demo::Directional,
            "point" => Demo::Point,
            "spot" => Demo::Spot,
            other => {
                return Err(anyhow!(
                    "unknown demo: {other}. Expected one of colors, phong, materials, maps, directional, point, spot"
                ))
            }
        };
        Ok(demo)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Demo::Colors => "colors",
            Demo::Phong => "phong",
            Demo::Materials => "materials",
            Demo::LightingMaps => "maps",
            Demo::Directional => "directional",
            Demo::Point => "point",
            Demo::Spot => "spot",
        }
    }

    /// Builds the scene for this demo.
    pub fn scene(&self) -> Scene {
        match self {
            Demo::Colors => colors_scene(),
            Demo::Phong => phong_scene(),
            Demo::Materials => materials_scene(),
            Demo::LightingMaps => lighting_maps_scene(),
            Demo::Directional => field_scene("directional", LightKind::directional(SUN_DIRECTION)),
            Demo::Point => field_scene("point", LightKind::point(LIGHT_POSITION)),
            Demo::Spot => spot_scene(),
        }
    }
}

const LIGHT_POSITION: Vec3 = Vec3::new(1.2, 1.0, 2.0);
const SUN_DIRECTION: Vec3 = Vec3::new(-0.2, -1.0, -0.3);

// The cube field shared by the light-caster demos.
const FIELD_POSITIONS: [Vec3; 10] = [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(2.0, 5.0, -15.0),
    Vec3::new(-1.5, -2.2, -2.5),
    Vec3::new(-3.8, -2.0, -12.3),
    Vec3::new(2.4, -0.4, -3.5),
    Vec3::new(-1.7, 3.0, -7.5),
    Vec3::new(1.3, -2.0, -2.5),
    Vec3::new(1.5, 2.0, -2.5),
    Vec3::new(1.5, 0.2, -1.5),
    Vec3::new(-1.3, 1.0, -1.5),
];

fn cube(name: &str, position: Vec3, material: Material) -> SceneObject {
    SceneObject {
        name: name.to_string(),
        position,
        material,
        ..SceneObject::default()
    }
}

fn colors_scene() -> Scene {
    Scene {
        name: "colors".to_string(),
        light: Light::new(LightKind::point(LIGHT_POSITION), Phong::white()),
        objects: vec![cube("Cube", Vec3::ZERO, Material::coral())],
        shaded: false,
        ..Scene::default()
    }
}

fn phong_scene() -> Scene {
    Scene {
        name: "phong".to_string(),
        light: Light::new(LightKind::point(LIGHT_POSITION), Phong::white())
            .with_orbit(Orbit::tutorial()),
        objects: vec![cube("Cube", Vec3::ZERO, Material::coral())],
        ..Scene::default()
    }
}

fn materials_scene() -> Scene {
    let presets = [
        ("Coral", Material::coral()),
        ("Emerald", Material::emerald()),
        ("Gold", Material::gold()),
        ("Chrome", Material::chrome()),
    ];
    let spread = 1.5;
    let offset = (presets.len() as f32 - 1.0) * spread / 2.0;
    let objects = presets
        .iter()
        .enumerate()
        .map(|(i, &(name, material))| {
            cube(name, Vec3::new(i as f32 * spread - offset, 0.0, 0.0), material)
        })
        .collect();

    Scene {
        name: "materials".to_string(),
        camera: CameraStart {
            position: Vec3::new(0.0, 0.5, 5.0),
            ..CameraStart::default()
        },
        light: Light::new(LightKind::point(Vec3::new(0.0, 2.0, 2.0)), Phong::default()),
        objects,
        ..Scene::default()
    }
}

fn lighting_maps_scene() -> Scene {
    let container = SceneObject {
        name: "Container".to_string(),
        material: Material::mapped(),
        maps: MaterialMaps {
            diffuse: Some("assets/container2.png".to_string()),
            specular: Some("assets/container2_specular.png".to_string()),
        },
        ..SceneObject::default()
    };
    Scene {
        name: "maps".to_string(),
        light: Light::new(LightKind::point(LIGHT_POSITION), Phong::default())
            .with_orbit(Orbit::tutorial()),
        objects: vec![container],
        ..Scene::default()
    }
}

fn field_scene(name: &str, kind: LightKind) -> Scene {
    let objects = FIELD_POSITIONS
        .iter()
        .enumerate()
        .map(|(i, position)| {
            let angle = 20.0 * i as f32;
            SceneObject {
                name: format!("Cube{i}"),
                position: *position,
                // roughly the tutorial's rotation around (1.0, 0.3, 0.5)
                rotation: Vec3::new(angle, angle * 0.3, angle * 0.5),
                material: Material::coral(),
                ..SceneObject::default()
            }
        })
        .collect();

    Scene {
        name: name.to_string(),
        light: Light::new(kind, Phong::default()),
        objects,
        ..Scene::default()
    }
}

fn spot_scene() -> Scene {
    let camera = CameraStart::default();
    let mut scene = field_scene(
        "spot",
        LightKind::spot(camera.position, Vec3::new(0.0, 0.0, -1.0), 12.5, 17.5),
    );
    scene.camera = camera;
    scene
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_demo_name_round_trips() {
        for demo in Demo::ALL {
            assert_eq!(Demo::from_name(demo.name()).unwrap(), demo);
        }
    }

    #[test]
    fn unknown_demo_is_an_error() {
        assert!(Demo::from_name("bloom").is_err());
    }

    #[test]
    fn colors_demo_is_unlit() {
        let scene = Demo::Colors.scene();
        assert!(!scene.shaded);
        assert_eq!(scene.objects.len(), 1);
    }

    #[test]
    fn phong_demo_orbits_the_tutorial_light() {
        let scene = Demo::Phong.scene();
        assert_eq!(scene.light.orbit, Some(Orbit::tutorial()));
        assert_eq!(
            scene.light.animated(0.0).position(),
            Some(Vec3::new(0.0, 1.0, 2.0))
        );
    }

    #[test]
    fn maps_demo_references_both_textures() {
        let scene = Demo::LightingMaps.scene();
        let container = &scene.objects[0];
        assert!(container.maps.diffuse.is_some());
        assert!(container.maps.specular.is_some());
    }

    #[test]
    fn caster_demos_share_the_cube_field() {
        for demo in [Demo::Directional, Demo::Point, Demo::Spot] {
            let scene = demo.scene();
            assert_eq!(scene.objects.len(), FIELD_POSITIONS.len());
            assert_eq!(scene.light.kind.name(), demo.name());
        }
    }
}
