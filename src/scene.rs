use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::light::{Attenuation, Light, LightKind, Orbit, Phong};
use crate::material::{Material, MaterialMaps};

/// Runtime representation of a lighting demo scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub name: String,
    pub camera: CameraStart,
    pub light: Light,
    pub objects: Vec<SceneObject>,
    /// When false the renderer outputs flat object colors, matching the
    /// first tutorial in the sequence.
    pub shaded: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            name: "scene".to_string(),
            camera: CameraStart::default(),
            light: Light::new(LightKind::point(Vec3::new(1.2, 1.0, 2.0)), Phong::default()),
            objects: Vec::new(),
            shaded: true,
        }
    }
}

/// Initial camera placement for a scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraStart {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
}

impl Default for CameraStart {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
        }
    }
}

/// A renderable entry in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    /// OBJ file to draw; the built-in cube when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<String>,
    pub material: Material,
    #[serde(default)]
    pub maps: MaterialMaps,
    #[serde(default)]
    pub position: Vec3,
    /// Euler angles in degrees, applied Z then Y then X.
    #[serde(default)]
    pub rotation: Vec3,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
}

impl Default for SceneObject {
    fn default() -> Self {
        Self {
            name: String::new(),
            mesh: None,
            material: Material::default(),
            maps: MaterialMaps::default(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

fn default_scale() -> Vec3 {
    Vec3::ONE
}

impl Scene {
    /// Parses a scene description from XML.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid scene XML")?;
        let root = document.root_element();
        if !root.has_tag_name("scene") {
            return Err(anyhow!("expected <scene> root element"));
        }

        let mut scene = Scene {
            name: root.attribute("name").unwrap_or("scene").to_string(),
            ..Scene::default()
        };

        if let Some(shading) = optional_text(&root, "shading") {
            scene.shaded = match shading.as_str() {
                "phong" => true,
                "unlit" => false,
                other => return Err(anyhow!("unknown shading mode: {other}")),
            };
        }

        if let Some(camera) = root.children().find(|n| n.has_tag_name("camera")) {
            scene.camera = parse_camera(&camera)?;
        }

        if let Some(light) = root.children().find(|n| n.has_tag_name("light")) {
            scene.light = parse_light(&light)?;
        }

        for node in document.descendants().filter(|n| n.has_tag_name("object")) {
            scene.objects.push(parse_object(&node)?);
        }

        Ok(scene)
    }
}

fn parse_camera(node: &Node<'_, '_>) -> Result<CameraStart> {
    let defaults = CameraStart::default();
    Ok(CameraStart {
        position: parse_vec3(optional_text(node, "position"), defaults.position)?,
        yaw: parse_f32(optional_text(node, "yaw"), defaults.yaw)?,
        pitch: parse_f32(optional_text(node, "pitch"), defaults.pitch)?,
        fov: parse_f32(optional_text(node, "fov"), defaults.fov)?,
    })
}

fn parse_light(node: &Node<'_, '_>) -> Result<Light> {
    let position = parse_vec3(optional_text(node, "position"), Vec3::new(1.2, 1.0, 2.0))?;
    let direction = parse_vec3(optional_text(node, "direction"), Vec3::new(0.0, 0.0, -1.0))?;
    let attenuation = parse_attenuation(node)?;

    let kind = match node.attribute("type").unwrap_or("point") {
        "point" => LightKind::Point {
            position,
            attenuation,
        },
        "directional" => LightKind::Directional { direction },
        "spot" => {
            let inner = parse_f32(optional_text(node, "cutoff"), 12.5)?;
            let outer = parse_f32(optional_text(node, "outer-cutoff"), 17.5)?;
            if outer < inner {
                return Err(anyhow!(
                    "spot outer cutoff ({outer}) must not be smaller than the inner cutoff ({inner})"
                ));
            }
            LightKind::Spot {
                position,
                direction,
                cut_off: inner.to_radians().cos(),
                outer_cut_off: outer.to_radians().cos(),
                attenuation,
            }
        }
        other => return Err(anyhow!("unknown light type: {other}")),
    };

    let defaults = Phong::default();
    let color = Phong {
        ambient: parse_vec3(optional_text(node, "ambient"), defaults.ambient)?,
        diffuse: parse_vec3(optional_text(node, "diffuse"), defaults.diffuse)?,
        specular: parse_vec3(optional_text(node, "specular"), defaults.specular)?,
    };

    let mut light = Light::new(kind, color);
    if let Some(orbit) = node.children().find(|n| n.has_tag_name("orbit")) {
        light = light.with_orbit(parse_orbit(&orbit)?);
    }
    Ok(light)
}

fn parse_attenuation(node: &Node<'_, '_>) -> Result<Attenuation> {
    let Some(text) = optional_text(node, "attenuation") else {
        return Ok(Attenuation::default());
    };
    let values = parse_vec3(Some(text), Vec3::ZERO)?;
    Ok(Attenuation {
        constant: values.x,
        linear: values.y,
        quadratic: values.z,
    })
}

fn parse_orbit(node: &Node<'_, '_>) -> Result<Orbit> {
    let defaults = Orbit::tutorial();
    Ok(Orbit {
        radius_x: parse_f32(optional_text(node, "radius-x"), defaults.radius_x)?,
        radius_z: parse_f32(optional_text(node, "radius-z"), defaults.radius_z)?,
        height: parse_f32(optional_text(node, "height"), defaults.height)?,
        speed: parse_f32(optional_text(node, "speed"), defaults.speed)?,
    })
}

fn parse_object(node: &Node<'_, '_>) -> Result<SceneObject> {
    let mut object = SceneObject::default();
    object.name = required_text(node, "name")?;
    object.mesh = optional_text(node, "mesh");
    object.material = parse_material(node)?;
    object.maps = MaterialMaps {
        diffuse: optional_text(node, "diffuse-map"),
        specular: optional_text(node, "specular-map"),
    };
    object.position = parse_vec3(optional_text(node, "position"), object.position)?;
    object.rotation = parse_vec3(optional_text(node, "rotation"), object.rotation)?;
    object.scale = parse_vec3(optional_text(node, "scale"), object.scale)?;
    Ok(object)
}

fn parse_material(node: &Node<'_, '_>) -> Result<Material> {
    let mut material = match optional_text(node, "material") {
        Some(name) => {
            Material::preset(&name).ok_or_else(|| anyhow!("unknown material preset: {name}"))?
        }
        None => Material::default(),
    };
    material.diffuse = parse_vec3(optional_text(node, "diffuse"), material.diffuse)?;
    material.specular = parse_vec3(optional_text(node, "specular"), material.specular)?;
    material.shininess = parse_f32(optional_text(node, "shininess"), material.shininess)?;
    Ok(material)
}

fn required_text(node: &Node<'_, '_>, tag: &str) -> Result<String> {
    optional_text(node, tag).ok_or_else(|| anyhow!("<{tag}> tag is missing"))
}

fn optional_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn parse_vec3(value: Option<String>, default: Vec3) -> Result<Vec3> {
    let Some(value) = value else {
        return Ok(default);
    };
    let mut numbers = value
        .split_whitespace()
        .filter_map(|component| component.parse::<f32>().ok());
    let x = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    let y = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    let z = numbers
        .next()
        .ok_or_else(|| anyhow!("vector is missing components"))?;
    Ok(Vec3::new(x, y, z))
}

fn parse_f32(value: Option<String>, default: f32) -> Result<f32> {
    match value {
        Some(value) => value
            .parse::<f32>()
            .map_err(|err| anyhow!("failed to parse float: {err}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
    <scene name="spotlight">
        <camera>
            <position>0 0 5</position>
            <fov>60</fov>
        </camera>
        <light type="spot">
            <position>0 2 0</position>
            <direction>0 -1 0</direction>
            <diffuse>0.9 0.9 0.9</diffuse>
            <cutoff>12.5</cutoff>
            <outer-cutoff>17.5</outer-cutoff>
            <attenuation>1.0 0.09 0.032</attenuation>
        </light>
        <object>
            <name>Crate</name>
            <material>coral</material>
            <position>0 0 0</position>
        </object>
        <object>
            <name>Floor</name>
            <diffuse>0.3 0.3 0.35</diffuse>
            <shininess>8</shininess>
            <position>0 -1 0</position>
            <scale>10 0.1 10</scale>
        </object>
    </scene>
    "#;

    #[test]
    fn parses_a_spot_scene() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        assert_eq!(scene.name, "spotlight");
        assert_eq!(scene.camera.fov, 60.0);
        assert_eq!(scene.objects.len(), 2);
        assert!(scene.shaded);

        let LightKind::Spot {
            position,
            cut_off,
            outer_cut_off,
            ..
        } = scene.light.kind
        else {
            panic!("expected spot light");
        };
        assert_eq!(position, Vec3::new(0.0, 2.0, 0.0));
        assert!((cut_off - 12.5f32.to_radians().cos()).abs() < 1e-6);
        assert!(outer_cut_off < cut_off);
        assert_eq!(scene.light.color.diffuse, Vec3::splat(0.9));
    }

    #[test]
    fn material_fields_override_presets() {
        let scene = Scene::from_xml(SAMPLE).unwrap();
        let floor = &scene.objects[1];
        assert_eq!(floor.material.diffuse, Vec3::new(0.3, 0.3, 0.35));
        assert_eq!(floor.material.shininess, 8.0);
        // unspecified fields keep the preset/default value
        assert_eq!(floor.material.specular, Material::default().specular);
    }

    #[test]
    fn missing_name_is_an_error() {
        let bad = "<scene><object><mesh>cube.obj</mesh></object></scene>";
        assert!(Scene::from_xml(bad).is_err());
    }

    #[test]
    fn unknown_light_type_is_an_error() {
        let bad = r#"<scene><light type="area"/></scene>"#;
        assert!(Scene::from_xml(bad).is_err());
    }

    #[test]
    fn inverted_spot_cutoffs_are_an_error() {
        let bad = r#"
        <scene>
            <light type="spot">
                <cutoff>20</cutoff>
                <outer-cutoff>10</outer-cutoff>
            </light>
        </scene>
        "#;
        assert!(Scene::from_xml(bad).is_err());
    }

    #[test]
    fn defaults_fill_a_minimal_scene() {
        let scene = Scene::from_xml("<scene/>").unwrap();
        assert_eq!(scene.camera, CameraStart::default());
        assert_eq!(scene.light.kind.name(), "point");
        assert!(scene.objects.is_empty());
    }

    #[test]
    fn unlit_shading_parses() {
        let scene = Scene::from_xml("<scene><shading>unlit</shading></scene>").unwrap();
        assert!(!scene.shaded);
        assert!(Scene::from_xml("<scene><shading>toon</shading></scene>").is_err());
    }

    #[test]
    fn orbit_tags_parse() {
        let xml = r#"
        <scene>
            <light type="point">
                <orbit>
                    <radius-x>1.2</radius-x>
                    <radius-z>2.0</radius-z>
                    <height>1.0</height>
                    <speed>2.0</speed>
                </orbit>
            </light>
        </scene>
        "#;
        let scene = Scene::from_xml(xml).unwrap();
        assert_eq!(scene.light.orbit, Some(Orbit::tutorial()));
    }
}
