//! Scene descriptions and render/denoise settings.
//!
//! Scenes are JSON files:
//!
//! ```json
//! {
//!   "camera": { "resolution": [800, 800], "position": [0, 5, 10.5], "look_at": [0, 5, 0],
//!               "fovy": 45, "trace_depth": 8, "iterations": 500 },
//!   "materials": [ { "color": [1, 1, 1], "emittance": 5 },
//!                  { "color": [1, 1, 1], "surface": { "refractive": { "index": 1.5 } } } ],
//!   "geoms": [ { "kind": "cube", "material": 0, "translation": [0, 10, 0], "scale": [3, 0.3, 3] } ]
//! }
//! ```

use crate::error::{Error, Result};
use common::{Camera, Color, Geom, GeomKind, Material, Surface, Transform, Vector3};
use kernel::atrous::EdgeStopping;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Parameters of the bounce loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderSettings {
    pub trace_depth: u32,
    pub iterations: u32,
    /// Jitter primary rays inside their pixel for antialiasing.
    pub jitter: bool,
    /// Partition terminated paths out of the active range between bounces.
    pub compact_paths: bool,
}
impl Default for RenderSettings {
    fn default() -> RenderSettings {
        RenderSettings {
            trace_depth: 8,
            iterations: 5000,
            jitter: false,
            compact_paths: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DenoiseSettings {
    pub enabled: bool,
    /// Target width of the filter footprint in pixels.
    pub filter_size: u32,
    pub color_phi: f32,
    pub normal_phi: f32,
    pub position_phi: f32,
}
impl DenoiseSettings {
    pub fn edge_stopping(&self) -> EdgeStopping {
        EdgeStopping {
            color_phi: self.color_phi,
            normal_phi: self.normal_phi,
            position_phi: self.position_phi,
        }
    }
}
impl Default for DenoiseSettings {
    fn default() -> DenoiseSettings {
        DenoiseSettings {
            enabled: false,
            filter_size: 80,
            color_phi: 0.45,
            normal_phi: 0.35,
            position_phi: 0.2,
        }
    }
}

/// Everything a render session reads: immutable for the session's lifetime.
#[derive(Clone, Debug)]
pub struct Scene {
    pub camera: Camera,
    pub materials: Vec<Material>,
    pub geoms: Vec<Geom>,
    pub settings: RenderSettings,
}
impl Scene {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Scene> {
        let text = fs::read_to_string(path)?;
        Scene::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Scene> {
        let desc: SceneDesc = serde_json::from_str(text)?;
        desc.into_scene()
    }

    /// Rejects scenes the pipeline cannot render.
    pub fn validate(&self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(Error::InvalidScene(format!(
                "resolution {}x{} is empty",
                self.camera.width, self.camera.height
            )));
        }
        if !self.camera.is_valid() {
            return Err(Error::InvalidScene(
                "camera basis is degenerate (view parallel to up?)".to_string(),
            ));
        }
        if self.settings.trace_depth == 0 {
            return Err(Error::InvalidScene("trace depth must be at least 1".to_string()));
        }
        for (i, geom) in self.geoms.iter().enumerate() {
            if geom.material_id >= self.materials.len() {
                return Err(Error::InvalidScene(format!(
                    "geom {} uses material {} but only {} materials exist",
                    i,
                    geom.material_id,
                    self.materials.len()
                )));
            }
        }
        for (i, material) in self.materials.iter().enumerate() {
            if material.emittance < 0.0 || !material.emittance.is_finite() {
                return Err(Error::InvalidScene(format!(
                    "material {} has emittance {}",
                    i, material.emittance
                )));
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct SceneDesc {
    camera: CameraDesc,
    #[serde(default)]
    materials: Vec<MaterialDesc>,
    #[serde(default)]
    geoms: Vec<GeomDesc>,
}

#[derive(Deserialize)]
struct CameraDesc {
    resolution: [u32; 2],
    position: [f32; 3],
    look_at: [f32; 3],
    #[serde(default = "default_up")]
    up: [f32; 3],
    #[serde(default = "default_fovy")]
    fovy: f32,
    #[serde(default = "default_trace_depth")]
    trace_depth: u32,
    #[serde(default = "default_iterations")]
    iterations: u32,
}

#[derive(Deserialize)]
struct MaterialDesc {
    color: [f32; 3],
    #[serde(default)]
    emittance: f32,
    #[serde(default)]
    surface: SurfaceDesc,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "lowercase")]
enum SurfaceDesc {
    #[default]
    Diffuse,
    Reflective,
    Refractive { index: f32 },
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum GeomKindDesc {
    Cube,
    Sphere,
}

#[derive(Deserialize)]
struct GeomDesc {
    kind: GeomKindDesc,
    material: usize,
    #[serde(default)]
    translation: [f32; 3],
    #[serde(default)]
    rotation: [f32; 3],
    #[serde(default = "default_scale")]
    scale: [f32; 3],
}

fn default_up() -> [f32; 3] {
    [0.0, 1.0, 0.0]
}

fn default_fovy() -> f32 {
    45.0
}

fn default_trace_depth() -> u32 {
    RenderSettings::default().trace_depth
}

fn default_iterations() -> u32 {
    RenderSettings::default().iterations
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn vector(v: [f32; 3]) -> Vector3 {
    Vector3::new(v[0], v[1], v[2])
}

impl SceneDesc {
    fn into_scene(self) -> Result<Scene> {
        let c = self.camera;
        let camera = Camera::look_at(
            c.resolution[0],
            c.resolution[1],
            vector(c.position),
            vector(c.look_at),
            vector(c.up),
            c.fovy,
        );

        let materials = self
            .materials
            .into_iter()
            .map(|m| Material {
                color: Color::new(m.color[0], m.color[1], m.color[2]),
                emittance: m.emittance,
                surface: match m.surface {
                    SurfaceDesc::Diffuse => Surface::Diffuse,
                    SurfaceDesc::Reflective => Surface::Reflective,
                    SurfaceDesc::Refractive { index } => Surface::Refractive { index },
                },
            })
            .collect();

        let mut geoms = Vec::with_capacity(self.geoms.len());
        for (i, g) in self.geoms.into_iter().enumerate() {
            if g.scale.iter().any(|s| *s == 0.0) {
                return Err(Error::InvalidScene(format!("geom {} has a zero scale", i)));
            }
            geoms.push(Geom {
                kind: match g.kind {
                    GeomKindDesc::Cube => GeomKind::Cube,
                    GeomKindDesc::Sphere => GeomKind::Sphere,
                },
                material_id: g.material,
                transform: Transform::new(
                    vector(g.translation),
                    vector(g.rotation),
                    vector(g.scale),
                ),
            });
        }

        Ok(Scene {
            camera,
            materials,
            geoms,
            settings: RenderSettings {
                trace_depth: c.trace_depth,
                iterations: c.iterations,
                ..RenderSettings::default()
            },
        })
    }
}
