use crate::color::Color;

/// Reflectance model handed to the scatter function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Surface {
    Diffuse,
    Reflective,
    Refractive { index: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    pub color: Color,
    pub emittance: f32,
    pub surface: Surface,
}
impl Material {
    pub fn diffuse(color: Color) -> Material {
        Material {
            color,
            emittance: 0.0,
            surface: Surface::Diffuse,
        }
    }

    pub fn emissive(color: Color, emittance: f32) -> Material {
        Material {
            color,
            emittance,
            surface: Surface::Diffuse,
        }
    }

    #[inline]
    pub fn is_emissive(&self) -> bool {
        self.emittance > 0.0
    }
}
