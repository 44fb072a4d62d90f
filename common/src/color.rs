use crate::vector::Vector3;

pub const BLACK: Color = Color {
    red: 0.0,
    green: 0.0,
    blue: 0.0,
};

pub const WHITE: Color = Color {
    red: 1.0,
    green: 1.0,
    blue: 1.0,
};

#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct Color {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}
impl Color {
    #[inline]
    pub fn new(red: f32, green: f32, blue: f32) -> Color {
        Color { red, green, blue }
    }

    #[inline]
    pub fn add(self, other: Color) -> Color {
        Color {
            red: self.red + other.red,
            green: self.green + other.green,
            blue: self.blue + other.blue,
        }
    }

    #[inline]
    pub fn sub(self, other: Color) -> Color {
        Color {
            red: self.red - other.red,
            green: self.green - other.green,
            blue: self.blue - other.blue,
        }
    }

    #[inline]
    pub fn mul(self, other: Color) -> Color {
        Color {
            red: self.red * other.red,
            green: self.green * other.green,
            blue: self.blue * other.blue,
        }
    }

    #[inline]
    pub fn mul_s(self, other: f32) -> Color {
        Color {
            red: self.red * other,
            green: self.green * other,
            blue: self.blue * other,
        }
    }

    /// Squared euclidean length of the color treated as a vector.
    #[inline]
    pub fn norm(self) -> f32 {
        self.red * self.red + self.green * self.green + self.blue * self.blue
    }

    #[inline]
    pub fn from_vector(v: Vector3) -> Color {
        Color {
            red: v.x,
            green: v.y,
            blue: v.z,
        }
    }
}
