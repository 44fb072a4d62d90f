use crate::vector::Vector3;
use std::ops::Mul;

/// Row-major 4x4 affine matrix. Points are column vectors: `m * p`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix44(pub [[f32; 4]; 4]);

impl Matrix44 {
    pub fn translate(x: f32, y: f32, z: f32) -> Matrix44 {
        Matrix44([
            [1.0, 0.0, 0.0, x],
            [0.0, 1.0, 0.0, y],
            [0.0, 0.0, 1.0, z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn scale(x: f32, y: f32, z: f32) -> Matrix44 {
        Matrix44([
            [x, 0.0, 0.0, 0.0],
            [0.0, y, 0.0, 0.0],
            [0.0, 0.0, z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotate_x(degrees: f32) -> Matrix44 {
        let (s, c) = degrees.to_radians().sin_cos();
        Matrix44([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, c, -s, 0.0],
            [0.0, s, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotate_y(degrees: f32) -> Matrix44 {
        let (s, c) = degrees.to_radians().sin_cos();
        Matrix44([
            [c, 0.0, s, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [-s, 0.0, c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn rotate_z(degrees: f32) -> Matrix44 {
        let (s, c) = degrees.to_radians().sin_cos();
        Matrix44([
            [c, -s, 0.0, 0.0],
            [s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn transpose(&self) -> Matrix44 {
        let m = &self.0;
        let mut out = [[0.0; 4]; 4];
        for (row, out_row) in out.iter_mut().enumerate() {
            for (col, value) in out_row.iter_mut().enumerate() {
                *value = m[col][row];
            }
        }
        Matrix44(out)
    }

    #[inline]
    pub fn transform_point(&self, p: Vector3) -> Vector3 {
        let m = &self.0;
        Vector3 {
            x: m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3],
            y: m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3],
            z: m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3],
        }
    }

    #[inline]
    pub fn transform_vector(&self, v: Vector3) -> Vector3 {
        let m = &self.0;
        Vector3 {
            x: m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            y: m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            z: m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        }
    }
}

impl Mul for Matrix44 {
    type Output = Matrix44;

    fn mul(self, other: Matrix44) -> Matrix44 {
        let a = &self.0;
        let b = &other.0;
        let mut out = [[0.0; 4]; 4];
        for (row, out_row) in out.iter_mut().enumerate() {
            for (col, value) in out_row.iter_mut().enumerate() {
                *value = (0..4).map(|k| a[row][k] * b[k][col]).sum();
            }
        }
        Matrix44(out)
    }
}

/// Object-to-world placement of a primitive, with the inverse matrices the
/// intersection tests need precomputed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vector3,
    pub rotation: Vector3,
    pub scale: Vector3,
    pub transform: Matrix44,
    pub inverse_transform: Matrix44,
    pub inv_transpose: Matrix44,
}
impl Transform {
    /// Scale, then rotate about X, Y and Z (degrees), then translate.
    pub fn new(translation: Vector3, rotation: Vector3, scale: Vector3) -> Transform {
        let rotate = Matrix44::rotate_z(rotation.z)
            * Matrix44::rotate_y(rotation.y)
            * Matrix44::rotate_x(rotation.x);

        let transform = Matrix44::translate(translation.x, translation.y, translation.z)
            * rotate
            * Matrix44::scale(scale.x, scale.y, scale.z);

        // Rotations are orthonormal, so the inverse composes from the parts.
        let inverse_transform = Matrix44::scale(scale.x.recip(), scale.y.recip(), scale.z.recip())
            * rotate.transpose()
            * Matrix44::translate(-translation.x, -translation.y, -translation.z);

        Transform {
            translation,
            rotation,
            scale,
            transform,
            inverse_transform,
            inv_transpose: inverse_transform.transpose(),
        }
    }
}
