use crate::vector::Vector3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub width: u32,
    pub height: u32,
    pub position: Vector3,
    pub look_at: Vector3,
    pub view: Vector3,
    pub up: Vector3,
    pub right: Vector3,
    pub fovy: f32,
    /// World-space extent of one pixel along `right` and `up` at unit distance.
    pub pixel_length: (f32, f32),
}
impl Camera {
    pub fn look_at(
        width: u32,
        height: u32,
        position: Vector3,
        look_at: Vector3,
        up: Vector3,
        fovy: f32,
    ) -> Camera {
        let view = look_at.sub(position).normalize();
        let right = view.cross(up).normalize();
        let up = right.cross(view);

        let aspect = width as f32 / height as f32;
        let y_scaled = (fovy.to_radians() / 2.0).tan();
        let x_scaled = y_scaled * aspect;

        Camera {
            width,
            height,
            position,
            look_at,
            view,
            up,
            right,
            fovy,
            pixel_length: (2.0 * x_scaled / width as f32, 2.0 * y_scaled / height as f32),
        }
    }

    #[inline]
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether the view basis is usable (camera not looking along `up`).
    pub fn is_valid(&self) -> bool {
        self.view.is_finite()
            && self.right.is_finite()
            && self.up.is_finite()
            && self.pixel_length.0.is_finite()
            && self.pixel_length.1.is_finite()
    }
}
