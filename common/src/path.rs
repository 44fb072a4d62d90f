use crate::color::{Color, BLACK, WHITE};
use crate::vector::{Ray, Vector3};

/// One camera path: the ray for the current bounce plus what it has gathered.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathSegment {
    pub ray: Ray,
    pub color: Color,
    pub pixel_index: usize,
    pub remaining_bounces: u32,
}
impl PathSegment {
    pub fn new(ray: Ray, pixel_index: usize, trace_depth: u32) -> PathSegment {
        PathSegment {
            ray,
            color: WHITE,
            pixel_index,
            remaining_bounces: trace_depth,
        }
    }

    #[inline]
    pub fn is_terminated(&self) -> bool {
        self.remaining_bounces == 0
    }

    #[inline]
    pub fn terminate(&mut self) {
        self.remaining_bounces = 0;
    }
}
impl Default for PathSegment {
    fn default() -> PathSegment {
        PathSegment {
            ray: Ray::default(),
            color: BLACK,
            pixel_index: 0,
            remaining_bounces: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Intersection {
    /// Distance along the ray, or -1 when nothing was hit.
    pub t: f32,
    pub material_id: usize,
    pub surface_normal: Vector3,
}
impl Intersection {
    pub const MISS: Intersection = Intersection {
        t: -1.0,
        material_id: 0,
        surface_normal: Vector3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        },
    };

    #[inline]
    pub fn is_hit(&self) -> bool {
        self.t > 0.0
    }
}
impl Default for Intersection {
    fn default() -> Intersection {
        Intersection::MISS
    }
}

/// First-bounce attributes of one pixel, used to guide the denoiser.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GBufferPixel {
    pub t: f32,
    pub color: Color,
    pub normal: Vector3,
    pub position: Vector3,
}
impl Default for GBufferPixel {
    fn default() -> GBufferPixel {
        GBufferPixel {
            t: -1.0,
            color: BLACK,
            normal: Vector3::zero(),
            position: Vector3::zero(),
        }
    }
}
