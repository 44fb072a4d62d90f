/// Offset used to push spawned rays off the surface they leave.
pub const FLOATING_POINT_BACKOFF: f32 = 0.001;

pub const EPSILON: f32 = 0.00001;
