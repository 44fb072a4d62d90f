mod camera;
mod color;
mod geom;
mod material;
pub mod math;
mod matrix;
mod path;
mod vector;

pub use camera::Camera;
pub use color::{Color, BLACK, WHITE};
pub use geom::{Geom, GeomKind};
pub use material::{Material, Surface};
pub use matrix::{Matrix44, Transform};
pub use path::{GBufferPixel, Intersection, PathSegment};
pub use vector::{Ray, Vector3};
