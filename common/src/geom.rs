use crate::matrix::Transform;

/// Local-space shapes: a unit cube centred on the origin and a sphere of
/// radius 0.5 centred on the origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeomKind {
    Cube,
    Sphere,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geom {
    pub kind: GeomKind,
    pub material_id: usize,
    pub transform: Transform,
}
