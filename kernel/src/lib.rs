use common::math::{EPSILON, FLOATING_POINT_BACKOFF};
use common::{
    Camera, Color, GBufferPixel, Geom, GeomKind, Intersection, Material, PathSegment, Ray,
    Surface, Vector3, BLACK,
};
use core::mem::swap;

pub mod atrous;

const RANDOM_SEED: u32 = 0x8802dfb5;

/// Per-path random stream. Each (iteration, pixel, remaining bounces) triple gets its own
/// seed so a stream can be recreated anywhere without carrying generator state between
/// rounds.
#[derive(Clone, Debug)]
pub struct Rng {
    state: u32,
}
impl Rng {
    pub fn for_path(iteration: u32, pixel_index: usize, remaining_bounces: u32) -> Rng {
        let h = hash((1 << 31) | ((remaining_bounces & 0x1ff) << 22) | (iteration & 0x3fffff))
            ^ hash(pixel_index as u32);
        let mut rng = Rng {
            state: if h == 0 { RANDOM_SEED } else { h },
        };
        // The first few outputs of a freshly seeded xorshift are poorly mixed.
        for _ in 0..4 {
            rng.next_u32();
        }
        rng
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Generates a random floating-point number in the range [0.0, 1.0) using some
    /// floating-point bit-level hacking. We mask off the low 23 bits of the xorshift output
    /// to use as a random mantissa and set the sign and exponent bits to turn that mantissa
    /// into a value in the [1.0, 2.0) range, then subtract 1.0 (thus avoiding having to deal
    /// with denormals and similar things).
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        let float_bits = (self.next_u32() & 0x007FFFFF) | 0x3F800000;
        f32::from_bits(float_bits) - 1.0
    }
}

/// Robert Jenkins' 32 bit integer mix.
pub fn hash(a: u32) -> u32 {
    let mut a = a;
    a = a.wrapping_add(0x7ed55d16).wrapping_add(a << 12);
    a = (a ^ 0xc761c23c) ^ (a >> 19);
    a = a.wrapping_add(0x165667b1).wrapping_add(a << 5);
    a = a.wrapping_add(0xd3a2646c) ^ (a << 9);
    a = a.wrapping_add(0xfd7046c5).wrapping_add(a << 3);
    a = (a ^ 0xb55a4f09) ^ (a >> 16);
    a
}

/// Builds the primary path for one pixel. With `jitter` the sample position is offset
/// inside the pixel by a draw from `rng`.
pub fn generate_ray(
    camera: &Camera,
    pixel_index: usize,
    trace_depth: u32,
    jitter: Option<&mut Rng>,
) -> PathSegment {
    let width = camera.width as usize;
    let x = (pixel_index % width) as f32;
    let y = (pixel_index / width) as f32;

    let (jx, jy) = match jitter {
        Some(rng) => (rng.next_f32() - 0.5, rng.next_f32() - 0.5),
        None => (0.0, 0.0),
    };

    let (pixel_x, pixel_y) = camera.pixel_length;
    let sensor_x = pixel_x * (x + jx - camera.width as f32 * 0.5);
    let sensor_y = pixel_y * (y + jy - camera.height as f32 * 0.5);

    let direction = camera
        .view
        .add(camera.right.mul_s(sensor_x))
        .sub(camera.up.mul_s(sensor_y))
        .normalize();

    PathSegment::new(
        Ray {
            origin: camera.position,
            direction,
        },
        pixel_index,
        trace_depth,
    )
}

/// Ray expressed in a primitive's local space. The direction is renormalised, so local `t`
/// values are not world distances.
fn to_local(geom: &Geom, ray: &Ray) -> Ray {
    Ray {
        origin: geom.transform.inverse_transform.transform_point(ray.origin),
        direction: geom
            .transform
            .inverse_transform
            .transform_vector(ray.direction)
            .normalize(),
    }
}

/// Maps a local hit back to world space, returning the world distance from the ray origin
/// and the outward world normal.
fn to_world(geom: &Geom, ray: &Ray, local_point: Vector3, local_normal: Vector3) -> (f32, Vector3) {
    let point = geom.transform.transform.transform_point(local_point);
    let normal = geom
        .transform
        .inv_transpose
        .transform_vector(local_normal)
        .normalize();
    (point.sub(ray.origin).length(), normal)
}

/// Slab test against the unit cube. When the origin is inside the cube the far face is
/// returned.
pub fn box_intersection(geom: &Geom, ray: &Ray) -> Option<(f32, Vector3)> {
    let local = to_local(geom, ray);

    let mut tmin = f32::MIN;
    let mut tmax = f32::MAX;
    let mut tmin_n = Vector3::zero();
    let mut tmax_n = Vector3::zero();

    for axis in 0..3 {
        let d = local.direction.axis(axis);
        let o = local.origin.axis(axis);
        if d.abs() < EPSILON {
            if o < -0.5 || o > 0.5 {
                return None;
            }
            continue;
        }

        let mut t1 = (-0.5 - o) / d;
        let mut t2 = (0.5 - o) / d;
        let mut sign = -1.0;
        if t1 > t2 {
            swap(&mut t1, &mut t2);
            sign = 1.0;
        }

        let mut n = Vector3::zero();
        match axis {
            0 => n.x = sign,
            1 => n.y = sign,
            _ => n.z = sign,
        }

        if t1 > tmin {
            tmin = t1;
            tmin_n = n;
        }
        if t2 < tmax {
            tmax = t2;
            tmax_n = n.neg();
        }
    }

    if tmax < tmin || tmax <= 0.0 {
        return None;
    }

    let (t, n) = if tmin > 0.0 {
        (tmin, tmin_n)
    } else {
        (tmax, tmax_n)
    };
    Some(to_world(geom, ray, local.at(t), n))
}

/// Intersection with the sphere of radius 0.5 at the local origin.
pub fn sphere_intersection(geom: &Geom, ray: &Ray) -> Option<(f32, Vector3)> {
    const RADIUS: f32 = 0.5;
    let local = to_local(geom, ray);

    let v_dot_d = local.origin.dot(local.direction);
    let radicand = v_dot_d * v_dot_d - (local.origin.norm() - RADIUS * RADIUS);
    if radicand < 0.0 {
        return None;
    }

    let root = radicand.sqrt();
    let t_near = -v_dot_d - root;
    let t_far = -v_dot_d + root;
    let t = if t_near > 0.0 {
        t_near
    } else if t_far > 0.0 {
        t_far
    } else {
        return None;
    };

    let point = local.at(t);
    Some(to_world(geom, ray, point, point))
}

/// Naive nearest-hit search over every primitive. On equal distances the earlier primitive
/// wins.
pub fn intersect_scene(ray: &Ray, geoms: &[Geom]) -> Intersection {
    let mut closest = Intersection::MISS;
    let mut closest_t = f32::MAX;

    for geom in geoms {
        let hit = match geom.kind {
            GeomKind::Cube => box_intersection(geom, ray),
            GeomKind::Sphere => sphere_intersection(geom, ray),
        };
        if let Some((t, normal)) = hit {
            if t > 0.0 && t < closest_t {
                closest_t = t;
                closest = Intersection {
                    t,
                    material_id: geom.material_id,
                    surface_normal: normal,
                };
            }
        }
    }

    closest
}

fn make_reflection(incident: Vector3, normal: Vector3) -> Vector3 {
    incident.sub(normal.mul_s(2.0 * incident.dot(normal)))
}

pub fn make_transmission(normal: Vector3, incident: Vector3, index: f32) -> Vector3 {
    let mut ref_n = normal;
    let mut eta_t = index;
    let mut eta_i = 1.0;
    let mut i_dot_n = incident.dot(normal);
    if i_dot_n < 0.0 {
        //Outside the surface
        i_dot_n = -i_dot_n;
    } else {
        //Inside the surface; invert the normal and swap the indices of refraction
        ref_n = normal.neg();
        eta_i = eta_t;
        eta_t = 1.0;
    }

    let eta = eta_i / eta_t;
    let k = 1.0 - (eta * eta) * (1.0 - i_dot_n * i_dot_n);
    incident
        .add(ref_n.mul_s(i_dot_n))
        .mul_s(eta)
        .sub(ref_n.mul_s(k.max(0.0).sqrt()))
}

/// Fraction of light reflected at a dielectric boundary.
fn fresnel(incident: Vector3, normal: Vector3, index: f32) -> f32 {
    let i_dot_n = incident.dot(normal);
    let mut eta_i = 1.0;
    let mut eta_t = index;
    if i_dot_n > 0.0 {
        eta_i = eta_t;
        eta_t = 1.0;
    }

    let sin_t = eta_i / eta_t * (1.0 - i_dot_n * i_dot_n).max(0.0).sqrt();
    if sin_t > 1.0 {
        //Total internal reflection
        1.0
    } else {
        let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();
        let cos_i = i_dot_n.abs();
        let r_s = ((eta_t * cos_i) - (eta_i * cos_t)) / ((eta_t * cos_i) + (eta_i * cos_t));
        let r_p = ((eta_i * cos_i) - (eta_t * cos_t)) / ((eta_i * cos_i) + (eta_t * cos_t));
        (r_s * r_s + r_p * r_p) / 2.0
    }
}

/// Cosine-weighted direction in the hemisphere around `normal`.
fn create_scatter_direction(normal: Vector3, rng: &mut Rng) -> Vector3 {
    let r1 = rng.next_f32();
    let r2 = rng.next_f32();

    let y = r1.sqrt();
    let azimuth = r2 * 2.0 * std::f32::consts::PI;
    let sin_elevation = (1.0 - r1).sqrt();
    let x = sin_elevation * azimuth.cos();
    let z = sin_elevation * azimuth.sin();

    let (n_t, n_b) = create_coordinate_system(normal);

    n_b.mul_s(x)
        .add(normal.mul_s(y))
        .add(n_t.mul_s(z))
        .normalize()
}

fn create_coordinate_system(normal: Vector3) -> (Vector3, Vector3) {
    let n_t = if normal.x.abs() > normal.y.abs() {
        Vector3 {
            x: normal.z,
            y: 0.0,
            z: -normal.x,
        }
    } else {
        Vector3 {
            x: 0.0,
            y: -normal.z,
            z: normal.y,
        }
    };
    let n_t = n_t.normalize();
    let n_b = normal.cross(n_t);
    (n_t, n_b)
}

/// Continues the walk from `hit_point`: replaces the path's ray with the next bounce chosen
/// by the material's surface model. `normal` is the outward geometric normal.
pub fn scatter_ray(
    path: &mut PathSegment,
    hit_point: Vector3,
    normal: Vector3,
    material: &Material,
    rng: &mut Rng,
) {
    let incident = path.ray.direction;
    // Normal on the side the ray arrived from.
    let facing = if incident.dot(normal) > 0.0 {
        normal.neg()
    } else {
        normal
    };

    let (direction, origin) = match material.surface {
        Surface::Diffuse => (
            create_scatter_direction(facing, rng),
            hit_point.add(facing.mul_s(FLOATING_POINT_BACKOFF)),
        ),
        Surface::Reflective => (
            make_reflection(incident, facing).normalize(),
            hit_point.add(facing.mul_s(FLOATING_POINT_BACKOFF)),
        ),
        Surface::Refractive { index } => {
            let kr = fresnel(incident, normal, index);
            if rng.next_f32() < kr {
                (
                    make_reflection(incident, facing).normalize(),
                    hit_point.add(facing.mul_s(FLOATING_POINT_BACKOFF)),
                )
            } else {
                (
                    make_transmission(normal, incident, index).normalize(),
                    hit_point.sub(facing.mul_s(FLOATING_POINT_BACKOFF)),
                )
            }
        }
    };

    path.ray = Ray { origin, direction };
}

/// One shading step for one path. Terminated paths are left untouched.
pub fn shade_path(
    path: &mut PathSegment,
    intersection: &Intersection,
    materials: &[Material],
    iteration: u32,
) {
    if path.is_terminated() {
        return;
    }
    path.remaining_bounces -= 1;

    if !intersection.is_hit() {
        path.color = BLACK;
        path.terminate();
        return;
    }

    let material = &materials[intersection.material_id];
    if material.is_emissive() {
        path.color = path.color.mul(material.color.mul_s(material.emittance));
        path.terminate();
        return;
    }

    // A path on its last bounce keeps its throughput. The scattered ray is never traced.
    path.color = path.color.mul(material.color);
    let hit_point = path.ray.at(intersection.t);
    let mut rng = Rng::for_path(iteration, path.pixel_index, path.remaining_bounces);
    scatter_ray(
        path,
        hit_point,
        intersection.surface_normal,
        material,
        &mut rng,
    );
}

/// First-bounce attributes for one pixel. Reads only the primary ray and its intersection,
/// so it must run before shading replaces the ray.
pub fn capture_gbuffer(
    path: &PathSegment,
    intersection: &Intersection,
    materials: &[Material],
) -> GBufferPixel {
    if !intersection.is_hit() {
        return GBufferPixel::default();
    }

    let material = &materials[intersection.material_id];
    let color = if material.is_emissive() {
        material.color.mul_s(material.emittance)
    } else {
        material.color
    };

    GBufferPixel {
        t: intersection.t,
        color,
        normal: intersection.surface_normal,
        position: path.ray.at(intersection.t),
    }
}

#[inline]
pub fn accumulate(pixel: &mut Color, path: &PathSegment) {
    *pixel = pixel.add(path.color);
}
