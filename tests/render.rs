use atrous_tracer::{
    DenoiseSettings, Error, GBufferView, RenderSession, RenderSettings, Scene,
};
use common::{Camera, Color, Geom, GeomKind, Material, Transform, Vector3, BLACK, WHITE};

const WIDTH: u32 = 16;
const HEIGHT: u32 = 12;

fn camera() -> Camera {
    Camera::look_at(
        WIDTH,
        HEIGHT,
        Vector3::zero(),
        Vector3::new(0.0, 0.0, -1.0),
        Vector3::new(0.0, 1.0, 0.0),
        45.0,
    )
}

fn settings(trace_depth: u32) -> RenderSettings {
    RenderSettings {
        trace_depth,
        ..RenderSettings::default()
    }
}

fn geom(kind: GeomKind, material_id: usize, translation: Vector3, scale: Vector3) -> Geom {
    Geom {
        kind,
        material_id,
        transform: Transform::new(translation, Vector3::zero(), scale),
    }
}

/// The camera sits inside a large emissive sphere, so every primary ray hits it.
fn light_sphere_scene(trace_depth: u32) -> Scene {
    Scene {
        camera: camera(),
        materials: vec![Material::emissive(Color::new(0.5, 0.25, 1.0), 2.0)],
        geoms: vec![geom(
            GeomKind::Sphere,
            0,
            Vector3::zero(),
            Vector3::from_one(100.0),
        )],
        settings: settings(trace_depth),
    }
}

fn empty_scene(trace_depth: u32) -> Scene {
    Scene {
        camera: camera(),
        materials: vec![],
        geoms: vec![],
        settings: settings(trace_depth),
    }
}

/// Closed white room with a light panel on the ceiling and a grey box on the floor.
fn room_scene(trace_depth: u32, compact_paths: bool) -> Scene {
    Scene {
        camera: camera(),
        materials: vec![
            Material::diffuse(Color::new(0.9, 0.9, 0.9)),
            Material::emissive(WHITE, 4.0),
            Material::diffuse(Color::new(0.4, 0.6, 0.8)),
        ],
        geoms: vec![
            geom(GeomKind::Cube, 0, Vector3::zero(), Vector3::from_one(10.0)),
            geom(
                GeomKind::Cube,
                1,
                Vector3::new(0.0, 4.8, -2.0),
                Vector3::new(3.0, 0.2, 3.0),
            ),
            geom(
                GeomKind::Sphere,
                2,
                Vector3::new(0.5, -2.0, -3.0),
                Vector3::from_one(2.0),
            ),
        ],
        settings: RenderSettings {
            trace_depth,
            compact_paths,
            ..RenderSettings::default()
        },
    }
}

fn no_denoise() -> DenoiseSettings {
    DenoiseSettings::default()
}

#[test]
fn emissive_sphere_fills_image_after_one_iteration() {
    let mut session = RenderSession::init(light_sphere_scene(1)).unwrap();
    session.render_iteration(0, 1, &no_denoise()).unwrap();

    let expected = Color::new(1.0, 0.5, 2.0);
    assert_eq!(session.accumulation().len(), (WIDTH * HEIGHT) as usize);
    for pixel in session.accumulation() {
        assert_eq!(*pixel, expected);
    }
}

#[test]
fn single_bounce_in_diffuse_enclosure_keeps_albedo() {
    let scene = Scene {
        camera: camera(),
        materials: vec![Material::diffuse(Color::new(0.5, 0.5, 0.5))],
        geoms: vec![geom(
            GeomKind::Sphere,
            0,
            Vector3::zero(),
            Vector3::from_one(100.0),
        )],
        settings: settings(1),
    };
    let mut session = RenderSession::init(scene).unwrap();
    session.render_iteration(0, 1, &no_denoise()).unwrap();

    for pixel in session.accumulation() {
        assert_eq!(*pixel, Color::new(0.5, 0.5, 0.5));
    }
    assert!(session.paths().iter().all(|p| p.is_terminated()));
}

#[test]
fn empty_scene_stays_black() {
    let mut session = RenderSession::init(empty_scene(4)).unwrap();
    for iteration in 1..=3 {
        session.render_iteration(0, iteration, &no_denoise()).unwrap();
    }
    assert!(session.accumulation().iter().all(|c| *c == BLACK));
    assert!(session.gbuffer().iter().all(|g| g.t == -1.0));
    assert!(session.paths().iter().all(|p| p.color == BLACK));
}

#[test]
fn deterministic_iterations_accumulate_linearly() {
    let mut session = RenderSession::init(light_sphere_scene(4)).unwrap();
    session.render_iteration(0, 1, &no_denoise()).unwrap();
    let single: Vec<Color> = session.accumulation().to_vec();
    session.render_iteration(0, 2, &no_denoise()).unwrap();

    for (twice, once) in session.accumulation().iter().zip(single.iter()) {
        assert_eq!(*twice, once.mul_s(2.0));
    }
}

#[test]
fn every_path_terminates() {
    for compact in [false, true] {
        let mut session = RenderSession::init(room_scene(5, compact)).unwrap();
        for iteration in 1..=2 {
            session.render_iteration(0, iteration, &no_denoise()).unwrap();
            assert!(session.paths().iter().all(|p| p.remaining_bounces == 0));
        }
    }
}

#[test]
fn accumulation_is_never_negative() {
    let mut session = RenderSession::init(room_scene(6, false)).unwrap();
    for iteration in 1..=4 {
        session.render_iteration(0, iteration, &no_denoise()).unwrap();
    }
    let mut lit = 0;
    for c in session.accumulation() {
        assert!(c.red >= 0.0 && c.green >= 0.0 && c.blue >= 0.0);
        if c.red > 0.0 {
            lit += 1;
        }
    }
    assert!(lit > 0, "no path reached the light");
}

#[test]
fn compaction_does_not_change_the_image() {
    let mut plain = RenderSession::init(room_scene(5, false)).unwrap();
    let mut compacted = RenderSession::init(room_scene(5, true)).unwrap();
    for iteration in 1..=3 {
        plain.render_iteration(0, iteration, &no_denoise()).unwrap();
        compacted.render_iteration(0, iteration, &no_denoise()).unwrap();
    }
    assert_eq!(plain.accumulation(), compacted.accumulation());
    assert_eq!(plain.gbuffer(), compacted.gbuffer());
    for (i, path) in compacted.paths().iter().enumerate() {
        assert_eq!(path.pixel_index, i);
    }
}

#[test]
fn gbuffer_depends_only_on_first_bounce() {
    let mut session = RenderSession::init(room_scene(5, false)).unwrap();
    session.render_iteration(0, 1, &no_denoise()).unwrap();
    let first = session.gbuffer().to_vec();
    session.render_iteration(0, 2, &no_denoise()).unwrap();
    assert_eq!(session.gbuffer(), &first[..]);

    let mut other = RenderSession::init(room_scene(5, false)).unwrap();
    other.render_iteration(0, 1, &no_denoise()).unwrap();
    assert_eq!(other.gbuffer(), &first[..]);

    // Inside a closed room every primary ray hits something.
    assert!(first.iter().all(|g| g.t > 0.0));
    assert!(first
        .iter()
        .all(|g| (g.normal.length() - 1.0).abs() < 1e-4));
}

#[test]
fn disabled_denoise_shows_the_plain_average() {
    let mut session = RenderSession::init(room_scene(4, false)).unwrap();
    for iteration in 1..=3 {
        session.render_iteration(0, iteration, &no_denoise()).unwrap();
    }
    assert_eq!(session.denoised_iteration(), None);

    let image = session.show_image();
    assert_eq!(image, session.show_denoised());

    for (i, pixel) in image.pixels().enumerate() {
        let c = session.accumulation()[i];
        let expected = |v: f32| (v * (1.0f32 / 3.0) * 255.0).max(0.0).min(255.0) as u8;
        assert_eq!(pixel.0[0], expected(c.red));
        assert_eq!(pixel.0[1], expected(c.green));
        assert_eq!(pixel.0[2], expected(c.blue));
        assert_eq!(pixel.0[3], 255);
    }
}

#[test]
fn enabled_denoise_produces_a_filtered_image() {
    let mut session = RenderSession::init(room_scene(4, false)).unwrap();
    let denoise = DenoiseSettings {
        enabled: true,
        filter_size: 20,
        ..DenoiseSettings::default()
    };
    session.render_iteration(0, 1, &no_denoise()).unwrap();
    session.render_iteration(0, 2, &denoise).unwrap();

    assert_eq!(session.denoised_iteration(), Some(2));
    assert!(session
        .denoised()
        .iter()
        .all(|c| c.red >= 0.0 && c.green >= 0.0 && c.blue >= 0.0 && c.red.is_finite()));
    assert_ne!(session.denoised(), session.accumulation());

    // A later undenoised iteration falls back to the plain average.
    session.render_iteration(0, 3, &no_denoise()).unwrap();
    assert_eq!(session.show_denoised(), session.show_image());
}

#[test]
fn iterations_must_be_sequential() {
    let mut session = RenderSession::init(empty_scene(2)).unwrap();
    match session.render_iteration(0, 2, &no_denoise()) {
        Err(Error::IterationOutOfOrder { expected, got }) => {
            assert_eq!(expected, 1);
            assert_eq!(got, 2);
        }
        other => panic!("unexpected result {:?}", other),
    }
    session.render_iteration(0, 1, &no_denoise()).unwrap();
    assert_eq!(session.iterations(), 1);
}

#[test]
fn reset_restarts_accumulation() {
    let mut session = RenderSession::init(light_sphere_scene(1)).unwrap();
    session.render_iteration(0, 1, &no_denoise()).unwrap();
    session.render_iteration(0, 2, &no_denoise()).unwrap();
    session.reset();
    assert_eq!(session.iterations(), 0);
    assert!(session.accumulation().iter().all(|c| *c == BLACK));

    session.render_iteration(0, 1, &no_denoise()).unwrap();
    assert_eq!(session.accumulation()[0], Color::new(1.0, 0.5, 2.0));
    session.teardown();
}

#[test]
fn invalid_scenes_are_rejected() {
    let mut scene = light_sphere_scene(0);
    assert!(matches!(
        RenderSession::init(scene.clone()),
        Err(Error::InvalidScene(_))
    ));

    scene.settings.trace_depth = 1;
    scene.geoms[0].material_id = 3;
    assert!(matches!(
        RenderSession::init(scene.clone()),
        Err(Error::InvalidScene(_))
    ));

    let mut flat = empty_scene(1);
    flat.camera = Camera::look_at(
        WIDTH,
        HEIGHT,
        Vector3::zero(),
        Vector3::new(0.0, 1.0, 0.0),
        Vector3::new(0.0, 1.0, 0.0),
        45.0,
    );
    assert!(matches!(
        RenderSession::init(flat),
        Err(Error::InvalidScene(_))
    ));
}

#[test]
fn gbuffer_views_render_for_every_attribute() {
    let mut session = RenderSession::init(room_scene(2, false)).unwrap();
    session.render_iteration(0, 1, &no_denoise()).unwrap();
    for view in GBufferView::ALL.iter() {
        let image = session.show_gbuffer(*view);
        assert_eq!(image.dimensions(), (WIDTH, HEIGHT));
    }
}

#[test]
fn image_saves_as_png() {
    let mut session = RenderSession::init(light_sphere_scene(1)).unwrap();
    session.render_iteration(0, 1, &no_denoise()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.png");
    session.show_image().save(&path).unwrap();

    let loaded = image::open(&path).unwrap().to_rgba8();
    assert_eq!(loaded.dimensions(), (WIDTH, HEIGHT));
    assert_eq!(loaded.get_pixel(3, 3).0, [255, 127, 255, 255]);
}
