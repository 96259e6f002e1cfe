use super::*;
use crate::card::model::{SceneDef, TitleDef};
use crate::choreo::music::MusicState;
use crate::eval::evaluator::{MusicView, SurpriseState, WishBoxView};
use crate::foundation::core::FrameIndex;
use crate::render::overlay::UiLayout;
use crate::store::card_store::CardStore;

fn renderer() -> CpuRenderer {
    let canvas = Canvas {
        width: 320,
        height: 240,
    };
    let scene = SceneDef {
        tree_particles: 2_000,
        topper_particles: 200,
        surprise_particles: 300,
        snow_particles: 100,
        wish_particles: 30,
        ..SceneDef::default()
    };
    let overlay = Overlay::new(
        UiLayout {
            canvas,
            pixel_ratio: 1.0,
        },
        TitleDef::default(),
        Arc::new(usvg::fontdb::Database::new()),
    );
    CpuRenderer::new(
        canvas,
        Arc::new(Fields::generate(7, &scene)),
        overlay,
        RenderSettings::default(),
    )
}

fn state(t: f64) -> FrameState {
    FrameState {
        frame: FrameIndex(0),
        time: t,
        store: CardStore::default(),
        scene_rotation: 0.0,
        camera_azimuth: 0.0,
        tree_boost: 0.0,
        wish: None,
        surprise: None,
        video: None,
        music: MusicView {
            state: MusicState::Paused,
            position: 0.0,
            lyric: None,
        },
        wish_box: WishBoxView {
            text: String::new(),
            send_disabled: true,
        },
    }
}

fn brightness(f: &FrameRGBA) -> u64 {
    f.data
        .chunks_exact(4)
        .map(|p| u64::from(p[0]) + u64::from(p[1]) + u64::from(p[2]))
        .sum()
}

#[test]
fn renders_opaque_frames_at_canvas_size() {
    let f = renderer().render(&state(1.0), None).unwrap();
    assert_eq!((f.width, f.height), (320, 240));
    assert!(f.data.chunks_exact(4).all(|p| p[3] == 255));
}

#[test]
fn rendering_is_deterministic() {
    let r = renderer();
    let a = r.render(&state(2.5), None).unwrap();
    let b = r.render(&state(2.5), None).unwrap();
    assert_eq!(a, b);
}

#[test]
fn tree_is_brighter_than_the_empty_corners() {
    let f = renderer().render(&state(0.0), None).unwrap();
    let px = |x: usize, y: usize| u32::from(f.data[(y * 320 + x) * 4]);
    assert!(px(160, 120) > px(1, 1));
}

#[test]
fn boost_brightens_the_tree() {
    let r = renderer();
    let calm = r.render(&state(1.0), None).unwrap();
    let mut boosted = state(1.0);
    boosted.tree_boost = 1.0;
    let boosted = r.render(&boosted, None).unwrap();
    assert!(brightness(&boosted) > brightness(&calm));
}

#[test]
fn invisible_surprise_draws_nothing() {
    let r = renderer();
    let plain = r.render(&state(1.0), None).unwrap();
    let mut s = state(1.0);
    s.surprise = Some(SurpriseState {
        opacity: 0.0,
        boost: 2.0,
        explosion: 0.0,
        rotation: 0.0,
    });
    assert_eq!(r.render(&s, None).unwrap(), plain);

    s.surprise = Some(SurpriseState {
        opacity: 1.0,
        boost: 2.0,
        explosion: 0.0,
        rotation: 0.0,
    });
    assert!(brightness(&r.render(&s, None).unwrap()) > brightness(&plain));
}

#[test]
fn inner_tree_particles_keep_their_color() {
    let p = TreeParticle {
        pos: Vec3::ZERO,
        color: Rgb::new(0.3, 0.2, 0.1),
        size: 0.1,
        phase: 0.0,
        height_factor: 1.0,
        outer: false,
    };
    assert_eq!(tree_tint(&p, 3), p.color);
    let tints: Vec<Rgb> = (0..200)
        .map(|i| tree_tint(&TreeParticle { outer: true, ..p }, i))
        .collect();
    assert!(tints.contains(&TREE_LIGHT_PINK));
    assert!(tints.contains(&TREE_GOLD));
    assert!(tints.contains(&p.color));
}

#[test]
fn sparkle_stays_in_range() {
    for i in 0..50 {
        let s = sparkle(i, sparkle_tick(1.234));
        assert!((0.7..=1.0).contains(&s));
    }
}
