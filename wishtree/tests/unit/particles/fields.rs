use super::*;

fn small_scene() -> SceneDef {
    SceneDef {
        tree_particles: 2_000,
        topper_particles: 500,
        surprise_particles: 600,
        snow_particles: 300,
        wish_particles: 150,
        ..SceneDef::default()
    }
}

#[test]
fn generation_is_deterministic_per_seed() {
    let a = Fields::generate(42, &small_scene());
    let b = Fields::generate(42, &small_scene());
    let c = Fields::generate(43, &small_scene());
    assert_eq!(a.tree, b.tree);
    assert_eq!(a.snow, b.snow);
    assert_ne!(a.tree[0].pos, c.tree[0].pos);
}

#[test]
fn counts_follow_scene_knobs() {
    let f = Fields::generate(1, &small_scene());
    assert_eq!(f.tree.len(), 2_000);
    assert_eq!(f.topper.len(), 500);
    assert_eq!(f.surprise.len(), 600);
    assert_eq!(f.snow.len(), 300);
    assert_eq!(f.wish.len(), 150);
    let ring_counts: Vec<usize> = f.rings.iter().map(|r| r.points.len()).collect();
    assert_eq!(ring_counts, vec![200, 250, 300]);
    assert_eq!(f.point_count(), 2_000 + 500 + 600 + 300 + 150 + 750);
}

#[test]
fn tree_particles_fill_the_cone() {
    let f = Fields::generate(7, &small_scene());
    for p in &f.tree {
        assert!((-5.0..=5.0).contains(&p.pos.y));
        let y_n = (p.pos.y + 5.0) / TREE_HEIGHT;
        let level = TREE_MAX_RADIUS * (1.0 - y_n);
        let r = (p.pos.x * p.pos.x + p.pos.z * p.pos.z).sqrt();
        assert!(r <= level + 1e-3);
        assert!((0.05..=0.25).contains(&p.size));
        assert!((p.height_factor - (1.0 - y_n)).abs() < 1e-4);
    }
    let outer = f.tree.iter().filter(|p| p.outer).count();
    // sqrt radial sampling puts about half the points in the outer 30% of the radius.
    assert!(outer > 700 && outer < 1_300, "outer = {outer}");
}

#[test]
fn hearts_have_expected_extent_and_density() {
    let f = Fields::generate(3, &small_scene());
    for p in &f.topper {
        assert!(p.pos.x.abs() <= 16.0 * 0.08 + 1e-4);
        assert!(p.pos.z.abs() <= 0.25 + 1e-4);
        assert!((0.0..=1.0).contains(&p.density));
        assert!((0.1..=0.25).contains(&p.size));
    }
    for p in &f.surprise {
        assert!(p.pos.x.abs() <= 16.0 * 0.12 + 1e-4);
        assert!((0.1..=0.4).contains(&p.size));
    }
    let white = f.surprise.iter().filter(|p| p.color == Rgb::WHITE).count();
    assert!(white > 60 && white < 200, "white = {white}");
}

#[test]
fn snow_and_wish_stay_in_bounds() {
    let f = Fields::generate(9, &small_scene());
    for s in &f.snow {
        assert!(s.pos.x.abs() <= 15.0 && s.pos.y.abs() <= 15.0 && s.pos.z.abs() <= 15.0);
        assert!((0.5..=2.0).contains(&s.speed));
    }
    for w in &f.wish {
        assert!(w.pos.length() <= WISH_RADIUS + 1e-4);
    }
}

#[test]
fn burst_offsets_vary_per_wish_and_stay_in_range() {
    let f = Fields::generate(5, &small_scene());
    let mut differs = false;
    for i in 0..f.wish.len() {
        let a = f.wish_burst_offset(0, i);
        let b = f.wish_burst_offset(1, i);
        if f.wish[i].pos.length() > 1e-3 {
            assert!((2.0..=7.0 + 1e-4).contains(&a.length()));
        }
        differs |= a != b;
    }
    assert!(differs);
    assert_eq!(f.wish_burst_offset(0, 10_000), Vec3::ZERO);
}

#[test]
fn heart_curve_top_cusp() {
    let (x, y) = heart_curve(0.0);
    assert!(x.abs() < 1e-6);
    assert!((y - 5.0).abs() < 1e-5);
}
