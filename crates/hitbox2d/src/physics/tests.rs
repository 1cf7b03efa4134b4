//! End-to-end collision scenarios and properties

use approx::assert_relative_eq;

use super::collision::{ConvexPolygon, Hitbox};
use crate::foundation::math::{ModelMatrix, Transform2D, Vec2};
use crate::physics::collision::BoundingBox;
use crate::spatial::{SpatialHashGrid, SpatialQuery};

fn placed(mut polygon: ConvexPolygon, transform: &Transform2D) -> ConvexPolygon {
    polygon.transform(&transform.to_matrix());
    polygon
}

fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> ConvexPolygon {
    placed(
        ConvexPolygon::rectangle(x0, y0, x1 - x0, y1 - y0).unwrap(),
        &Transform2D::identity(),
    )
}

fn circle(center: Vec2) -> ConvexPolygon {
    placed(
        ConvexPolygon::regular(center, 300.0, 200).unwrap(),
        &Transform2D::identity(),
    )
}

/// Shapes used by the property checks, covering rectangles, rotated quads,
/// triangles and circle approximations
fn shape_set() -> Vec<ConvexPolygon> {
    let rotated = |angle: f32, position: Vec2| {
        placed(
            ConvexPolygon::rectangle(-20.0, -10.0, 40.0, 20.0).unwrap(),
            &Transform2D::from_position(position).with_rotation(angle, Vec2::zeros()),
        )
    };
    let triangle = |position: Vec2| {
        placed(
            ConvexPolygon::from_flat(&[0.0, 0.0, 30.0, 0.0, 10.0, 25.0]).unwrap(),
            &Transform2D::from_position(position),
        )
    };
    let hexagon = |position: Vec2| {
        placed(
            ConvexPolygon::regular(Vec2::zeros(), 15.0, 6).unwrap(),
            &Transform2D::from_position(position),
        )
    };

    vec![
        rect(0.0, 0.0, 40.0, 40.0),
        rect(30.0, 10.0, 70.0, 30.0),
        rotated(30.0, Vec2::new(50.0, 50.0)),
        rotated(-75.0, Vec2::new(20.0, 60.0)),
        triangle(Vec2::new(35.0, 35.0)),
        triangle(Vec2::new(200.0, 0.0)),
        hexagon(Vec2::new(60.0, 20.0)),
        hexagon(Vec2::new(-100.0, -100.0)),
    ]
}

#[test]
fn test_far_apart_rectangles_do_not_collide() {
    let a = rect(-150.0, 0.0, 150.0, 500.0);
    let b = rect(450.0, 450.0, 750.0, 750.0);

    assert!(!a.is_colliding(&b).unwrap());
    assert!(a.is_colliding_mtv(&b).unwrap().is_none());
}

#[test]
fn test_overlapping_rectangles_collide() {
    let a = rect(-150.0, 0.0, 150.0, 500.0);
    let b = rect(0.0, 100.0, 300.0, 400.0);

    assert!(a.is_colliding(&b).unwrap());
    let mtv = a.is_colliding_mtv(&b).unwrap().unwrap();
    // 150 units of overlap along x beats 300 along y
    assert_relative_eq!(mtv, Vec2::new(-150.0, 0.0), epsilon = 1e-3);
}

#[test]
fn test_far_apart_circles_do_not_collide() {
    let a = circle(Vec2::new(100.0, 100.0));
    let b = circle(Vec2::new(700.0, 700.0));

    assert!(!a.is_colliding(&b).unwrap());
    assert!(a.is_colliding_mtv(&b).unwrap().is_none());
}

#[test]
fn test_overlapping_circles_push_apart_along_x() {
    let a = circle(Vec2::new(100.0, 100.0));
    let b = circle(Vec2::new(400.0, 100.0));

    assert!(a.is_colliding(&b).unwrap());
    let mtv = a.is_colliding_mtv(&b).unwrap().unwrap();

    // The 200-gon's apothem is 300 * cos(0.9 deg), slightly under the radius
    assert_relative_eq!(mtv.norm(), 300.0, epsilon = 0.5);
    assert!(mtv.x < -299.0);
    assert!(mtv.y.abs() < 10.0);
}

#[test]
fn test_grid_client_spans_four_cells() {
    let mut grid: SpatialHashGrid<BoundingBox> =
        SpatialHashGrid::new(Vec2::zeros(), Vec2::new(1000.0, 1000.0), 10, 10).unwrap();
    let handle = grid.add(BoundingBox::new(95.0, 95.0, 10.0, 10.0));

    for (ix, iy) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
        assert!(grid.cell(ix, iy).unwrap().contains(&handle));
    }
    assert!(!grid.cell(2, 1).unwrap().contains(&handle));
}

#[test]
fn test_transform_twice_is_idempotent() {
    let mut hitbox = ConvexPolygon::rectangle(-10.0, -5.0, 20.0, 10.0).unwrap();
    let matrix = Transform2D::from_position(Vec2::new(250.0, -40.0))
        .with_rotation(72.5, Vec2::new(3.0, 2.0))
        .with_scale(Vec2::new(1.5, 0.75))
        .to_matrix();

    hitbox.transform(&matrix);
    let first = hitbox.transformed_points().unwrap().to_vec();
    hitbox.transform(&matrix);
    assert_eq!(hitbox.transformed_points().unwrap(), first.as_slice());
}

#[test]
fn test_collision_is_symmetric() {
    let shapes = shape_set();
    for a in &shapes {
        for b in &shapes {
            assert_eq!(a.is_colliding(b).unwrap(), b.is_colliding(a).unwrap());
            assert_eq!(
                a.is_colliding_mtv(b).unwrap().is_some(),
                b.is_colliding_mtv(a).unwrap().is_some()
            );
        }
    }
}

/// Copy of `polygon`'s world points moved by `delta`
fn shifted(polygon: &ConvexPolygon, delta: Vec2) -> ConvexPolygon {
    let world: Vec<f32> = polygon
        .transformed_points()
        .unwrap()
        .iter()
        .flat_map(|p| [p.x, p.y])
        .collect();
    placed(
        ConvexPolygon::from_flat(&world).unwrap(),
        &Transform2D::from_position(delta),
    )
}

#[test]
fn test_applying_mtv_separates_shapes() {
    let diamond = placed(
        ConvexPolygon::rectangle(-10.0, -10.0, 20.0, 20.0).unwrap(),
        &Transform2D::from_position(Vec2::new(45.0, 45.0)).with_rotation(45.0, Vec2::zeros()),
    );
    let triangle = placed(
        ConvexPolygon::from_flat(&[0.0, 0.0, 30.0, 0.0, 10.0, 25.0]).unwrap(),
        &Transform2D::from_position(Vec2::new(35.0, 35.0)),
    );
    let pairs = [
        (rect(0.0, 0.0, 40.0, 40.0), rect(30.0, 10.0, 70.0, 50.0)),
        (rect(0.0, 0.0, 40.0, 40.0), triangle),
        (rect(0.0, 0.0, 40.0, 40.0), diamond),
        (circle(Vec2::new(100.0, 100.0)), circle(Vec2::new(400.0, 100.0))),
    ];

    for (a, b) in &pairs {
        let mtv = a.is_colliding_mtv(b).unwrap().unwrap();
        let moved = shifted(a, mtv);

        // Pushed exactly to the boundary: touching, with no depth left
        if let Some(remaining) = moved.is_colliding_mtv(b).unwrap() {
            assert!(
                remaining.norm() < 1e-2,
                "mtv {mtv:?} left {remaining:?} of overlap"
            );
        }

        // A little further and the shapes are apart
        let nudged = shifted(a, mtv * 1.01);
        assert!(!nudged.is_colliding(b).unwrap());
    }
}

#[test]
fn test_touching_polygons_collide() {
    let a = rect(0.0, 0.0, 10.0, 10.0);
    let edge = rect(10.0, 0.0, 20.0, 10.0);
    let corner = rect(10.0, 10.0, 20.0, 20.0);

    assert!(a.is_colliding(&edge).unwrap());
    assert!(a.is_colliding(&corner).unwrap());
    assert!(a.is_colliding_mtv(&corner).unwrap().is_some());
}

#[test]
fn test_mixed_hitboxes_resolve_through_enum() {
    let mut square = Hitbox::rectangle(0.0, 0.0, 10.0, 10.0).unwrap();
    square.transform(&ModelMatrix::identity());
    let mut ball = Hitbox::circle(Vec2::zeros(), 2.0).unwrap();
    ball.transform(&Transform2D::from_position(Vec2::new(5.0, 11.0)).to_matrix());

    let mtv = ball.is_colliding_mtv(&square).unwrap().unwrap();
    assert_relative_eq!(mtv, Vec2::new(0.0, 1.0), epsilon = 1e-4);
}
