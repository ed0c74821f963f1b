// Small 2D helpers shared by the systems.

use glam::Vec2;
use std::f32::consts::{PI, TAU};

/// Wraps an angle into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let mut a = angle % TAU;
    if a <= -PI {
        a += TAU;
    } else if a > PI {
        a -= TAU;
    }
    a
}

fn cross(o: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a - o).perp_dot(b - o)
}

/// Convex hull by Andrew's monotone chain, counter-clockwise, without collinear points.
/// Inputs with fewer than three points come back sorted but otherwise unchanged.
pub fn convex_hull(points: &[Vec2]) -> Vec<Vec2> {
    let mut pts: Vec<Vec2> = points.to_vec();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Vec2> = Vec::with_capacity(pts.len());
    for p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], *p) <= 0.0
        {
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<Vec2> = Vec::with_capacity(pts.len());
    for p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], *p) <= 0.0
        {
            upper.pop();
        }
        upper.push(*p);
    }

    // Last point of each chain is the first point of the other.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Distance along a ray to the first intersection with a circle, if it lies within `max_len`.
/// A ray starting inside the circle hits at distance 0.
pub fn ray_circle_hit(
    origin: Vec2,
    dir: Vec2,
    max_len: f32,
    center: Vec2,
    radius: f32,
) -> Option<f32> {
    let to_center = center - origin;
    let along = to_center.dot(dir);
    let closest_sq = to_center.length_squared() - along * along;
    let r_sq = radius * radius;
    if closest_sq > r_sq {
        return None;
    }
    let half_chord = (r_sq - closest_sq).sqrt();
    let near = along - half_chord;
    let far = along + half_chord;
    if far < 0.0 {
        return None;
    }
    let t = near.max(0.0);
    (t <= max_len).then_some(t)
}

/// Whether a circle touches a convex, counter-clockwise polygon.
pub fn circle_overlaps_convex(poly: &[Vec2], center: Vec2, radius: f32) -> bool {
    if poly.len() < 3 {
        return false;
    }
    let r_sq = radius * radius;
    let mut inside = true;
    for i in 0..poly.len() {
        let a = poly[i];
        let edge = poly[(i + 1) % poly.len()] - a;
        let rel = center - a;
        if edge.perp_dot(rel) < 0.0 {
            inside = false;
        }
        let len_sq = edge.length_squared();
        if len_sq <= f32::EPSILON {
            continue;
        }
        let t = (rel.dot(edge) / len_sq).clamp(0.0, 1.0);
        if (a + edge * t).distance_squared(center) <= r_sq {
            return true;
        }
    }
    inside
}

#[cfg(test)]
pub(crate) fn point_in_convex(poly: &[Vec2], p: Vec2, eps: f32) -> bool {
    // Hull is counter-clockwise, so every edge must have the point on its left.
    (0..poly.len()).all(|i| {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        let scale = (b - a).length() * (p - a).length().max(1.0);
        (b - a).perp_dot(p - a) >= -eps * scale
    })
}

#[cfg(test)]
pub(crate) fn is_simple_polygon(poly: &[Vec2]) -> bool {
    fn segments_cross(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
        let d1 = (b - a).perp_dot(c - a);
        let d2 = (b - a).perp_dot(d - a);
        let d3 = (d - c).perp_dot(a - c);
        let d4 = (d - c).perp_dot(b - c);
        d1 * d2 < 0.0 && d3 * d4 < 0.0
    }

    let n = poly.len();
    for i in 0..n {
        for j in (i + 1)..n {
            // Adjacent edges share a vertex and cannot properly cross.
            if j == i + 1 || (i == 0 && j == n - 1) {
                continue;
            }
            if segments_cross(poly[i], poly[(i + 1) % n], poly[j], poly[(j + 1) % n]) {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn when_square_has_interior_point_then_hull_drops_it() {
        let pts = [
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
            Vec2::new(2.0, 2.0),
        ];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&Vec2::new(2.0, 2.0)));
    }

    #[test]
    fn when_points_are_collinear_then_hull_has_fewer_than_three_points() {
        let pts = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)];
        assert!(convex_hull(&pts).len() < 3);
    }

    #[test]
    fn when_ray_points_at_circle_then_hit_is_at_near_edge() {
        let hit = ray_circle_hit(Vec2::ZERO, Vec2::X, 100.0, Vec2::new(50.0, 0.0), 10.0);
        assert_eq!(hit, Some(40.0));
    }

    #[test]
    fn when_circle_is_behind_or_out_of_reach_then_ray_misses() {
        assert_eq!(
            ray_circle_hit(Vec2::ZERO, Vec2::X, 100.0, Vec2::new(-50.0, 0.0), 10.0),
            None
        );
        assert_eq!(
            ray_circle_hit(Vec2::ZERO, Vec2::X, 30.0, Vec2::new(50.0, 0.0), 10.0),
            None
        );
        assert_eq!(
            ray_circle_hit(Vec2::ZERO, Vec2::X, 100.0, Vec2::new(50.0, 20.0), 10.0),
            None
        );
    }

    #[test]
    fn when_circle_is_inside_touching_or_clear_of_square_then_overlap_matches() {
        let square = convex_hull(&[
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(10.0, 10.0),
            Vec2::new(0.0, 10.0),
        ]);
        assert!(circle_overlaps_convex(&square, Vec2::new(5.0, 5.0), 1.0));
        assert!(circle_overlaps_convex(&square, Vec2::new(12.0, 5.0), 2.5));
        assert!(!circle_overlaps_convex(&square, Vec2::new(14.0, 5.0), 2.5));
        assert!(!circle_overlaps_convex(&square, Vec2::new(12.5, 12.5), 3.0));
    }

    #[test]
    fn when_angle_overflows_then_it_wraps_into_half_open_range() {
        assert!((wrap_angle(2.5 * PI) - 0.5 * PI).abs() < 1e-5);
        assert!((wrap_angle(-0.5 * PI) + 0.5 * PI).abs() < 1e-6);
        assert!((wrap_angle(TAU + 0.25) - 0.25).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn hull_is_simple_and_contains_every_input(
            raw in proptest::collection::vec((-500.0f32..500.0, -500.0f32..500.0), 3..40)
        ) {
            let pts: Vec<Vec2> = raw.iter().map(|(x, y)| Vec2::new(*x, *y)).collect();
            let hull = convex_hull(&pts);
            prop_assume!(hull.len() >= 3);

            prop_assert!(is_simple_polygon(&hull));
            for p in &pts {
                prop_assert!(point_in_convex(&hull, *p, 1e-4));
            }
        }
    }
}
