//! Planar geometry helpers shared by the normalizer and the metrics.

use crate::error::GeometryError;
use crate::types::Point2D;

/// Euclidean distance between two points.
#[must_use]
pub fn distance(p1: Point2D, p2: Point2D) -> f32 {
    let dx = p1.x - p2.x;
    let dy = p1.y - p2.y;
    dx.mul_add(dx, dy * dy).sqrt()
}

/// Angle in degrees at vertex `b`, between rays `b -> a` and `b -> c`.
///
/// Uses the law of cosines on the triangle with sides `a = |B,C|`,
/// `b = |A,C|`, `c = |A,B|`. The cosine is clamped to `[-1, 1]` before
/// inversion so rounding never yields NaN; collinear points give 0 or 180.
///
/// # Errors
///
/// Returns [`GeometryError::DegenerateTriangle`] when either ray from the
/// vertex has zero length.
pub fn angle_at(a: Point2D, b: Point2D, c: Point2D) -> Result<f32, GeometryError> {
    let side_a = distance(b, c);
    let side_b = distance(a, c);
    let side_c = distance(a, b);

    let denom = 2.0 * side_a * side_c;
    if denom == 0.0 {
        return Err(GeometryError::DegenerateTriangle);
    }

    let cos = (side_a * side_a + side_c * side_c - side_b * side_b) / denom;
    Ok(cos.clamp(-1.0, 1.0).acos().to_degrees())
}

/// Mean position of `points`, or `None` when empty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn centroid(points: &[Point2D]) -> Option<Point2D> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f32;
    let (sx, sy) = points
        .iter()
        .fold((0.0_f32, 0.0_f32), |(sx, sy), p| (sx + p.x, sy + p.y));
    Some(Point2D::new(sx / n, sy / n))
}

/// Mean distance of `points` to `center`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mean_spread(points: &[Point2D], center: Point2D) -> f32 {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|&p| distance(p, center)).sum::<f32>() / points.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_distance() {
        let d = distance(Point2D::new(0.0, 0.0), Point2D::new(3.0, 4.0));
        assert_abs_diff_eq!(d, 5.0, epsilon = 1e-6);
        assert_eq!(distance(Point2D::new(1.0, 1.0), Point2D::new(1.0, 1.0)), 0.0);
    }

    #[test]
    fn test_right_angle() {
        let angle = angle_at(
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 1.0),
        )
        .unwrap();
        assert_abs_diff_eq!(angle, 90.0, epsilon = 1e-3);
    }

    #[test]
    fn test_angle_is_measured_at_middle_point() {
        // 30-60-90 triangle: vertex B carries 60 degrees, vertex C carries 30.
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(1.0, 0.0);
        let c = Point2D::new(0.0, 3.0_f32.sqrt());
        assert_abs_diff_eq!(angle_at(a, b, c).unwrap(), 60.0, epsilon = 1e-3);
        assert_abs_diff_eq!(angle_at(b, c, a).unwrap(), 30.0, epsilon = 1e-3);
    }

    #[test]
    fn test_straight_and_folded_lines() {
        let straight = angle_at(
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 10.0),
            Point2D::new(0.0, 20.0),
        )
        .unwrap();
        assert_abs_diff_eq!(straight, 180.0, epsilon = 1e-3);

        let folded = angle_at(
            Point2D::new(0.0, 20.0),
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 10.0),
        )
        .unwrap();
        assert_abs_diff_eq!(folded, 0.0, epsilon = 1e-2);
    }

    #[test]
    fn test_coincident_vertex_is_degenerate() {
        let p = Point2D::new(5.0, 5.0);
        assert_eq!(
            angle_at(p, p, Point2D::new(1.0, 1.0)),
            Err(GeometryError::DegenerateTriangle)
        );
        assert_eq!(angle_at(p, p, p), Err(GeometryError::DegenerateTriangle));
    }

    #[test]
    fn test_near_collinear_never_nan() {
        let angle = angle_at(
            Point2D::new(0.0, 0.0),
            Point2D::new(1e-3, 1e3),
            Point2D::new(2e-3, 2e3),
        )
        .unwrap();
        assert!(angle.is_finite());
    }

    #[test]
    fn test_centroid_and_spread() {
        let pts = [
            Point2D::new(-1.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(0.0, -1.0),
        ];
        let c = centroid(&pts).unwrap();
        assert_abs_diff_eq!(c.x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(c.y, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(mean_spread(&pts, c), 1.0, epsilon = 1e-6);
        assert!(centroid(&[]).is_none());
    }
}
