//! Geometry primitives shared by selection, hit-testing and mutation.
//!
//! Angles are in degrees, measured clockwise in screen space (y grows down).

use kurbo::{Affine, CubicBez, Line, ParamCurve, ParamCurveNearest, Point, Rect};

/// Accuracy used when projecting a point onto a bezier segment.
const NEAREST_ACCURACY: f64 = 1e-3;

/// Rotate a point around `center` by `degrees` (clockwise on screen).
pub fn rotate_point(point: Point, degrees: f64, center: Point) -> Point {
    if degrees == 0.0 {
        return point;
    }
    Affine::rotate_about(degrees.to_radians(), center) * point
}

/// Normalize an angle into `[0, 360)`.
pub fn normalize_degrees(degrees: f64) -> f64 {
    let d = degrees % 360.0;
    if d < 0.0 { d + 360.0 } else { d }
}

/// Angle of `point` around `center`, clockwise from straight up, in `[0, 360)`.
pub fn calc_rotate(point: Point, center: Point) -> f64 {
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    if dx == 0.0 && dy == 0.0 {
        return 0.0;
    }
    normalize_degrees(dx.atan2(-dy).to_degrees())
}

/// The four corners of a rect: top-left, top-right, bottom-right, bottom-left.
pub fn rect_to_points(rect: Rect) -> [Point; 4] {
    [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ]
}

/// Corners of a rect rotated about its own center.
pub fn rotated_corners(rect: Rect, rotate: f64) -> [Point; 4] {
    let center = rect.center();
    rect_to_points(rect).map(|p| rotate_point(p, rotate, center))
}

/// Axis-aligned bounds of a set of points.
pub fn points_to_rect(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let init = Rect::new(first.x, first.y, first.x, first.y);
    Some(points[1..].iter().fold(init, |r, p| r.union_pt(*p)))
}

/// Inclusive rect containment, with the rect rotated about its center.
pub fn point_in_rect(point: Point, rect: Rect, rotate: f64) -> bool {
    let p = if rotate == 0.0 {
        point
    } else {
        rotate_point(point, -rotate, rect.center())
    };
    p.x >= rect.x0 && p.x <= rect.x1 && p.y >= rect.y0 && p.y <= rect.y1
}

/// Whether `point` lies within `radius` of `target`.
pub fn hit_point(point: Point, target: Point, radius: f64) -> bool {
    let dx = point.x - target.x;
    let dy = point.y - target.y;
    dx * dx + dy * dy <= radius * radius
}

/// Whether `inner` lies entirely inside `outer`.
pub fn rect_in_rect(inner: Rect, outer: Rect) -> bool {
    inner.x0 >= outer.x0 && inner.x1 <= outer.x1 && inner.y0 >= outer.y0 && inner.y1 <= outer.y1
}

/// Union of a sequence of rects, `None` if empty.
pub fn union_rects(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects.into_iter().reduce(|acc, r| acc.union(r))
}

/// Rect spanned by two corner points, in any order.
pub fn rect_from_corners(a: Point, b: Point) -> Rect {
    Rect::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
}

/// One drawable segment of a line pen.
#[derive(Debug, Clone, Copy)]
pub enum Segment {
    Straight(Line),
    Curve(CubicBez),
}

impl Segment {
    /// Build the segment between two anchors given their outgoing/incoming handles.
    pub fn between(from: Point, from_next: Option<Point>, to_prev: Option<Point>, to: Point) -> Self {
        match (from_next, to_prev) {
            (None, None) => Segment::Straight(Line::new(from, to)),
            (c1, c2) => Segment::Curve(CubicBez::new(from, c1.unwrap_or(from), c2.unwrap_or(to), to)),
        }
    }

    /// Nearest point on this segment and its squared distance.
    fn nearest(&self, point: Point) -> (Point, f64) {
        match self {
            Segment::Straight(line) => {
                let n = line.nearest(point, NEAREST_ACCURACY);
                (line.eval(n.t), n.distance_sq)
            }
            Segment::Curve(cubic) => {
                let n = cubic.nearest(point, NEAREST_ACCURACY);
                (cubic.eval(n.t), n.distance_sq)
            }
        }
    }
}

/// Result of projecting a pointer onto a line pen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHit {
    /// Nearest point on the line.
    pub point: Point,
    /// Index of the segment hit; a new anchor belongs at `index + 1`.
    pub index: usize,
}

/// Nearest point on a chain of segments within `tolerance`, if any.
pub fn point_in_line(point: Point, segments: &[Segment], tolerance: f64) -> Option<LineHit> {
    let limit = tolerance * tolerance;
    let mut best: Option<(LineHit, f64)> = None;
    for (index, segment) in segments.iter().enumerate() {
        let (nearest, dist_sq) = segment.nearest(point);
        if dist_sq > limit {
            continue;
        }
        if best.as_ref().is_none_or(|(_, d)| dist_sq < *d) {
            best = Some((LineHit { point: nearest, index }, dist_sq));
        }
    }
    best.map(|(hit, _)| hit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_rotate_point_quarter_turn() {
        let p = rotate_point(Point::new(10.0, 0.0), 90.0, Point::ZERO);
        assert!(close(p, Point::new(0.0, 10.0)));
    }

    #[test]
    fn test_calc_rotate_cardinal_directions() {
        let c = Point::new(50.0, 50.0);
        assert!((calc_rotate(Point::new(50.0, 0.0), c) - 0.0).abs() < 1e-9);
        assert!((calc_rotate(Point::new(100.0, 50.0), c) - 90.0).abs() < 1e-9);
        assert!((calc_rotate(Point::new(50.0, 100.0), c) - 180.0).abs() < 1e-9);
        assert!((calc_rotate(Point::new(0.0, 50.0), c) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_calc_rotate_matches_rotate_point() {
        let c = Point::new(10.0, 10.0);
        let up = Point::new(10.0, -20.0);
        for deg in [15.0, 100.0, 200.0, 330.0] {
            let p = rotate_point(up, deg, c);
            assert!((calc_rotate(p, c) - deg).abs() < 1e-6);
        }
    }

    #[test]
    fn test_point_in_rotated_rect() {
        let rect = Rect::new(0.0, 40.0, 100.0, 60.0);
        // A point above the flat rect falls inside once it is stood upright.
        let p = Point::new(50.0, 5.0);
        assert!(!point_in_rect(p, rect, 0.0));
        assert!(point_in_rect(p, rect, 90.0));
    }

    #[test]
    fn test_point_in_rect_is_inclusive() {
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(point_in_rect(Point::new(10.0, 10.0), rect, 0.0));
        assert!(!point_in_rect(Point::new(10.1, 10.0), rect, 0.0));
    }

    #[test]
    fn test_hit_point() {
        assert!(hit_point(Point::new(3.0, 4.0), Point::ZERO, 5.0));
        assert!(!hit_point(Point::new(3.0, 4.1), Point::ZERO, 5.0));
    }

    #[test]
    fn test_union_rects() {
        let u = union_rects([Rect::new(0.0, 0.0, 10.0, 10.0), Rect::new(20.0, -5.0, 30.0, 5.0)]);
        assert_eq!(u, Some(Rect::new(0.0, -5.0, 30.0, 10.0)));
        assert_eq!(union_rects(Vec::new()), None);
    }

    #[test]
    fn test_point_in_line_picks_nearest_segment() {
        let segments = [
            Segment::between(Point::new(0.0, 0.0), None, None, Point::new(100.0, 0.0)),
            Segment::between(Point::new(100.0, 0.0), None, None, Point::new(100.0, 100.0)),
        ];
        let hit = point_in_line(Point::new(97.0, 50.0), &segments, 5.0).unwrap();
        assert_eq!(hit.index, 1);
        assert!(close(hit.point, Point::new(100.0, 50.0)));
        assert!(point_in_line(Point::new(50.0, 50.0), &segments, 5.0).is_none());
    }

    #[test]
    fn test_point_in_curve_segment() {
        let seg = Segment::between(
            Point::new(0.0, 0.0),
            Some(Point::new(0.0, 50.0)),
            Some(Point::new(100.0, 50.0)),
            Point::new(100.0, 0.0),
        );
        // The curve bulges down to y = 37.5 at its midpoint.
        let hit = point_in_line(Point::new(50.0, 37.0), &[seg], 2.0).unwrap();
        assert!((hit.point.y - 37.5).abs() < 0.1);
    }
}
