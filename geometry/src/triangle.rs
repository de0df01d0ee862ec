use units::{cm2_, ratio_};
use crate::{Dot, Point, RatioVec, Vector};

/// A flat triangle, stored as one corner and the two edges leaving it.
#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    corner: Point,
    u: Vector,
    v: Vector,
    normal: RatioVec,
}

impl Triangle {

    pub fn new(corner: Point, b: Point, c: Point) -> Self {
        let u = b - corner;
        let v = c - corner;
        let normal = u.normalize().cross(v.normalize()).normalize();
        Self { corner, u, v, normal }
    }

    /// Unit normal, oriented by the right-hand rule on the corner order
    pub fn normal(&self) -> RatioVec { self.normal }

    /// Does the segment from `start` to `stop` pass through this triangle?
    ///
    /// The segment's line is intersected with the triangle's plane, and the
    /// intersection is expressed in the barycentric coordinates (s, t) of the
    /// edges `u` and `v`. It lies inside the triangle iff both coordinates are
    /// in [0, 1] and their sum does not exceed 1. Segments parallel to the
    /// plane never intersect.
    pub fn intersects_segment(&self, start: Point, stop: Point) -> bool {
        let segment = stop - start;
        let length = segment.magnitude();
        let direction = segment.normalize();

        let approach = ratio_(direction.dot(self.normal));
        if approach == 0.0 || !approach.is_finite() { return false }

        // Distance along the segment to the plane
        let k = (self.corner - start).dot(self.normal) / approach;
        if k < length * 0.0 || k > length { return false }

        let w = (start + direction * k) - self.corner;

        let uu = cm2_(self.u.dot(self.u));
        let vv = cm2_(self.v.dot(self.v));
        let uv = cm2_(self.u.dot(self.v));
        let wu = cm2_(w.dot(self.u));
        let wv = cm2_(w.dot(self.v));

        let d = uv * uv - uu * vv;
        let s = (uv * wv - vv * wu) / d;
        let t = (uv * wu - uu * wv) / d;

        (0.0..=1.0).contains(&s) &&
        (0.0..=1.0).contains(&t) &&
        s + t <= 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_eq::assert_float_eq;
    use rstest::rstest;

    // Triangle in the y=0 plane spanned by the x and z unit vectors; each
    // segment crosses that plane vertically at (x, 0, z).
    #[rstest(/**/ x,    z,   expected,
             case(0.0,  0.0, true ),
             case(1.0,  0.0, true ),
             case(0.0,  1.0, true ),
             case(0.2,  0.2, true ),
             case(0.3,  0.3, true ),
             case(0.5, -0.1, false),
             case(-0.1, 0.5, false),
             case(0.9,  0.9, false),
    )]
    fn segment_through_triangle(x: f32, z: f32, expected: bool) {
        let triangle = Triangle::new(Point::cm(0.0, 0.0, 0.0),
                                     Point::cm(1.0, 0.0, 0.0),
                                     Point::cm(0.0, 0.0, 1.0));
        let start = Point::cm(x,  1.0, z);
        let stop  = Point::cm(x, -1.0, z);
        assert_eq!(triangle.intersects_segment(start, stop), expected);
    }

    #[test]
    fn segment_stopping_short_of_plane_misses() {
        let triangle = Triangle::new(Point::cm(0.0, 0.0, 0.0),
                                     Point::cm(1.0, 0.0, 0.0),
                                     Point::cm(0.0, 0.0, 1.0));
        assert!(!triangle.intersects_segment(Point::cm(0.2, 2.0, 0.2), Point::cm(0.2, 0.5, 0.2)));
    }

    #[test]
    fn parallel_segment_misses() {
        let triangle = Triangle::new(Point::cm(0.0, 0.0, 0.0),
                                     Point::cm(1.0, 0.0, 0.0),
                                     Point::cm(0.0, 0.0, 1.0));
        assert!(!triangle.intersects_segment(Point::cm(-1.0, 0.0, 0.2), Point::cm(2.0, 0.0, 0.2)));
    }

    #[test]
    fn normal_follows_corner_order() {
        let triangle = Triangle::new(Point::cm(0.0, 0.0, 0.0),
                                     Point::cm(1.0, 0.0, 0.0),
                                     Point::cm(0.0, 0.0, 1.0));
        // x cross z = -y
        assert_float_eq!(triangle.normal().as_f32(), [0.0, -1.0, 0.0], abs_all <= 1e-6);
    }
}
