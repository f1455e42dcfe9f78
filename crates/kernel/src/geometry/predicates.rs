use nalgebra::Matrix3;

use super::point::Point3d;

/// Twice the signed area of the corner (p, q, r) in the XY plane.
/// Negative for a left turn when the containing loop runs counter-clockwise,
/// so a convex corner of a CCW loop reports a negative value.
pub fn corner_area(p: &Point3d, q: &Point3d, r: &Point3d) -> f64 {
    (q.y - p.y) * (r.x - q.x) - (q.x - p.x) * (r.y - q.y)
}

/// Exact XY coordinate equality. Loop filtering keys off bit-identical
/// duplicates produced by splits, not near-coincidence.
pub fn equals_xy(a: &Point3d, b: &Point3d) -> bool {
    a.x == b.x && a.y == b.y
}

fn sign(v: f64) -> i8 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

/// Whether q lies on the segment (p, r), given that p, q, r are collinear.
pub fn on_segment(p: &Point3d, q: &Point3d, r: &Point3d) -> bool {
    q.x <= p.x.max(r.x) && q.x >= p.x.min(r.x) && q.y <= p.y.max(r.y) && q.y >= p.y.min(r.y)
}

/// Whether segments (p1, q1) and (p2, q2) intersect, including collinear
/// overlap and shared endpoints.
pub fn segments_intersect(p1: &Point3d, q1: &Point3d, p2: &Point3d, q2: &Point3d) -> bool {
    let o1 = sign(corner_area(p1, q1, p2));
    let o2 = sign(corner_area(p1, q1, q2));
    let o3 = sign(corner_area(p2, q2, p1));
    let o4 = sign(corner_area(p2, q2, q1));

    if o1 != o2 && o3 != o4 {
        return true;
    }

    if o1 == 0 && on_segment(p1, p2, q1) {
        return true;
    }
    if o2 == 0 && on_segment(p1, q2, q1) {
        return true;
    }
    if o3 == 0 && on_segment(p2, p1, q2) {
        return true;
    }
    if o4 == 0 && on_segment(p2, q1, q2) {
        return true;
    }

    false
}

/// Whether (px, py) lies inside or on the triangle (a, b, c), where the
/// triangle winds counter-clockwise.
#[allow(clippy::too_many_arguments)]
pub fn point_in_triangle(
    ax: f64,
    ay: f64,
    bx: f64,
    by: f64,
    cx: f64,
    cy: f64,
    px: f64,
    py: f64,
) -> bool {
    (cx - px) * (ay - py) >= (ax - px) * (cy - py)
        && (ax - px) * (by - py) >= (bx - px) * (ay - py)
        && (bx - px) * (cy - py) >= (cx - px) * (by - py)
}

/// In-circle determinant for the counter-clockwise triangle (a, b, c) and
/// query point d. Positive iff d lies strictly inside the circumcircle.
///
/// Uses the standard paraboloid lift: each row holds the translated
/// coordinates and their squared magnitude.
pub fn in_circle(a: &Point3d, b: &Point3d, c: &Point3d, d: &Point3d) -> f64 {
    let (adx, ady) = (a.x - d.x, a.y - d.y);
    let (bdx, bdy) = (b.x - d.x, b.y - d.y);
    let (cdx, cdy) = (c.x - d.x, c.y - d.y);
    Matrix3::new(
        adx,
        ady,
        adx * adx + ady * ady,
        bdx,
        bdy,
        bdx * bdx + bdy * bdy,
        cdx,
        cdy,
        cdx * cdx + cdy * cdy,
    )
    .determinant()
}
