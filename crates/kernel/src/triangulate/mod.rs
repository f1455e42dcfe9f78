//! Planar polygon triangulation over the half-edge graph.
//!
//! Input loops (one outer boundary, optional holes) are ingested into a
//! [`HalfEdgeGraph`], holes are merged into the outer loop through
//! zero-width slits, and the resulting single loop is ear-clipped into
//! triangle faces. Degenerate input degrades gracefully: unusable loops
//! shrink or vanish instead of failing the whole run.

pub(crate) mod ear;
pub(crate) mod zorder;

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::Tolerance;
use crate::geometry::point::Point3d;
use crate::geometry::predicates::{corner_area, equals_xy, point_in_triangle};
use crate::topology::graph::HalfEdgeGraph;
use crate::topology::half_edge::{EdgeMask, HalfEdgeId};

/// Loops longer than this get the Morton-order proximity index.
pub(crate) const EAR_HASH_MIN_VERTICES: usize = 80;

#[derive(Debug, Error)]
pub enum TriangulationError {
    #[error("outer loop contains no usable points")]
    EmptyOuterLoop,
}

/// Result of a triangulation run. The graph owns every face produced;
/// `residual_faces` counts sub-loops the recovery passes had to abandon
/// (zero for well-formed input).
#[derive(Debug, Clone)]
pub struct Triangulation {
    pub graph: HalfEdgeGraph,
    pub residual_faces: usize,
}

impl Triangulation {
    /// Interior triangle faces, one representative loop each.
    pub fn triangles(&self) -> Vec<[HalfEdgeId; 3]> {
        let mut seen: HashSet<HalfEdgeId> = HashSet::new();
        let mut out = Vec::new();
        for id in self.graph.half_edge_ids() {
            if seen.contains(&id) {
                continue;
            }
            let ring: Vec<HalfEdgeId> = self.graph.face_loop(id).collect();
            for h in &ring {
                seen.insert(*h);
            }
            if ring.len() == 3
                && self.graph.is_mask_set(id, EdgeMask::TRIANGULATED)
                && !self.graph.is_mask_set(id, EdgeMask::EXTERIOR)
            {
                out.push([ring[0], ring[1], ring[2]]);
            }
        }
        out
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles().len()
    }

    /// Total signed area of all triangle faces.
    pub fn total_area(&self) -> f64 {
        self.triangles()
            .iter()
            .map(|t| self.graph.signed_face_area(t[0]))
            .sum()
    }
}

/// Triangulate a single closed loop given as a point sequence. The loop may
/// wind either way; a trailing duplicate of the first point is tolerated.
pub fn triangulate_single_loop(
    points: &[Point3d],
    tol: Tolerance,
) -> Result<Triangulation, TriangulationError> {
    triangulate_with_holes(points, &[], tol)
}

/// Triangulate an outer loop with zero or more hole loops.
#[instrument(skip_all, fields(outer = outer.len(), holes = holes.len()))]
pub fn triangulate_with_holes(
    outer: &[Point3d],
    holes: &[Vec<Point3d>],
    tol: Tolerance,
) -> Result<Triangulation, TriangulationError> {
    let (mut graph, seed) = assemble_loops(outer, holes, tol)?;

    let mut residual = 0;
    if let Some(seed) = seed
        && let Some(start) = filter_face(&mut graph, seed)
    {
        ear::triangulate_face(&mut graph, start, &mut residual);
    }

    if residual > 0 {
        warn!(residual, "triangulation left unfilled loops");
    }
    debug!(half_edges = graph.len(), "triangulation complete");
    Ok(Triangulation {
        graph,
        residual_faces: residual,
    })
}

/// Build the merged loop graph without triangulating: outer and hole loops
/// ingested, masked, and joined through slit bridges. Useful on its own for
/// region classification.
pub fn build_merged_loops(
    outer: &[Point3d],
    holes: &[Vec<Point3d>],
    tol: Tolerance,
) -> Result<HalfEdgeGraph, TriangulationError> {
    assemble_loops(outer, holes, tol).map(|(graph, _)| graph)
}

// ─── Loop Assembly ───────────────────────────────────────────────────────────

/// Collapse consecutive coincident points and a trailing duplicate of the
/// first point.
fn dedup_points(points: &[Point3d], tol: Tolerance) -> Vec<Point3d> {
    let mut pts: Vec<Point3d> = Vec::with_capacity(points.len());
    for p in points {
        if pts.last().is_none_or(|l| !tol.points_coincident(l, p)) {
            pts.push(*p);
        }
    }
    while pts.len() > 1 {
        let first = pts[0];
        let Some(last) = pts.last() else { break };
        if tol.points_coincident(&first, last) {
            pts.pop();
        } else {
            break;
        }
    }
    pts
}

/// Build a closed face loop from deduplicated points, assigning sequential
/// vertex labels from `first_vertex`. Returns the half-edge at points[0]
/// whose face loop follows input order.
fn create_loop(graph: &mut HalfEdgeGraph, pts: &[Point3d], first_vertex: usize) -> HalfEdgeId {
    let first = graph.split_edge(None, pts[0], first_vertex);
    let mut base = first;
    for (k, p) in pts.iter().enumerate().skip(1) {
        base = graph.split_edge(Some(base), *p, first_vertex + k);
    }
    if pts.len() > 1 {
        let mate = graph.edge_mate(first);
        graph.pinch(first, mate);
    }
    first
}

fn leftmost_of_loop(graph: &HalfEdgeGraph, seed: HalfEdgeId) -> HalfEdgeId {
    let mut best = seed;
    for id in graph.face_loop(seed) {
        let p = graph.point(id);
        let b = graph.point(best);
        if p.x < b.x || (p.x == b.x && p.y < b.y) {
            best = id;
        }
    }
    best
}

/// Ingest all loops and merge holes into the outer loop. Returns the graph
/// and a seed on the merged interior loop, or `None` when the outer loop is
/// too degenerate to triangulate.
fn assemble_loops(
    outer: &[Point3d],
    holes: &[Vec<Point3d>],
    tol: Tolerance,
) -> Result<(HalfEdgeGraph, Option<HalfEdgeId>), TriangulationError> {
    let mut graph = HalfEdgeGraph::new();

    let outer_pts = dedup_points(outer, tol);
    if outer_pts.is_empty() {
        return Err(TriangulationError::EmptyOuterLoop);
    }
    let outer_seed = create_loop(&mut graph, &outer_pts, 0);
    let mut next_vertex = outer_pts.len();

    if outer_pts.len() < 3 {
        graph.set_mask_around_face(
            outer_seed,
            EdgeMask::BOUNDARY | EdgeMask::PRIMARY | EdgeMask::STEINER,
        );
        let mate = graph.edge_mate(outer_seed);
        graph.set_mask_around_face(
            mate,
            EdgeMask::BOUNDARY | EdgeMask::PRIMARY | EdgeMask::STEINER,
        );
        return Ok((graph, None));
    }

    // The positive shoelace side is the interior regardless of input
    // winding; its mate loop bounds the unbounded exterior face.
    let area = graph.signed_face_area(outer_seed);
    let interior = if area >= 0.0 {
        outer_seed
    } else {
        graph.edge_mate(outer_seed)
    };
    let exterior = graph.edge_mate(interior);
    graph.set_mask_around_face(interior, EdgeMask::BOUNDARY | EdgeMask::PRIMARY);
    graph.set_mask_around_face(
        exterior,
        EdgeMask::BOUNDARY | EdgeMask::PRIMARY | EdgeMask::EXTERIOR,
    );

    // Hole loops, queued leftmost-first so earlier bridges cannot occlude
    // later ones.
    let mut queue: Vec<HalfEdgeId> = Vec::new();
    for hole in holes {
        let pts = dedup_points(hole, tol);
        if pts.is_empty() {
            continue;
        }
        let hole_seed = create_loop(&mut graph, &pts, next_vertex);
        next_vertex += pts.len();

        if pts.len() < 3 {
            // Degenerate hole: keep it as Steiner vertices.
            graph.set_mask_around_face(
                hole_seed,
                EdgeMask::BOUNDARY | EdgeMask::PRIMARY | EdgeMask::STEINER,
            );
            let mate = graph.edge_mate(hole_seed);
            graph.set_mask_around_face(
                mate,
                EdgeMask::BOUNDARY | EdgeMask::PRIMARY | EdgeMask::STEINER,
            );
            queue.push(leftmost_of_loop(&graph, hole_seed));
            continue;
        }

        // Holes wind opposite to the interior: the negative side merges.
        let hole_area = graph.signed_face_area(hole_seed);
        let merge_side = if hole_area <= 0.0 {
            hole_seed
        } else {
            graph.edge_mate(hole_seed)
        };
        let cavity = graph.edge_mate(merge_side);
        graph.set_mask_around_face(merge_side, EdgeMask::BOUNDARY | EdgeMask::PRIMARY);
        graph.set_mask_around_face(
            cavity,
            EdgeMask::BOUNDARY | EdgeMask::PRIMARY | EdgeMask::EXTERIOR,
        );
        queue.push(leftmost_of_loop(&graph, merge_side));
    }
    queue.sort_by(|a, b| graph.point(*a).x.total_cmp(&graph.point(*b).x));

    let mut outer_node = interior;
    for hole in queue {
        let Some(bridge) = find_hole_bridge(&graph, hole, outer_node) else {
            warn!("hole has no visible bridge to the outer loop; skipping");
            continue;
        };

        // A point hole is a zero-length pair. Graft it as a spur off the
        // bridge vertex so its point sits exactly once on the merged ring;
        // splicing the pair whole would leave the point doubled and block
        // every ear that contains it.
        let hole_mate = graph.edge_mate(hole);
        if graph.face_successor(hole) == hole_mate
            && equals_xy(&graph.point(hole), &graph.point(hole_mate))
        {
            let anchor = graph.point(bridge);
            let anchor_vertex = graph.half_edges[bridge].vertex_id;
            graph.half_edges[hole].point = anchor;
            graph.half_edges[hole].vertex_id = anchor_vertex;
            graph.pinch(bridge, hole);
            continue;
        }

        let bridge_reverse = graph.split_face(bridge, hole);
        let _ = filter_face(&mut graph, bridge_reverse);
        match filter_face(&mut graph, bridge) {
            Some(node) => outer_node = node,
            None => {
                warn!("merged loop degenerated while filtering; nothing to fill");
                return Ok((graph, None));
            }
        }
    }

    Ok((graph, Some(outer_node)))
}

// ─── Hole Bridging ───────────────────────────────────────────────────────────

/// David Eberly's visibility walk: cast a leftward ray from the hole's
/// leftmost vertex, take the closest intersected outer edge's nearer
/// endpoint, then correct to the reflex vertex with the minimal angle
/// inside the candidate triangle if any outer vertex blocks the segment.
fn find_hole_bridge(
    graph: &HalfEdgeGraph,
    hole: HalfEdgeId,
    outer: HalfEdgeId,
) -> Option<HalfEdgeId> {
    let hp = graph.point(hole);
    let mut qx = f64::NEG_INFINITY;
    let mut m: Option<HalfEdgeId> = None;

    let mut p = outer;
    loop {
        let next = graph.face_successor(p);
        let pp = graph.point(p);
        let np = graph.point(next);
        if hp.y <= pp.y && hp.y >= np.y && np.y != pp.y {
            let x = pp.x + (hp.y - pp.y) * (np.x - pp.x) / (np.y - pp.y);
            if x <= hp.x && x > qx {
                qx = x;
                m = Some(if pp.x < np.x { p } else { next });
                if x == hp.x {
                    // Ray hits an outer vertex exactly.
                    return m;
                }
            }
        }
        p = next;
        if p == outer {
            break;
        }
    }

    let mut m = m?;
    let stop = m;
    let mp = graph.point(m);
    let (mx, my) = (mp.x, mp.y);
    let mut tan_min = f64::INFINITY;

    let mut p = m;
    loop {
        let pp = graph.point(p);

        if hp.x >= pp.x
            && pp.x >= mx
            && hp.x != pp.x
            && point_in_triangle(
                if hp.y < my { hp.x } else { qx },
                hp.y,
                mx,
                my,
                if hp.y < my { qx } else { hp.x },
                hp.y,
                pp.x,
                pp.y,
            )
        {
            let tan = (hp.y - pp.y).abs() / (hp.x - pp.x);
            let m_pt = graph.point(m);
            if ear::locally_inside(graph, p, hole)
                && (tan < tan_min
                    || (tan == tan_min
                        && (pp.x > m_pt.x
                            || (pp.x == m_pt.x && ear::sector_contains_sector(graph, m, p)))))
            {
                m = p;
                tan_min = tan;
            }
        }

        p = graph.face_successor(p);
        if p == stop {
            break;
        }
    }

    Some(m)
}

// ─── Loop Filtering ──────────────────────────────────────────────────────────

/// Remove vertices that duplicate their successor or whose corner is exactly
/// collinear, repeating until the loop is stable. Steiner vertices are
/// exempt. Returns a surviving half-edge, or `None` once fewer than three
/// vertices remain.
pub(crate) fn filter_face(graph: &mut HalfEdgeGraph, start: HalfEdgeId) -> Option<HalfEdgeId> {
    let mut end = start;
    let mut p = start;
    loop {
        let next = graph.face_successor(p);
        let prev = graph.face_predecessor(p);
        if next == p || next == prev {
            return None;
        }

        let again;
        let pp = graph.point(p);
        let pn = graph.point(next);
        if !graph.is_mask_set(p, EdgeMask::STEINER)
            && origin_is_simple(graph, p)
            && (equals_xy(&pp, &pn) || corner_area(&graph.point(prev), &pp, &pn) == 0.0)
        {
            let resume = excise_vertex(graph, p);
            p = resume;
            end = resume;
            again = true;
        } else {
            p = next;
            again = false;
        }

        if !again && p == end {
            break;
        }
    }
    Some(end)
}

/// Whether exactly two half-edges leave `p`'s origin vertex. The coordinate
/// fixup in [`excise_vertex`] rewrites the predecessor's mate, which is only
/// sound at such vertices; at a bridge or diagonal junction that mate sits
/// on another live loop and must keep its corner.
fn origin_is_simple(graph: &HalfEdgeGraph, p: HalfEdgeId) -> bool {
    let prev = graph.face_predecessor(p);
    graph.face_predecessor(graph.edge_mate(prev)) == graph.edge_mate(p)
}

/// Remove the vertex at `p` from its loop by excising the edge pair that
/// starts there, keeping the predecessor's mate coordinates in sync with
/// the healed loop. Returns the surviving predecessor to resume from.
fn excise_vertex(graph: &mut HalfEdgeGraph, p: HalfEdgeId) -> HalfEdgeId {
    let mate = graph.edge_mate(p);
    let prev = graph.face_predecessor(p);
    let next = graph.face_successor(p);
    zorder::z_unlink(graph, p);
    zorder::z_unlink(graph, mate);

    if prev == mate {
        // The pair dangles off the loop as a spur; removal changes no
        // surviving edge's endpoints.
        let resume = graph.face_predecessor(prev);
        graph.remove_edge_pair(p);
        return resume;
    }

    // The predecessor's edge now ends at whatever follows the excised pair.
    let target = if next == mate {
        graph.face_successor(next)
    } else {
        next
    };
    let target_point = graph.point(target);
    let target_vertex = graph.half_edges[target].vertex_id;
    let prev_mate = graph.edge_mate(prev);
    graph.remove_edge_pair(p);
    graph.half_edges[prev_mate].point = target_point;
    graph.half_edges[prev_mate].vertex_id = target_vertex;
    prev
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::audit::audit_graph;

    fn p(x: f64, y: f64) -> Point3d {
        Point3d::xy(x, y)
    }

    fn square(side: f64) -> Vec<Point3d> {
        vec![
            p(0.0, 0.0),
            p(side, 0.0),
            p(side, side),
            p(0.0, side),
        ]
    }

    #[test]
    fn test_unit_square_two_triangles() {
        let result = triangulate_single_loop(&square(1.0), Tolerance::default()).unwrap();
        assert_eq!(result.residual_faces, 0);
        assert_eq!(result.triangle_count(), 2);
        assert!((result.total_area() - 1.0).abs() < 1e-12);
        assert!(audit_graph(&result.graph).all_valid());
    }

    #[test]
    fn test_clockwise_input_normalized() {
        let mut pts = square(1.0);
        pts.reverse();
        let result = triangulate_single_loop(&pts, Tolerance::default()).unwrap();
        assert_eq!(result.triangle_count(), 2);
        assert!((result.total_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_convex_polygon_triangle_count() {
        // n-gon yields n - 2 triangles.
        let n = 12;
        let pts: Vec<Point3d> = (0..n)
            .map(|i| {
                let t = (i as f64) / (n as f64) * std::f64::consts::TAU;
                p(t.cos(), t.sin())
            })
            .collect();
        let result = triangulate_single_loop(&pts, Tolerance::default()).unwrap();
        assert_eq!(result.triangle_count(), n - 2);
        assert_eq!(result.residual_faces, 0);
    }

    #[test]
    fn test_concave_polygon() {
        let pts = vec![
            p(0.0, 0.0),
            p(4.0, 0.0),
            p(4.0, 4.0),
            p(2.0, 1.0),
            p(0.0, 4.0),
        ];
        let result = triangulate_single_loop(&pts, Tolerance::default()).unwrap();
        assert_eq!(result.triangle_count(), 3);
        assert_eq!(result.residual_faces, 0);
        for t in result.triangles() {
            assert!(result.graph.signed_face_area(t[0]) > 0.0);
        }
    }

    #[test]
    fn test_square_with_hole_area() {
        let outer = square(4.0);
        let hole = vec![p(1.0, 1.0), p(1.0, 2.0), p(2.0, 2.0), p(2.0, 1.0)];
        let result =
            triangulate_with_holes(&outer, &[hole], Tolerance::default()).unwrap();
        assert_eq!(result.residual_faces, 0);
        assert!((result.total_area() - 15.0).abs() < 1e-9);
        // 8 boundary vertices yields 8 triangles after the slit merge.
        assert_eq!(result.triangle_count(), 8);
        assert!(audit_graph(&result.graph).all_valid());
    }

    #[test]
    fn test_two_holes() {
        let outer = square(10.0);
        let hole_a = vec![p(1.0, 1.0), p(1.0, 3.0), p(3.0, 3.0), p(3.0, 1.0)];
        let hole_b = vec![p(6.0, 5.0), p(6.0, 8.0), p(8.0, 8.0), p(8.0, 5.0)];
        let result =
            triangulate_with_holes(&outer, &[hole_a, hole_b], Tolerance::default()).unwrap();
        assert_eq!(result.residual_faces, 0);
        assert!((result.total_area() - (100.0 - 4.0 - 6.0)).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_input_yields_no_triangles() {
        let result =
            triangulate_single_loop(&[p(0.0, 0.0), p(1.0, 0.0)], Tolerance::default()).unwrap();
        assert_eq!(result.triangle_count(), 0);
        assert_eq!(result.residual_faces, 0);

        let empty: Vec<Point3d> = vec![];
        assert!(matches!(
            triangulate_single_loop(&empty, Tolerance::default()),
            Err(TriangulationError::EmptyOuterLoop)
        ));
    }

    #[test]
    fn test_collinear_points_filtered() {
        let pts = vec![
            p(0.0, 0.0),
            p(0.5, 0.0),
            p(1.0, 0.0),
            p(1.0, 1.0),
            p(0.0, 1.0),
        ];
        let result = triangulate_single_loop(&pts, Tolerance::default()).unwrap();
        assert_eq!(result.triangle_count(), 2);
        assert!((result.total_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_closing_point_tolerated() {
        let mut pts = square(1.0);
        pts.push(p(0.0, 0.0));
        let result = triangulate_single_loop(&pts, Tolerance::default()).unwrap();
        assert_eq!(result.triangle_count(), 2);
    }

    #[test]
    fn test_find_hole_bridge_prefers_nearest_edge() {
        let outer = square(4.0);
        let hole = vec![p(1.0, 1.9), p(1.0, 2.1), p(1.2, 2.0)];
        let (graph, seed) =
            assemble_loops(&outer, &[hole.clone()], Tolerance::default()).unwrap();
        let seed = seed.unwrap();
        // The slit bridge runs to the outer loop's left edge.
        let merged: Vec<HalfEdgeId> = graph.face_loop(seed).collect();
        assert_eq!(merged.len(), 4 + 3 + 2);
        let bridge_xs: Vec<f64> = merged
            .iter()
            .filter(|id| !graph.is_mask_set(**id, EdgeMask::BOUNDARY))
            .map(|id| graph.point(*id).x)
            .collect();
        assert_eq!(bridge_xs.len(), 2);
        assert!(bridge_xs.contains(&0.0));
        assert!(bridge_xs.contains(&1.0));
    }

    #[test]
    fn test_bridge_vertex_collinear_corner_survives() {
        // The bridge lands on (1, 1); after the merge that vertex sits on
        // the ring twice and the corner (2, 1.5) -> (1, 1) -> (0, 0.5) is
        // exactly collinear. Filtering must leave the doubled vertex alone.
        let outer = vec![
            p(0.0, 0.0),
            p(4.0, 0.0),
            p(4.0, 3.0),
            p(1.5, 3.0),
            p(1.0, 1.0),
            p(0.0, 0.5),
        ];
        let hole = vec![p(2.0, 1.5), p(2.5, 1.7), p(2.5, 1.4)];
        let result = triangulate_with_holes(&outer, &[hole], Tolerance::default()).unwrap();
        assert_eq!(result.residual_faces, 0);
        assert_eq!(result.triangle_count(), 9);
        assert!((result.total_area() - 9.175).abs() < 1e-9);
        assert!(audit_graph(&result.graph).all_valid());
    }

    #[test]
    fn test_point_hole_fans_around_interior_vertex() {
        let outer = square(4.0);
        let result =
            triangulate_with_holes(&outer, &[vec![p(2.0, 2.0)]], Tolerance::default()).unwrap();
        assert_eq!(result.residual_faces, 0);
        assert_eq!(result.triangle_count(), 4);
        assert!((result.total_area() - 16.0).abs() < 1e-9);
        // Every triangle has the interior point as a corner.
        for t in result.triangles() {
            assert!(
                t.iter()
                    .any(|h| equals_xy(&result.graph.point(*h), &p(2.0, 2.0)))
            );
        }
        assert!(audit_graph(&result.graph).all_valid());
    }

    #[test]
    fn test_point_hole_off_center() {
        let outer = square(4.0);
        let result =
            triangulate_with_holes(&outer, &[vec![p(3.0, 1.0)]], Tolerance::default()).unwrap();
        assert_eq!(result.residual_faces, 0);
        assert_eq!(result.triangle_count(), 4);
        assert!((result.total_area() - 16.0).abs() < 1e-9);
        assert!(audit_graph(&result.graph).all_valid());
    }

    #[test]
    fn test_dedup_points_collapses_runs() {
        let tol = Tolerance::default();
        let pts = dedup_points(
            &[p(0.0, 0.0), p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 0.0)],
            tol,
        );
        assert_eq!(pts.len(), 3);
    }

    #[test]
    fn test_masks_on_assembled_loops() {
        let outer = square(4.0);
        let hole = vec![p(1.0, 1.0), p(1.0, 2.0), p(2.0, 2.0), p(2.0, 1.0)];
        let (graph, seed) = assemble_loops(&outer, &[hole], Tolerance::default()).unwrap();
        let seed = seed.unwrap();
        // Interior merged loop: boundary edges are marked, bridge halves not.
        let mut boundary = 0;
        let mut bridge = 0;
        for id in graph.face_loop(seed).collect::<Vec<_>>() {
            if graph.is_mask_set(id, EdgeMask::BOUNDARY) {
                assert!(graph.is_mask_set(id, EdgeMask::PRIMARY));
                assert!(!graph.is_mask_set(id, EdgeMask::EXTERIOR));
                boundary += 1;
            } else {
                bridge += 1;
            }
        }
        assert_eq!(boundary, 8);
        assert_eq!(bridge, 2);
    }
}
