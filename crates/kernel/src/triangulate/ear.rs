//! Ear-clipping core: repeatedly cut valid ear triangles off the active
//! face loop, falling back through three recovery passes when no ear can
//! be found (vertex filtering, local self-intersection cure, and splitting
//! the loop along a valid diagonal).

use tracing::{debug, warn};

use super::zorder::{index_face_z, z_take_over, z_unlink};
use super::{filter_face, EAR_HASH_MIN_VERTICES};
use crate::geometry::point::Point3d;
use crate::geometry::predicates::{
    corner_area, equals_xy, point_in_triangle, segments_intersect,
};
use crate::topology::graph::HalfEdgeGraph;
use crate::topology::half_edge::{EdgeMask, HalfEdgeId};

/// Per-run state for the Morton-order acceleration. `inv_size == 0` means
/// the plain linear scan is in use.
pub(crate) struct EarState {
    min_x: f64,
    min_y: f64,
    inv_size: f64,
}

impl EarState {
    fn use_z(&self) -> bool {
        self.inv_size != 0.0
    }
}

/// Triangulate the face loop at `start`, accumulating abandoned sub-loops
/// into `residual`.
pub(crate) fn triangulate_face(graph: &mut HalfEdgeGraph, start: HalfEdgeId, residual: &mut usize) {
    let mut state = EarState {
        min_x: 0.0,
        min_y: 0.0,
        inv_size: 0.0,
    };

    let n = graph.face_loop_len(start);
    if n > EAR_HASH_MIN_VERTICES {
        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for id in graph.face_loop(start) {
            let p = graph.point(id);
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        let extent = (max_x - min_x).max(max_y - min_y);
        if extent != 0.0 {
            state.min_x = min_x;
            state.min_y = min_y;
            state.inv_size = 32767.0 / extent;
        }
        debug!(vertices = n, use_z = state.use_z(), "indexing large loop");
    }

    earcut_linked(graph, Some(start), &state, 0, residual);
}

fn earcut_linked(
    graph: &mut HalfEdgeGraph,
    ear: Option<HalfEdgeId>,
    state: &EarState,
    pass: u32,
    residual: &mut usize,
) {
    let Some(mut ear) = ear else { return };

    if pass == 0 && state.use_z() {
        index_face_z(graph, ear, state.min_x, state.min_y, state.inv_size);
    }

    let mut stop = ear;

    loop {
        let prev = graph.face_predecessor(ear);
        let next = graph.face_successor(ear);
        if prev == next {
            break;
        }

        let found = if state.use_z() {
            is_ear_hashed(graph, ear, state)
        } else {
            is_ear(graph, ear)
        };

        if found {
            if graph.face_predecessor(prev) == next {
                // Three vertices left: the loop already is the last triangle.
                graph.set_mask_around_face(ear, EdgeMask::TRIANGULATED);
                return;
            }

            // Cut the ear off along the prev->next diagonal. The new half
            // at prev's vertex stays on the active loop and inherits prev's
            // z slot; prev and ear retire into the triangle.
            let b2 = graph.split_face(prev, next);
            let a2 = graph.edge_mate(b2);
            if state.use_z() {
                z_take_over(graph, prev, a2);
                z_unlink(graph, ear);
            }
            graph.set_mask_around_face(b2, EdgeMask::TRIANGULATED);

            ear = graph.face_successor(next);
            stop = ear;
            continue;
        }

        ear = next;

        if ear == stop {
            match pass {
                0 => {
                    let filtered = filter_face(graph, ear);
                    earcut_linked(graph, filtered, state, 1, residual);
                }
                1 => {
                    if let Some(filtered) = filter_face(graph, ear) {
                        let cured = cure_local_intersections(graph, filtered, state);
                        earcut_linked(graph, cured, state, 2, residual);
                    }
                }
                _ => {
                    if !split_earcut(graph, ear, state, residual) {
                        *residual += 1;
                        warn!(
                            vertices = graph.face_loop_len(ear),
                            "abandoning untriangulatable loop"
                        );
                    }
                }
            }
            break;
        }
    }
}

fn is_ear(graph: &HalfEdgeGraph, ear: HalfEdgeId) -> bool {
    let prev = graph.face_predecessor(ear);
    let next = graph.face_successor(ear);
    let a = graph.point(prev);
    let b = graph.point(ear);
    let c = graph.point(next);

    if corner_area(&a, &b, &c) >= 0.0 {
        return false;
    }

    let x0 = a.x.min(b.x.min(c.x));
    let y0 = a.y.min(b.y.min(c.y));
    let x1 = a.x.max(b.x.max(c.x));
    let y1 = a.y.max(b.y.max(c.y));

    let mut p = graph.face_successor(next);
    while p != prev {
        let pp = graph.point(p);
        if (pp.x >= x0 && pp.x <= x1 && pp.y >= y0 && pp.y <= y1)
            && point_in_triangle(a.x, a.y, b.x, b.y, c.x, c.y, pp.x, pp.y)
            && reflex_at(graph, p)
        {
            return false;
        }
        p = graph.face_successor(p);
    }
    true
}

/// Whether the corner at `p` is reflex (or degenerate) on its loop. Only
/// reflex vertices can block an ear.
fn reflex_at(graph: &HalfEdgeGraph, p: HalfEdgeId) -> bool {
    let pp = graph.point(graph.face_predecessor(p));
    let pc = graph.point(p);
    let pn = graph.point(graph.face_successor(p));
    corner_area(&pp, &pc, &pn) >= 0.0
}

fn is_ear_hashed(graph: &HalfEdgeGraph, ear: HalfEdgeId, state: &EarState) -> bool {
    let prev = graph.face_predecessor(ear);
    let next = graph.face_successor(ear);
    let a = graph.point(prev);
    let b = graph.point(ear);
    let c = graph.point(next);

    if corner_area(&a, &b, &c) >= 0.0 {
        return false;
    }

    let x0 = a.x.min(b.x.min(c.x));
    let y0 = a.y.min(b.y.min(c.y));
    let x1 = a.x.max(b.x.max(c.x));
    let y1 = a.y.max(b.y.max(c.y));

    let min_z = super::zorder::z_order(x0, y0, state.min_x, state.min_y, state.inv_size);
    let max_z = super::zorder::z_order(x1, y1, state.min_x, state.min_y, state.inv_size);

    let in_triangle = |id: HalfEdgeId| -> bool {
        let pp = graph.point(id);
        (pp.x >= x0 && pp.x <= x1 && pp.y >= y0 && pp.y <= y1)
            && id != prev
            && id != next
            && point_in_triangle(a.x, a.y, b.x, b.y, c.x, c.y, pp.x, pp.y)
            && reflex_at(graph, id)
    };

    let mut p = graph.half_edges[ear].prev_z;
    let mut n = graph.half_edges[ear].next_z;

    // Scan outward in both z directions until either side leaves the
    // triangle's key range.
    loop {
        let (Some(pi), Some(ni)) = (p, n) else { break };
        if graph.half_edges[pi].z_key < min_z || graph.half_edges[ni].z_key > max_z {
            break;
        }
        if in_triangle(pi) || in_triangle(ni) {
            return false;
        }
        p = graph.half_edges[pi].prev_z;
        n = graph.half_edges[ni].next_z;
    }

    while let Some(pi) = p {
        if graph.half_edges[pi].z_key < min_z {
            break;
        }
        if in_triangle(pi) {
            return false;
        }
        p = graph.half_edges[pi].prev_z;
    }

    while let Some(ni) = n {
        if graph.half_edges[ni].z_key > max_z {
            break;
        }
        if in_triangle(ni) {
            return false;
        }
        n = graph.half_edges[ni].next_z;
    }

    true
}

/// Cut off small self-touching "bowtie" pockets: where the edges around a
/// vertex pair cross, detach the pocket as two triangles so the rest of the
/// loop becomes simple again.
fn cure_local_intersections(
    graph: &mut HalfEdgeGraph,
    mut start: HalfEdgeId,
    state: &EarState,
) -> Option<HalfEdgeId> {
    let mut p = start;
    loop {
        let a = graph.face_predecessor(p);
        let p_next = graph.face_successor(p);
        let b = graph.face_successor(p_next);

        let pa = graph.point(a);
        let pp = graph.point(p);
        let pn = graph.point(p_next);
        let pb = graph.point(b);

        if !equals_xy(&pa, &pb)
            && segments_intersect(&pa, &pp, &pn, &pb)
            && locally_inside(graph, a, b)
            && locally_inside(graph, b, a)
        {
            // Pocket a -> p -> p_next -> b leaves the loop through the new
            // a-b edge, then gets split into two triangles on the a-p_next
            // diagonal.
            let b2 = graph.split_face(a, b);
            let a2 = graph.edge_mate(b2);
            if state.use_z() {
                z_take_over(graph, a, a2);
                z_unlink(graph, p);
                z_unlink(graph, p_next);
            }
            let d2 = graph.split_face(a, p_next);
            graph.set_mask_around_face(d2, EdgeMask::TRIANGULATED);
            graph.set_mask_around_face(graph.edge_mate(d2), EdgeMask::TRIANGULATED);

            start = b;
            p = b;
        }

        p = graph.face_successor(p);
        if p == start {
            break;
        }
    }

    filter_face(graph, p)
}

/// Last resort: find any valid internal diagonal, split the loop along it,
/// and triangulate both halves independently. Returns false when no
/// diagonal exists.
fn split_earcut(
    graph: &mut HalfEdgeGraph,
    start: HalfEdgeId,
    state: &EarState,
    residual: &mut usize,
) -> bool {
    let mut a = start;
    loop {
        let a_vertex = graph.half_edges[a].vertex_id;
        let a_prev = graph.face_predecessor(a);
        let mut b = graph.face_successor(graph.face_successor(a));

        while b != a_prev {
            if graph.half_edges[b].vertex_id != a_vertex && is_valid_diagonal(graph, a, b) {
                debug!("splitting stuck loop along diagonal");
                // After the cut, a and b sit on opposite sides.
                graph.split_face(a, b);

                let a_side = filter_face(graph, a);
                let b_side = filter_face(graph, b);

                earcut_linked(graph, a_side, state, 0, residual);
                earcut_linked(graph, b_side, state, 0, residual);
                return true;
            }
            b = graph.face_successor(b);
        }

        a = graph.face_successor(a);
        if a == start {
            break;
        }
    }
    false
}

// ─── Diagonal Predicates ─────────────────────────────────────────────────────

/// Whether the a-b diagonal lies inside the polygon and crosses no edge.
pub(crate) fn is_valid_diagonal(graph: &HalfEdgeGraph, a: HalfEdgeId, b: HalfEdgeId) -> bool {
    let a_next = graph.face_successor(a);
    let a_prev = graph.face_predecessor(a);
    let b_next = graph.face_successor(b);
    let b_prev = graph.face_predecessor(b);
    let b_vertex = graph.half_edges[b].vertex_id;

    let pa = graph.point(a);
    let pb = graph.point(b);
    let pa_prev = graph.point(a_prev);
    let pa_next = graph.point(a_next);
    let pb_prev = graph.point(b_prev);
    let pb_next = graph.point(b_next);

    (graph.half_edges[a_next].vertex_id != b_vertex
        && graph.half_edges[a_prev].vertex_id != b_vertex)
        && !intersects_polygon(graph, a, b)
        && (locally_inside(graph, a, b)
            && locally_inside(graph, b, a)
            && middle_inside(graph, a, b)
            && (corner_area(&pa_prev, &pa, &pb_prev) != 0.0
                || corner_area(&pa, &pb_prev, &pb) != 0.0)
            || equals_xy(&pa, &pb)
                && corner_area(&pa_prev, &pa, &pa_next) > 0.0
                && corner_area(&pb_prev, &pb, &pb_next) > 0.0)
}

/// Whether the open segment a-b crosses any polygon edge not incident to
/// either endpoint.
fn intersects_polygon(graph: &HalfEdgeGraph, a: HalfEdgeId, b: HalfEdgeId) -> bool {
    let a_vertex = graph.half_edges[a].vertex_id;
    let b_vertex = graph.half_edges[b].vertex_id;
    let pa = graph.point(a);
    let pb = graph.point(b);

    let mut p = a;
    loop {
        let p_next = graph.face_successor(p);
        let pv = graph.half_edges[p].vertex_id;
        let nv = graph.half_edges[p_next].vertex_id;
        if (pv != a_vertex && nv != a_vertex && pv != b_vertex && nv != b_vertex)
            && segments_intersect(&graph.point(p), &graph.point(p_next), &pa, &pb)
        {
            return true;
        }
        p = p_next;
        if p == a {
            break;
        }
    }
    false
}

/// Whether the a-b segment leaves `a`'s corner toward the loop interior.
pub(crate) fn locally_inside(graph: &HalfEdgeGraph, a: HalfEdgeId, b: HalfEdgeId) -> bool {
    let pa_prev = graph.point(graph.face_predecessor(a));
    let pa = graph.point(a);
    let pa_next = graph.point(graph.face_successor(a));
    let pb = graph.point(b);

    if corner_area(&pa_prev, &pa, &pa_next) < 0.0 {
        corner_area(&pa, &pb, &pa_next) >= 0.0 && corner_area(&pa, &pa_prev, &pb) >= 0.0
    } else {
        corner_area(&pa, &pb, &pa_prev) < 0.0 || corner_area(&pa, &pa_next, &pb) < 0.0
    }
}

/// Whether the a-b midpoint is inside the polygon (even-odd ray cast).
fn middle_inside(graph: &HalfEdgeGraph, a: HalfEdgeId, b: HalfEdgeId) -> bool {
    let mid = graph.point(a).midpoint(&graph.point(b));
    let mut inside = false;

    let mut p = a;
    loop {
        let next = graph.face_successor(p);
        let pp = graph.point(p);
        let pn = graph.point(next);
        inside ^= (pp.y > mid.y) != (pn.y > mid.y)
            && pn.y != pp.y
            && (mid.x < (pn.x - pp.x) * (mid.y - pp.y) / (pn.y - pp.y) + pp.x);
        p = next;
        if p == a {
            break;
        }
    }
    inside
}

/// Whether the angular sector at `m` contains the sector at `p`, used to
/// break ties between equally good hole-bridge candidates at one vertex.
pub(crate) fn sector_contains_sector(graph: &HalfEdgeGraph, m: HalfEdgeId, p: HalfEdgeId) -> bool {
    let pm = graph.point(m);
    let pm_prev = graph.point(graph.face_predecessor(m));
    let pm_next = graph.point(graph.face_successor(m));
    let pp_prev = graph.point(graph.face_predecessor(p));
    let pp_next = graph.point(graph.face_successor(p));
    corner_area(&pm_prev, &pm, &pp_prev) < 0.0 && corner_area(&pp_next, &pm, &pm_next) < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point3d {
        Point3d::xy(x, y)
    }

    fn build_loop(graph: &mut HalfEdgeGraph, points: &[Point3d]) -> HalfEdgeId {
        let first = graph.split_edge(None, points[0], 0);
        let mut base = first;
        for (i, pt) in points.iter().enumerate().skip(1) {
            base = graph.split_edge(Some(base), *pt, i);
        }
        let mate = graph.edge_mate(first);
        graph.pinch(first, mate);
        first
    }

    #[test]
    fn test_is_ear_convex_corner() {
        let mut graph = HalfEdgeGraph::new();
        // CCW square: every corner is an ear.
        let seed = build_loop(
            &mut graph,
            &[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)],
        );
        assert!(is_ear(&graph, seed));
    }

    #[test]
    fn test_is_ear_rejects_reflex_corner() {
        let mut graph = HalfEdgeGraph::new();
        // Arrowhead: the corner at (0.2, 0.5) is reflex.
        let pts = [p(0.0, 0.0), p(1.0, 0.5), p(0.0, 1.0), p(0.2, 0.5)];
        let seed = build_loop(&mut graph, &pts);
        assert!(graph.signed_face_area(seed) > 0.0);
        let reflex = graph.face_predecessor(seed);
        assert!(!is_ear(&graph, reflex));
    }

    #[test]
    fn test_is_ear_blocked_by_contained_vertex() {
        let mut graph = HalfEdgeGraph::new();
        // The spike at (0.4, 0.4) sits inside the ear at (1, 0).
        let pts = [
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(1.0, 1.0),
            p(0.4, 0.4),
            p(0.0, 1.0),
        ];
        let seed = build_loop(&mut graph, &pts);
        let ear = graph.face_successor(seed);
        assert_eq!(graph.point(ear), p(1.0, 0.0));
        assert!(!is_ear(&graph, ear));
    }

    #[test]
    fn test_triangulate_face_square() {
        let mut graph = HalfEdgeGraph::new();
        let seed = build_loop(
            &mut graph,
            &[p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)],
        );
        let mut residual = 0;
        triangulate_face(&mut graph, seed, &mut residual);
        assert_eq!(residual, 0);

        // Two triangles of combined area 1, all marked.
        let mut area = 0.0;
        let mut triangles = 0;
        let mut seen = std::collections::HashSet::new();
        for id in graph.half_edge_ids().collect::<Vec<_>>() {
            if !seen.insert(id) {
                continue;
            }
            for h in graph.face_loop(id) {
                seen.insert(h);
            }
            if graph.is_mask_set(id, EdgeMask::TRIANGULATED) {
                assert_eq!(graph.face_loop_len(id), 3);
                triangles += 1;
                area += graph.signed_face_area(id);
            }
        }
        assert_eq!(triangles, 2);
        assert!((area - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_hashed_ear_agrees_with_linear_scan() {
        let mut graph = HalfEdgeGraph::new();
        // 90-vertex star with alternating radii: plenty of reflex corners,
        // so both accept and reject cases get exercised.
        let n = 90;
        let pts: Vec<Point3d> = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64 * std::f64::consts::TAU;
                let r = if i % 2 == 0 { 2.0 } else { 1.0 };
                p(r * t.cos(), r * t.sin())
            })
            .collect();
        let seed = build_loop(&mut graph, &pts);

        let state = EarState {
            min_x: -2.0,
            min_y: -2.0,
            inv_size: 32767.0 / 4.0,
        };
        index_face_z(&mut graph, seed, state.min_x, state.min_y, state.inv_size);

        for id in graph.face_loop(seed).collect::<Vec<_>>() {
            assert_eq!(
                is_ear(&graph, id),
                is_ear_hashed(&graph, id, &state),
                "ear test disagreement at {:?}",
                graph.point(id)
            );
        }
    }

    /// Triangulated faces as canonical coordinate triples, rotation- and
    /// order-normalized so two graphs can be compared structurally.
    fn triangle_set(graph: &HalfEdgeGraph) -> Vec<[(u64, u64); 3]> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for id in graph.half_edge_ids().collect::<Vec<_>>() {
            if !seen.insert(id) {
                continue;
            }
            let ring: Vec<HalfEdgeId> = graph.face_loop(id).collect();
            for h in &ring {
                seen.insert(*h);
            }
            if ring.len() != 3 || !graph.is_mask_set(id, EdgeMask::TRIANGULATED) {
                continue;
            }
            let mut tri: Vec<(u64, u64)> = ring
                .iter()
                .map(|h| {
                    let q = graph.point(*h);
                    (q.x.to_bits(), q.y.to_bits())
                })
                .collect();
            let low = (0..3).min_by_key(|&i| tri[i]).unwrap();
            tri.rotate_left(low);
            out.push([tri[0], tri[1], tri[2]]);
        }
        out.sort();
        out
    }

    #[test]
    fn test_cure_detaches_crossing_pocket() {
        let mut graph = HalfEdgeGraph::new();
        // Edges (0,0)-(4,3) and (4,0)-(0,3) cross, folding the middle four
        // vertices into a bowtie pocket. The cure detaches the pocket as two
        // triangles and leaves a simple quad behind.
        let pts = [
            p(-3.0, 0.0),
            p(0.0, 0.0),
            p(4.0, 3.0),
            p(4.0, 0.0),
            p(0.0, 3.0),
            p(-3.0, 3.0),
        ];
        let seed = build_loop(&mut graph, &pts);
        let state = EarState {
            min_x: 0.0,
            min_y: 0.0,
            inv_size: 0.0,
        };
        let survivor = cure_local_intersections(&mut graph, seed, &state).unwrap();

        assert_eq!(graph.face_loop_len(survivor), 4);
        assert!((graph.signed_face_area(survivor) - 9.0).abs() < 1e-12);

        let mut cut = 0;
        let mut seen = std::collections::HashSet::new();
        for id in graph.half_edge_ids().collect::<Vec<_>>() {
            if !seen.insert(id) {
                continue;
            }
            let ring: Vec<HalfEdgeId> = graph.face_loop(id).collect();
            for h in &ring {
                seen.insert(*h);
            }
            if ring.len() == 3 && graph.is_mask_set(id, EdgeMask::TRIANGULATED) {
                cut += 1;
            }
        }
        assert_eq!(cut, 2);
    }

    #[test]
    fn test_split_earcut_triangulates_both_halves() {
        let mut graph = HalfEdgeGraph::new();
        // L-shape; the first valid diagonal runs (0,0) -> (2,1).
        let pts = [
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(1.0, 1.0),
            p(1.0, 2.0),
            p(0.0, 2.0),
        ];
        let seed = build_loop(&mut graph, &pts);
        let state = EarState {
            min_x: 0.0,
            min_y: 0.0,
            inv_size: 0.0,
        };
        let mut residual = 0;
        assert!(split_earcut(&mut graph, seed, &state, &mut residual));
        assert_eq!(residual, 0);

        let mut area = 0.0;
        let mut triangles = 0;
        let mut seen = std::collections::HashSet::new();
        for id in graph.half_edge_ids().collect::<Vec<_>>() {
            if !seen.insert(id) {
                continue;
            }
            let ring: Vec<HalfEdgeId> = graph.face_loop(id).collect();
            for h in &ring {
                seen.insert(*h);
            }
            if ring.len() == 3 && graph.is_mask_set(id, EdgeMask::TRIANGULATED) {
                triangles += 1;
                area += graph.signed_face_area(id);
            }
        }
        assert_eq!(triangles, 4);
        assert!((area - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_hashed_path_matches_linear_triangles() {
        // Same star, clipped once through the Morton index and once with
        // the plain scan; both runs must cut the identical triangle set.
        let n = 90usize;
        let pts: Vec<Point3d> = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64 * std::f64::consts::TAU;
                let r = if i % 2 == 0 { 2.0 } else { 1.0 };
                p(r * t.cos(), r * t.sin())
            })
            .collect();

        let mut hashed = HalfEdgeGraph::new();
        let seed = build_loop(&mut hashed, &pts);
        let mut hashed_residual = 0;
        triangulate_face(&mut hashed, seed, &mut hashed_residual);

        let mut linear = HalfEdgeGraph::new();
        let seed = build_loop(&mut linear, &pts);
        let state = EarState {
            min_x: 0.0,
            min_y: 0.0,
            inv_size: 0.0,
        };
        let mut linear_residual = 0;
        earcut_linked(&mut linear, Some(seed), &state, 0, &mut linear_residual);

        assert_eq!(hashed_residual, 0);
        assert_eq!(linear_residual, 0);
        let hashed_tris = triangle_set(&hashed);
        let linear_tris = triangle_set(&linear);
        assert_eq!(hashed_tris.len(), n - 2);
        assert_eq!(hashed_tris, linear_tris);
    }

    #[test]
    fn test_locally_inside_convex_quad_diagonal() {
        let mut graph = HalfEdgeGraph::new();
        let seed = build_loop(
            &mut graph,
            &[p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)],
        );
        let far = graph.face_successor(graph.face_successor(seed));
        assert!(locally_inside(&graph, seed, far));
        assert!(locally_inside(&graph, far, seed));
        assert!(is_valid_diagonal(&graph, seed, far));
    }

    #[test]
    fn test_diagonal_rejected_outside_concavity() {
        let mut graph = HalfEdgeGraph::new();
        // L-shape; the diagonal between the two far corners of the notch
        // passes outside the polygon.
        let pts = [
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 1.0),
            p(1.0, 1.0),
            p(1.0, 2.0),
            p(0.0, 2.0),
        ];
        let seed = build_loop(&mut graph, &pts);
        let ids: Vec<HalfEdgeId> = graph.face_loop(seed).collect();
        // (2, 1) to (1, 2): midpoint (1.5, 1.5) lies outside the L.
        assert!(!is_valid_diagonal(&graph, ids[2], ids[4]));
        assert!(!middle_inside(&graph, ids[2], ids[4]));
    }
}
