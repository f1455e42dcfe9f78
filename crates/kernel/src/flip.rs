//! Delaunay-style edge flipping over a triangulated graph.
//!
//! Interior edges whose opposite vertex lies strictly inside the
//! circumcircle of the adjacent triangle get rotated to the other diagonal
//! of their quad. Passes repeat until no edge flips; the VISITED mask
//! records edges already found locally optimal so later passes skip them
//! until a nearby flip disturbs the neighborhood.

use tracing::{debug, instrument};

use crate::geometry::predicates::in_circle;
use crate::topology::graph::HalfEdgeGraph;
use crate::topology::half_edge::{EdgeMask, HalfEdgeId};

/// Flip non-boundary edges until every interior edge satisfies the
/// in-circle criterion. Returns the total number of flips performed.
#[instrument(skip(graph), fields(half_edges = graph.len()))]
pub fn flip_triangles(graph: &mut HalfEdgeGraph) -> usize {
    graph.clear_mask_all(EdgeMask::VISITED);
    let mut total = 0;
    loop {
        let flips = flip_pass(graph);
        total += flips;
        if flips == 0 {
            break;
        }
    }
    graph.clear_mask_all(EdgeMask::VISITED);
    debug!(total, "edge flipping converged");
    total
}

fn flip_pass(graph: &mut HalfEdgeGraph) -> usize {
    let frozen =
        EdgeMask::EXTERIOR | EdgeMask::BOUNDARY | EdgeMask::PRIMARY | EdgeMask::VISITED;
    let ids: Vec<HalfEdgeId> = graph.half_edge_ids().collect();
    let mut flips = 0;

    for e1 in ids {
        if graph.is_mask_set(e1, frozen) {
            continue;
        }
        let f1 = graph.edge_mate(e1);
        if graph.is_mask_set(f1, frozen) {
            continue;
        }
        // Only edges between two interior triangles can rotate.
        if graph.face_loop_len(e1) != 3 || graph.face_loop_len(f1) != 3 {
            graph.set_mask(e1, EdgeMask::VISITED);
            graph.set_mask(f1, EdgeMask::VISITED);
            continue;
        }

        let e2 = graph.face_successor(e1);
        let e3 = graph.face_successor(e2);
        let f2 = graph.face_successor(f1);
        let f3 = graph.face_successor(f2);

        // e1 runs A->B with apex C; the mate's apex is D.
        let a = graph.point(e1);
        let b = graph.point(e2);
        let c = graph.point(e3);
        let d = graph.point(f3);

        if in_circle(&a, &b, &c, &d) > 0.0 {
            flip_edge(graph, e1);
            flips += 1;
        } else {
            graph.set_mask(e1, EdgeMask::VISITED);
            graph.set_mask(f1, EdgeMask::VISITED);
        }
    }

    flips
}

/// Rotate the e1/mate pair from the A-B diagonal of its quad to D-C.
fn flip_edge(graph: &mut HalfEdgeGraph, e1: HalfEdgeId) {
    let f1 = graph.edge_mate(e1);
    let e2 = graph.face_successor(e1);
    let e3 = graph.face_successor(e2);
    let f2 = graph.face_successor(f1);
    let f3 = graph.face_successor(f2);

    // Pull the shared pair out of both triangles and merge the remains
    // into one quad loop.
    graph.yank(e1);
    graph.yank(f1);
    graph.pinch(e2, f2);

    // Re-aim the detached pair along the opposite diagonal.
    let (d_point, d_vertex) = {
        let n = &graph.half_edges[f3];
        (n.point, n.vertex_id)
    };
    let (c_point, c_vertex) = {
        let n = &graph.half_edges[e3];
        (n.point, n.vertex_id)
    };
    {
        let n = &mut graph.half_edges[e1];
        n.point = d_point;
        n.vertex_id = d_vertex;
    }
    {
        let n = &mut graph.half_edges[f1];
        n.point = c_point;
        n.vertex_id = c_vertex;
    }

    // Stitch the pair back in along D-C, cutting the quad into the two
    // new triangles.
    graph.pinch(e3, e1);
    graph.pinch(f3, f1);
    graph.pinch(e1, f1);

    graph.set_mask_around_face(e1, EdgeMask::TRIANGULATED);
    graph.set_mask_around_face(f1, EdgeMask::TRIANGULATED);

    // Every edge around the quad's corners needs reconsideration.
    for corner in [e2, e3, f2, f3] {
        graph.clear_mask_around_vertex(corner, EdgeMask::VISITED);
    }
}
