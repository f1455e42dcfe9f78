//! Morton-order proximity index over an active face loop.
//!
//! Large loops get a secondary doubly-linked list threaded through their
//! half-edges, sorted by the 15-bit Morton key of each origin. Ear tests can
//! then scan a narrow z-range instead of the whole loop. The links live in
//! transient fields on `HalfEdge` and are rebuilt per triangulation run.

use crate::topology::graph::HalfEdgeGraph;
use crate::topology::half_edge::HalfEdgeId;

/// Morton key of (x, y), quantized to 15 bits per axis over the loop's
/// bounding square.
pub(crate) fn z_order(x: f64, y: f64, min_x: f64, min_y: f64, inv_size: f64) -> u32 {
    let mut x = ((x - min_x) * inv_size) as u32;
    let mut y = ((y - min_y) * inv_size) as u32;
    x = (x | (x << 8)) & 0x00FF00FF;
    x = (x | (x << 4)) & 0x0F0F0F0F;
    x = (x | (x << 2)) & 0x33333333;
    x = (x | (x << 1)) & 0x55555555;
    y = (y | (y << 8)) & 0x00FF00FF;
    y = (y | (y << 4)) & 0x0F0F0F0F;
    y = (y | (y << 2)) & 0x33333333;
    y = (y | (y << 1)) & 0x55555555;
    x | (y << 1)
}

/// Thread the z-list through the face loop at `start` and sort it by key.
pub(crate) fn index_face_z(
    graph: &mut HalfEdgeGraph,
    start: HalfEdgeId,
    min_x: f64,
    min_y: f64,
    inv_size: f64,
) {
    let mut p = start;
    loop {
        let he = &mut graph.half_edges[p];
        he.z_key = z_order(he.point.x, he.point.y, min_x, min_y, inv_size);
        let next = he.face_successor;
        let prev = he.face_predecessor;
        he.prev_z = Some(prev);
        he.next_z = Some(next);
        p = next;
        if p == start {
            break;
        }
    }

    // Break the circle so the list has a head and a tail.
    if let Some(tail) = graph.half_edges[start].prev_z {
        graph.half_edges[tail].next_z = None;
    }
    graph.half_edges[start].prev_z = None;

    sort_z_list(graph, start);
}

/// Detach `id` from the z-list, stitching its neighbors together. Harmless
/// on half-edges that were never indexed.
pub(crate) fn z_unlink(graph: &mut HalfEdgeGraph, id: HalfEdgeId) {
    let prev = graph.half_edges[id].prev_z;
    let next = graph.half_edges[id].next_z;
    if let Some(p) = prev {
        graph.half_edges[p].next_z = next;
    }
    if let Some(n) = next {
        graph.half_edges[n].prev_z = prev;
    }
    graph.half_edges[id].prev_z = None;
    graph.half_edges[id].next_z = None;
}

/// Move `old`'s z-list slot to `new`. Used when a face split retires a
/// half-edge and a fresh one takes over the same vertex in the active loop.
pub(crate) fn z_take_over(graph: &mut HalfEdgeGraph, old: HalfEdgeId, new: HalfEdgeId) {
    let (key, prev, next) = {
        let o = &graph.half_edges[old];
        (o.z_key, o.prev_z, o.next_z)
    };
    graph.half_edges[new].z_key = key;
    graph.half_edges[new].prev_z = prev;
    graph.half_edges[new].next_z = next;
    if let Some(p) = prev {
        graph.half_edges[p].next_z = Some(new);
    }
    if let Some(n) = next {
        graph.half_edges[n].prev_z = Some(new);
    }
    graph.half_edges[old].prev_z = None;
    graph.half_edges[old].next_z = None;
}

/// Bottom-up merge sort of the z-list, in place through the links.
fn sort_z_list(graph: &mut HalfEdgeGraph, head: HalfEdgeId) {
    let mut in_size = 1usize;
    let mut list = Some(head);

    loop {
        let mut p = list;
        list = None;
        let mut tail: Option<HalfEdgeId> = None;
        let mut num_merges = 0usize;

        while let Some(p_head) = p {
            num_merges += 1;

            // q starts `in_size` nodes past p; p's run may come up short.
            let mut q = Some(p_head);
            let mut p_size = 0usize;
            for _ in 0..in_size {
                p_size += 1;
                q = match q {
                    Some(id) => graph.half_edges[id].next_z,
                    None => None,
                };
                if q.is_none() {
                    break;
                }
            }
            let mut q_size = in_size;
            let mut p_run = Some(p_head);

            while p_size > 0 || (q_size > 0 && q.is_some()) {
                let take_p = if p_size == 0 {
                    false
                } else if q_size == 0 || q.is_none() {
                    true
                } else {
                    match (p_run, q) {
                        (Some(pi), Some(qi)) => {
                            graph.half_edges[pi].z_key <= graph.half_edges[qi].z_key
                        }
                        _ => true,
                    }
                };

                let e = if take_p {
                    let Some(e) = p_run else { break };
                    p_run = graph.half_edges[e].next_z;
                    p_size -= 1;
                    e
                } else {
                    let Some(e) = q else { break };
                    q = graph.half_edges[e].next_z;
                    q_size -= 1;
                    e
                };

                match tail {
                    Some(t) => graph.half_edges[t].next_z = Some(e),
                    None => list = Some(e),
                }
                graph.half_edges[e].prev_z = tail;
                tail = Some(e);
            }

            p = q;
        }

        if let Some(t) = tail {
            graph.half_edges[t].next_z = None;
        }
        in_size *= 2;

        if num_merges <= 1 {
            break;
        }
    }
}
