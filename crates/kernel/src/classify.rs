//! Connected-component collection with alternating inside/outside parity.
//!
//! Faces are flooded across mate links: crossing any edge toggles the
//! parity, so in a merged loop arrangement every face ends up labeled as
//! inside or outside. The component's most negative face (by signed area)
//! bounds everything else and must land on the outside; when it does not,
//! the whole component's labels are toggled.

use tracing::{debug, instrument};

use crate::topology::graph::HalfEdgeGraph;
use crate::topology::half_edge::{EdgeMask, HalfEdgeId};

/// Group faces into connected components and label each face's parity via
/// the EXTERIOR mask. Returns one face-representative list per component.
///
/// Both the VISITED and EXTERIOR masks are recomputed from scratch;
/// whatever the graph's producer left in them is discarded.
#[instrument(skip(graph), fields(half_edges = graph.len()))]
pub fn collect_connected_components(graph: &mut HalfEdgeGraph) -> Vec<Vec<HalfEdgeId>> {
    graph.clear_mask_all(EdgeMask::VISITED | EdgeMask::EXTERIOR);

    let ids: Vec<HalfEdgeId> = graph.half_edge_ids().collect();
    let mut components: Vec<Vec<HalfEdgeId>> = Vec::new();

    for seed in ids {
        if graph.is_mask_set(seed, EdgeMask::VISITED) {
            continue;
        }

        // Flood from this face; the seed face arbitrarily starts as inside
        // and gets corrected below if the component's hull disagrees.
        let mut faces: Vec<HalfEdgeId> = Vec::new();
        let mut stack: Vec<HalfEdgeId> = vec![seed];
        graph.set_mask_around_face(seed, EdgeMask::VISITED);

        while let Some(face) = stack.pop() {
            faces.push(face);
            let outside = graph.is_mask_set(face, EdgeMask::EXTERIOR);
            let ring: Vec<HalfEdgeId> = graph.face_loop(face).collect();
            for he in ring {
                let mate = graph.edge_mate(he);
                if graph.is_mask_set(mate, EdgeMask::VISITED) {
                    continue;
                }
                graph.set_mask_around_face(mate, EdgeMask::VISITED);
                if !outside {
                    graph.set_mask_around_face(mate, EdgeMask::EXTERIOR);
                }
                stack.push(mate);
            }
        }

        // The unbounded face has the most negative signed area and must be
        // outside; otherwise every label in the component is inverted.
        let mut hull = faces[0];
        let mut min_area = f64::INFINITY;
        for &face in &faces {
            let area = graph.signed_face_area(face);
            if area < min_area {
                min_area = area;
                hull = face;
            }
        }
        if !graph.is_mask_set(hull, EdgeMask::EXTERIOR) {
            for &face in &faces {
                if graph.is_mask_set(face, EdgeMask::EXTERIOR) {
                    graph.clear_mask_around_face(face, EdgeMask::EXTERIOR);
                } else {
                    graph.set_mask_around_face(face, EdgeMask::EXTERIOR);
                }
            }
        }

        debug!(faces = faces.len(), "collected component");
        components.push(faces);
    }

    graph.clear_mask_all(EdgeMask::VISITED);
    components
}
