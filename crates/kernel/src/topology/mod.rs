pub mod audit;
pub mod graph;
pub mod half_edge;
