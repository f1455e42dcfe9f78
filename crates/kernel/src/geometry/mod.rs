pub mod point;
pub mod predicates;
