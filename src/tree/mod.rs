pub mod danger;
pub mod elements;
pub mod node_model;
