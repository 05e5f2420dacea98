pub mod click_tracker;
pub mod engine;
pub mod error;
pub mod nav_graph;
pub mod session;
pub mod strategy;
