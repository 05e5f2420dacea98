pub mod expandable;
pub mod state_detector;
