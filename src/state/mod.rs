pub mod diff;
pub mod fingerprint;
pub mod normalize;
pub mod state_builder;
pub mod state_model;
