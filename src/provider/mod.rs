pub mod accessibility;
pub mod clock;
pub mod scripted;
