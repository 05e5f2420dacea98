pub mod events;
pub mod observer;
