pub mod console;
pub mod graph;
pub mod run_record;
