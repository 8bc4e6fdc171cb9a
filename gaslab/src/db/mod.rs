pub mod program;
pub mod task;
