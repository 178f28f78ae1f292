pub mod completion;
pub mod scheduler;
