pub mod scheduler;
pub mod tags;
