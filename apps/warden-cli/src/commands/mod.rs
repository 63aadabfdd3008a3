pub mod audit;
pub mod breaker;
pub mod halt;
pub mod hook;
pub mod report;
pub mod research;
pub mod state;
pub mod task;
