pub mod fs;
pub mod runner;

pub use fs::*;
pub use runner::*;
