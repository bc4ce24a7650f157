pub mod fs;
pub mod git;
pub mod platform;
pub mod signal;
