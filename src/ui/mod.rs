pub mod display;
pub mod prompts;
pub mod workflows;
