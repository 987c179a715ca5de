// Musubi - ties WebAssembly, JavaScript and static assets into one build

pub mod utils;
pub mod core;
pub mod infrastructure;
pub mod plugins;
pub mod cli;
