// Infrastructure layer
pub mod asset_copier;
pub mod dev_server;
pub mod file_system;
pub mod js_processor;
pub mod minifier;
pub mod resolver;
pub mod wasm_builder;

pub use asset_copier::*;
pub use dev_server::*;
pub use file_system::*;
pub use js_processor::*;
pub use minifier::*;
pub use resolver::*;
pub use wasm_builder::*;
