pub mod builder;
pub mod engine;

pub use builder::{build_outline_prompt, build_section_prompt};
pub use engine::TeraEngine;
