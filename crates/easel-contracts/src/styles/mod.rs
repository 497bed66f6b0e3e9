mod registry;

pub use registry::{StylePreset, StyleRegistry, STYLE_NONE};
