//! Headline core: pure entry normalization and new-entry detection.
mod delta;
mod entry;
mod seen;

pub use delta::compute_delta;
pub use entry::Entry;
pub use seen::SeenSet;
