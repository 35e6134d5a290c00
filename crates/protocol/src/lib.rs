pub mod signals;
pub mod types;

pub use signals::{ChildState, LoaderPhase, LoaderSnapshot, RevealSnapshot};
pub use types::{Rect, intersection_ratio};
