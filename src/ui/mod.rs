//! Terminal output: theme and progress rendering.

pub mod progress;
pub mod theme;

pub use progress::{format_finished, ProgressRenderer};
pub use theme::{should_use_colors, PrereqTheme};
