//! Render system boundary
//!
//! Everything the render graph needs from a GPU backend: a resource
//! factory (`RenderSystem`), resource traits, descriptors, and the
//! `RenderView` command surface. `headless` provides a CPU-only backend
//! used by tests, tools and the demo.

mod buffer;
mod pass_ops;
mod render_system;
mod render_view;
mod target_set;
mod texture;
pub mod headless;

pub use buffer::*;
pub use pass_ops::*;
pub use render_system::*;
pub use render_view::*;
pub use target_set::*;
pub use texture::*;
