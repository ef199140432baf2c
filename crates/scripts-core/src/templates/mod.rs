//! Template rendering and project tree copying
//!
//! Templates are plain files under the tool's `templates/` directory; files
//! ending in `.tera` are rendered with [`tera`] instead of being copied.

pub mod copier;
pub mod render;

pub use copier::{copy_template, TEMPLATE_SUFFIX};
pub use render::{package_manager_context, render_template, render_to_file};
