//! Terminal UI module using ratatui.
//!
//! - `render`: Frame layout, page bodies and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color palette and text styling

pub mod input;
pub mod render;
pub mod styles;
