//! User interface module
//!
//! - Sidebar pieces: the add-location form and the saved list (form.rs, list.rs)
//! - The marker layer shared by both views (markers.rs)
//! - Canvas programs for the 3D globe and the flat map (globe.rs, map.rs)

pub mod form;
pub mod globe;
pub mod list;
pub mod map;
pub mod markers;
