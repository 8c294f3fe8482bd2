pub mod compose;
pub mod session_panel;
pub mod status_area;
