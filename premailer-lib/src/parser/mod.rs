pub mod dom_indices;
pub mod html;
pub mod serialize;
