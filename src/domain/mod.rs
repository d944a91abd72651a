pub mod ai;
pub mod entity;
pub mod grid;
pub mod raycast;
pub mod seen;
pub mod tile;
