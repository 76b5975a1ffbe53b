pub mod ai;
pub mod coord;
pub mod entity;
pub mod harpoon;
pub mod physics;
pub mod rules;
pub mod terrain;
pub mod tile;
