pub mod config;
pub mod group;
pub mod palette;
pub mod sequence;
