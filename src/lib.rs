pub mod analysis;
pub mod boundary;
pub mod config;
pub mod initial;
pub mod math;
pub mod output;
pub mod physics;
pub mod render;
pub mod sampling;
pub mod simulation;
