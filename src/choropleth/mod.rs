pub mod bounds;
pub mod color;
pub mod events;
pub mod index;
pub mod join;
pub mod layer;
pub mod legend;
pub mod metrics;
pub mod picking;
pub mod render;
pub mod style;
pub mod term;
