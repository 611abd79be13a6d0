pub mod geometry;
pub mod scene;
pub mod snapshot;
