pub mod common;
pub mod layout_engine;
pub mod model;
pub mod navigator;
pub mod sys;
