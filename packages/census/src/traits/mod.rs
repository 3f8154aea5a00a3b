//! Seams between the census pipeline and the outside world.

pub mod searcher;
