pub mod catalog;
pub mod market;
pub mod recommendation;
pub mod snapshot;
pub mod ticker;
