pub mod decorations;
pub mod outline;
pub mod sink;
pub mod tree;
