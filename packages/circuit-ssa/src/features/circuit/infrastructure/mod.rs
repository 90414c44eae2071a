pub mod circuit;

pub use circuit::Circuit;
