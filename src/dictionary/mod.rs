mod dictionary;

pub use dictionary::{Dictionary, WordOracle};
