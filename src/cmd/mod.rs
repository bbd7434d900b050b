pub mod grid;
pub mod solve;
pub mod validate;
