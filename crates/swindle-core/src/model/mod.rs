pub mod bid;
pub mod chance;
pub mod config;
pub mod dice;
pub mod round;
pub mod side;
