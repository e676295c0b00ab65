pub mod opponent;
pub mod resolution;
pub mod session;
pub mod settlement;
pub mod snapshot;
pub mod table;
