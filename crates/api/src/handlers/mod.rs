pub mod hotel;
pub mod ops;
