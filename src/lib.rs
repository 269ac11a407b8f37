pub mod factory;
pub mod memo;
pub mod shared;
