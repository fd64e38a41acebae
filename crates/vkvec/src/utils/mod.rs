pub mod angle;
pub mod env_utils;
pub mod seed;
