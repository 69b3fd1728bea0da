pub mod energy;
pub mod sample;
