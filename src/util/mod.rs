pub mod fractional_index;
pub mod unicode;
