pub mod dice;
pub mod protocol;
pub mod rules;
pub mod wheel;
