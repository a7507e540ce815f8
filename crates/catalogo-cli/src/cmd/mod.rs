pub mod diff;
pub mod magnets;
