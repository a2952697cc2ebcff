pub mod fixtures;
pub mod order_synth;
