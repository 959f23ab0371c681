pub mod io;
pub mod solve;
pub mod sweep;
pub mod synth;
