//! Numerical primitives shared by the fitting and scoring layers.

pub mod moments;
pub mod stable;
