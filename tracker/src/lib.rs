pub extern crate nalgebra as na;

pub use error::{Error, ErrorBody, Result};

pub mod access;
pub mod api;
pub mod config;
pub mod error;
pub mod observer;
pub mod predictor;
pub mod propagator;
pub mod sampler;
pub mod social;
pub mod source;
pub mod units;

#[cfg(test)]
pub(crate) mod test_fixtures;
