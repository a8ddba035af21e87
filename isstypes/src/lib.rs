pub mod elements;
pub mod prelude;
pub mod time;
pub mod tle;
