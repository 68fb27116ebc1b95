pub mod financial;
pub mod params;

pub use financial::*;
pub use params::*;
