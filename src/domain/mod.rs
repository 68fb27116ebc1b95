pub mod assessment;
pub mod panel;
pub mod report;
pub mod rooftop;

pub use assessment::*;
pub use panel::*;
pub use report::*;
pub use rooftop::*;
