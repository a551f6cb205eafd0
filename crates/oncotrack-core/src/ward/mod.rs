//! Ward workflows behind the dashboard, directory, detail and history views.

mod admission;
mod dashboard;
mod transitions;

pub use admission::*;
pub use dashboard::*;
pub use transitions::*;
