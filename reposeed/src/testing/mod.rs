mod context;
pub use context::*;

mod temp;
pub use temp::*;
