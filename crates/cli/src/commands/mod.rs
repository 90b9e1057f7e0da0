pub mod backends;
pub mod diff;
pub mod extract;
pub mod filter;
pub mod matcher;

pub use backends::*;
pub use diff::*;
pub use extract::*;
pub use filter::*;
pub use matcher::*;
