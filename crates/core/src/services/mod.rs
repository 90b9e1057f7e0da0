pub mod backends;
pub mod codec;
pub mod demangle;
pub mod diff;
pub mod extract;
pub mod filter;
pub mod input;
pub mod report;
pub mod scratch;
