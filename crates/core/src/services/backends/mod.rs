pub mod nm;
pub mod readelf;

pub use nm::NmExtractor;
pub use readelf::ReadelfExtractor;
