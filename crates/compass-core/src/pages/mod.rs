pub mod compass;
pub mod page;

pub use compass::CompassPage;
pub use page::Page;
