pub mod container;
pub mod datasource;

pub use container::Container;
pub use datasource::{Datasource, Format, StoreError, atomic_write};
