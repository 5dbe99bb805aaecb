pub mod config;
pub mod topic;
pub mod workspace;

pub use config::*;
pub use topic::*;
pub use workspace::*;
