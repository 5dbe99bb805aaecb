pub mod config_io;
pub mod logging;
pub mod paths;
pub mod repo;
pub mod topic_repo;
pub mod watcher;
pub mod workspace_repo;
