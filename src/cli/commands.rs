use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hangar", about = concat!("hangar v", env!("CARGO_PKG_VERSION"), " - topics, workspaces and their sessions"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Workspace root (defaults to $HANGAR_ROOT, the configured root, or ~/hangar)
    #[arg(short = 'C', long = "root", global = true)]
    pub root: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List topics
    Topics,
    /// List workspaces, optionally for one topic
    List(ListArgs),
    /// Create a topic
    NewTopic(TopicArg),
    /// Create a workspace
    New(NewArgs),
    /// Rename a workspace within its topic
    Rename(RenameArgs),
    /// Rename a topic (and every session linked to its workspaces)
    RenameTopic(RenameTopicArgs),
    /// Move a workspace to another topic
    Mv(MvArgs),
    /// Delete a workspace and kill its linked session
    Rm(WorkspaceArg),
    /// Delete a topic with all of its workspaces
    RmTopic(TopicArg),
    /// Set a workspace description
    Describe(DescribeArgs),
    /// Start (if needed) and attach the workspace's session
    Open(WorkspaceArg),
    /// Reconcile metadata with the directory tree
    Sync,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only this topic
    pub topic: Option<String>,
}

#[derive(Args)]
pub struct TopicArg {
    /// Topic name
    pub name: String,
}

#[derive(Args)]
pub struct WorkspaceArg {
    /// Workspace as TOPIC/NAME
    pub workspace: String,
}

#[derive(Args)]
pub struct NewArgs {
    /// Workspace as TOPIC/NAME
    pub workspace: String,
    /// Description
    #[arg(short, long, default_value = "")]
    pub description: String,
}

#[derive(Args)]
pub struct RenameArgs {
    /// Workspace as TOPIC/NAME
    pub workspace: String,
    /// New name (same topic)
    pub new_name: String,
}

#[derive(Args)]
pub struct RenameTopicArgs {
    pub old_name: String,
    pub new_name: String,
}

#[derive(Args)]
pub struct MvArgs {
    /// Workspace as TOPIC/NAME
    pub workspace: String,
    /// Destination topic
    pub topic: String,
}

#[derive(Args)]
pub struct DescribeArgs {
    /// Workspace as TOPIC/NAME
    pub workspace: String,
    /// Description text (empty clears it)
    pub text: String,
}
