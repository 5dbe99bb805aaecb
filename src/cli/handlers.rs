use std::error::Error;
use std::sync::Arc;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::{config_io, paths};
use crate::model::{Workspace, split_short_path};
use crate::ops::{Hangar, Outcome};
use crate::session::TmuxSessions;

type CmdResult = Result<(), Box<dyn Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let hangar = open_hangar(cli.root.as_deref())?;

    match cli.command {
        None => Ok(()),
        Some(cmd) => match cmd {
            Commands::Topics => cmd_topics(&hangar, json),
            Commands::List(args) => cmd_list(&hangar, args, json),
            Commands::NewTopic(args) => cmd_new_topic(&hangar, args),
            Commands::New(args) => cmd_new(&hangar, args),
            Commands::Rename(args) => cmd_rename(&hangar, args),
            Commands::RenameTopic(args) => cmd_rename_topic(&hangar, args),
            Commands::Mv(args) => cmd_mv(&hangar, args),
            Commands::Rm(args) => cmd_rm(&hangar, args),
            Commands::RmTopic(args) => cmd_rm_topic(&hangar, args),
            Commands::Describe(args) => cmd_describe(&hangar, args),
            Commands::Open(args) => cmd_open(&hangar, args),
            Commands::Sync => cmd_sync(&hangar),
        },
    }
}

/// Resolve the root and open it against the tmux server.
pub fn open_hangar(root_flag: Option<&str>) -> Result<Hangar, Box<dyn Error>> {
    let global = config_io::global_config()?;
    let root = paths::resolve_root(root_flag, global.get().root.as_deref());
    Ok(Hangar::open(&root, Arc::new(TmuxSessions::new()))?)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn find_workspace(hangar: &Hangar, short_path: &str) -> Result<Workspace, Box<dyn Error>> {
    if split_short_path(short_path).is_none() {
        return Err(format!("expected TOPIC/NAME, got \"{}\"", short_path).into());
    }
    hangar
        .workspaces
        .find(short_path)
        .ok_or_else(|| format!("workspace not found: {}", short_path).into())
}

fn print_warnings<T>(outcome: &Outcome<T>) {
    for w in &outcome.warnings {
        eprintln!("warning: {}", w);
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_topics(hangar: &Hangar, json: bool) -> CmdResult {
    let topics: Vec<_> = hangar
        .topics
        .all()
        .into_iter()
        .map(|t| {
            let count = hangar.workspaces.for_topic(&t.name).len();
            (t, count)
        })
        .collect();
    if json {
        let items: Vec<TopicJson> = topics.iter().map(|(t, n)| topic_to_json(t, *n)).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if !topics.is_empty() {
        println!("{}", format_topics(&topics));
    }
    Ok(())
}

fn cmd_list(hangar: &Hangar, args: ListArgs, json: bool) -> CmdResult {
    if let Some(topic) = &args.topic
        && hangar.topics.find(topic).is_none()
    {
        return Err(format!("topic not found: {}", topic).into());
    }
    let outcome = hangar.workspaces.status(args.topic.as_deref());
    print_warnings(&outcome);
    let selected = hangar.workspaces.selected().map(|ws| ws.short_path());
    if json {
        let items: Vec<WorkspaceJson> = outcome
            .value
            .iter()
            .map(|s| status_to_json(s, selected.as_deref()))
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if !outcome.value.is_empty() {
        println!("{}", format_workspaces(&outcome.value, selected.as_deref()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_new_topic(hangar: &Hangar, args: TopicArg) -> CmdResult {
    let topic = hangar.topics.create(&args.name)?;
    println!("{}", topic.path().display());
    Ok(())
}

fn cmd_new(hangar: &Hangar, args: NewArgs) -> CmdResult {
    let (topic_name, name) = split_short_path(&args.workspace)
        .ok_or_else(|| format!("expected TOPIC/NAME, got \"{}\"", args.workspace))?;
    let topic = hangar
        .topics
        .find(topic_name)
        .ok_or_else(|| format!("topic not found: {}", topic_name))?;
    let outcome = hangar.workspaces.create(&topic, name, &args.description)?;
    print_warnings(&outcome);
    println!("{}", outcome.value.path().display());
    Ok(())
}

fn cmd_rename(hangar: &Hangar, args: RenameArgs) -> CmdResult {
    let ws = find_workspace(hangar, &args.workspace)?;
    let outcome = hangar.workspaces.rename(&ws, &args.new_name)?;
    print_warnings(&outcome);
    println!("{}", outcome.value.short_path());
    Ok(())
}

fn cmd_rename_topic(hangar: &Hangar, args: RenameTopicArgs) -> CmdResult {
    let topic = hangar
        .topics
        .find(&args.old_name)
        .ok_or_else(|| format!("topic not found: {}", args.old_name))?;
    let outcome = hangar.topics.rename(&topic, &args.new_name)?;
    print_warnings(&outcome);
    println!("{}", outcome.value.name);
    Ok(())
}

fn cmd_mv(hangar: &Hangar, args: MvArgs) -> CmdResult {
    let ws = find_workspace(hangar, &args.workspace)?;
    let topic = hangar
        .topics
        .find(&args.topic)
        .ok_or_else(|| format!("topic not found: {}", args.topic))?;
    let outcome = hangar.workspaces.move_to(&ws, &topic)?;
    print_warnings(&outcome);
    println!("{}", outcome.value.short_path());
    Ok(())
}

fn cmd_rm(hangar: &Hangar, args: WorkspaceArg) -> CmdResult {
    let ws = find_workspace(hangar, &args.workspace)?;
    let outcome = hangar.workspaces.delete(&ws)?;
    print_warnings(&outcome);
    Ok(())
}

fn cmd_rm_topic(hangar: &Hangar, args: TopicArg) -> CmdResult {
    let topic = hangar
        .topics
        .find(&args.name)
        .ok_or_else(|| format!("topic not found: {}", args.name))?;
    let outcome = hangar.topics.delete(&topic)?;
    print_warnings(&outcome);
    Ok(())
}

fn cmd_describe(hangar: &Hangar, args: DescribeArgs) -> CmdResult {
    let ws = find_workspace(hangar, &args.workspace)?;
    hangar.workspaces.describe(&ws, &args.text)?;
    Ok(())
}

fn cmd_open(hangar: &Hangar, args: WorkspaceArg) -> CmdResult {
    let ws = find_workspace(hangar, &args.workspace)?;
    let session = hangar.workspaces.ensure_session(&ws)?;
    hangar.workspaces.attach(&session)?;
    Ok(())
}

fn cmd_sync(hangar: &Hangar) -> CmdResult {
    hangar.workspaces.reload()?;
    println!(
        "{} topics, {} workspaces",
        hangar.topics.all().len(),
        hangar.workspaces.all().len()
    );
    Ok(())
}
