use clap::Parser;
use hangar::cli::commands::Cli;
use hangar::cli::handlers;
use hangar::io::logging;

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        // No subcommand → launch TUI (logs go to a file under the root)
        None => hangar::tui::run(cli.root.as_deref()),
        Some(_) => {
            logging::init_stderr("warn");
            handlers::dispatch(cli)
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
