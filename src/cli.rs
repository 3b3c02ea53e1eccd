use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand};

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

#[derive(Debug, Parser)]
#[command(name = "rolodex")]
#[command(bin_name = "rolodex")]
#[command(version)]
#[command(about = "Find the people in your message exports who are not in your CRM yet")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'C',
        long,
        env = "ROLODEX_ROOT",
        default_value = ".",
        help = "CRM root that contains the people directory and .rolodex.toml."
    )]
    pub root: PathBuf,

    #[arg(
        long,
        env = "ROLODEX_PEOPLE_DIR",
        help = "Directory of person markdown files (defaults to <root>/people)."
    )]
    pub people_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "ROLODEX_ADDRESSBOOK",
        help = "AddressBook root holding Sources/*/AddressBook-v22.abcddb."
    )]
    pub addressbook: Option<PathBuf>,

    #[arg(
        short = 'c',
        long,
        env = "ROLODEX_CONFIG",
        help = "Config file (defaults to <root>/.rolodex.toml when present)."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        value_name = "TIMESTAMP",
        help = "Treat this time as now, e.g. '2025-01-06 08:00'."
    )]
    pub as_of: Option<String>,

    #[arg(short, long, global = true, help = "Log debug detail to stderr.")]
    pub verbose: bool,

    #[arg(
        short,
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Only log warnings and errors."
    )]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Turn a directory of exports into contact reports and drafts.")]
    Sync(SyncArgs),
    #[command(about = "List new-person candidates from one iMessage export.")]
    Candidates(CandidatesArgs),
    #[command(about = "Classify a single phone number, email or name.")]
    Resolve(ResolveArgs),
    #[command(about = "List the people already on file.")]
    People(PeopleArgs),
    #[command(about = "Show contacts recently added to the address book.")]
    NewContacts(NewContactsArgs),
    #[command(about = "Generate or install shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    #[arg(help = "Directory holding imessages.md, slack.md and the email exports.")]
    pub sync_dir: PathBuf,

    #[arg(long, help = "Print the run summary as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CandidatesArgs {
    #[arg(help = "iMessage thread export to scan.")]
    pub export: PathBuf,

    #[arg(short, long, help = "Write the markdown report here instead of stdout.")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Print candidates as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    #[arg(help = "Phone number, email or chat identifier.")]
    pub handle: String,

    #[arg(short, long, help = "Display name seen alongside the handle.")]
    pub name: Option<String>,

    #[arg(long, help = "Print the decision as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct PeopleArgs {
    #[arg(long, help = "Print people as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct NewContactsArgs {
    #[arg(
        short,
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..=crate::config::MAX_WINDOW_DAYS),
        help = "Look back this many days."
    )]
    pub days: u32,

    #[arg(short, long, help = "Event or place to mention in the drafts.")]
    pub event: Option<String>,

    #[arg(short, long, help = "Write the markdown report here instead of stdout.")]
    pub output: Option<PathBuf>,

    #[arg(long, help = "Print contacts as JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(value_enum, help = "Target shell. Detected from $SHELL if omitted.")]
    pub shell: Option<clap_complete::Shell>,

    #[arg(
        short = 'i',
        long = "install",
        help = "Write the script under your home directory instead of stdout."
    )]
    pub install: bool,
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
