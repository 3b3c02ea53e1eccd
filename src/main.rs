mod app;
mod cli;
mod completions;
mod config;
mod directory;
mod domain;
mod export;
#[cfg(test)]
mod main_tests;
mod people;
mod reports;
mod resolver;
mod ui;

use std::path::Path;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn print_json(value: &impl serde::Serialize) -> Result<(), app::AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes a rendered report to `output`, or prints it when no path is given.
fn emit_report(output: Option<&Path>, report: &str) -> Result<(), app::AppError> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, report)?;
            log::info!("wrote {}", path.display());
            println!("{}", path.display());
        }
        None => print!("{report}"),
    }
    Ok(())
}

fn app_options(cli: &cli::Cli) -> app::AppOptions {
    app::AppOptions {
        root: cli.root.clone(),
        people_dir: cli.people_dir.clone(),
        addressbook: cli.addressbook.clone(),
        config: cli.config.clone(),
        as_of: cli.as_of.clone(),
    }
}

fn run() -> Result<(), app::AppError> {
    use clap::Parser;
    use cli::Commands;

    let cli = cli::Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Commands::Completions(args) = &cli.command {
        return completions::run_completions_command(args.shell, args.install);
    }

    let app = app::App::open(app_options(&cli))?;

    match cli.command {
        Commands::Sync(args) => {
            let summary = app.sync(&args.sync_dir)?;
            if args.json {
                print_json(&summary)?;
            } else {
                ui::print_sync_summary(&summary);
            }
        }
        Commands::Candidates(args) => {
            let run = app.candidates(&args.export)?;
            if args.json {
                print_json(&run)?;
            } else if args.output.is_some() {
                emit_report(args.output.as_deref(), &run.report)?;
                ui::print_candidate_run(&run);
            } else {
                emit_report(None, &run.report)?;
            }
        }
        Commands::Resolve(args) => {
            let view = app.resolve_handle(&args.handle, args.name.as_deref())?;
            if args.json {
                print_json(&view)?;
            } else {
                ui::print_handle(&view);
            }
        }
        Commands::People(args) => {
            let people = app.list_people();
            if args.json {
                print_json(&people)?;
            } else {
                ui::print_people(&people);
            }
        }
        Commands::NewContacts(args) => {
            let view = app.new_contacts(args.days, args.event.as_deref())?;
            if args.json {
                print_json(&view)?;
            } else if args.output.is_some() {
                emit_report(args.output.as_deref(), &view.report)?;
                ui::print_new_contacts(&view.contacts, view.days);
            } else {
                emit_report(None, &view.report)?;
                println!();
            }
        }
        Commands::Completions(_) => {}
    }

    Ok(())
}
