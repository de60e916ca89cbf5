//! Command line front-end for inspecting and editing quick select collections.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::hotkeys::{HotkeyCommand, KeySpec};
use crate::app::library::CollectionLibrary;
use crate::app::plugin::QuickMenus;
use crate::app::quick_select::{QuickSelectCollection, QuickSelectSet};
use crate::domain::layout::radial_positions;
use crate::domain::model::RadialPosition;
use crate::host::headless::HeadlessHost;
use crate::host::store::JsonFileStore;
use crate::infra::config::Config;
use crate::infra::logging;

#[derive(Debug, Parser)]
#[command(name = "quickmenus", author, version, about = "Marking menus and quick select sets")]
pub struct Cli {
    /// Use this config file instead of the user config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory of the collection store.
    #[arg(long, global = true)]
    store: Option<PathBuf>,
    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the radial slots used for a number of menu items.
    Layout {
        #[arg(allow_negative_numbers = true)]
        count: i64,
    },
    /// Parse a hotkey and show the commands it would be bound to.
    Hotkey {
        spec: String,
        #[arg(long, default_value = "FMenus")]
        menu: String,
    },
    /// Manage collections.
    #[command(subcommand)]
    Collections(CollectionsCommand),
    /// Manage the sets of a collection.
    #[command(subcommand)]
    Sets(SetsCommand),
    /// Press a menu hotkey against a headless host and print the resulting menus.
    Simulate(SimulateArgs),
    /// Generate shell completions.
    Completions { shell: Shell },
}

#[derive(Debug, Subcommand)]
enum CollectionsCommand {
    /// List stored collections; the active one is marked with `*`.
    List,
    /// Print a collection's sets.
    Show {
        name: Option<String>,
        #[arg(long)]
        json: bool,
    },
    Create { name: String },
    Rename { old: String, new: String },
    Delete { name: String },
    /// Make a collection active, creating it when missing.
    Use { name: String },
}

#[derive(Debug, Args)]
struct Target {
    /// Collection to edit; defaults to the active one.
    #[arg(long, short)]
    collection: Option<String>,
}

#[derive(Debug, Subcommand)]
enum SetsCommand {
    /// Save nodes as a new set.
    Add {
        #[command(flatten)]
        target: Target,
        #[arg(long, short)]
        position: Option<RadialPosition>,
        #[arg(long, short)]
        title: Option<String>,
        #[arg(required = true)]
        nodes: Vec<String>,
    },
    /// Remove a set by index or radial position.
    Remove {
        #[command(flatten)]
        target: Target,
        #[arg(long, conflicts_with = "position", required_unless_present = "position")]
        index: Option<usize>,
        #[arg(long)]
        position: Option<RadialPosition>,
    },
    /// Change a set's title; an empty title restores the derived one.
    Rename {
        #[command(flatten)]
        target: Target,
        index: usize,
        title: String,
    },
    /// Remove every set.
    Clear {
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Configured menu group to press, e.g. FMenus.
    menu: String,
    /// Panel type under the cursor.
    #[arg(long, default_value = "modelPanel")]
    panel: String,
    /// Scene selection at press time.
    #[arg(long, num_args = 1..)]
    selection: Vec<String>,
    /// Let the host show the menus before release.
    #[arg(long)]
    show: bool,
}

/// Parse arguments and run the requested command.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(store) = &cli.store {
        config.defaults.store_dir = Some(store.clone());
    }

    match cli.command {
        Command::Layout { count } => print_layout(count),
        Command::Hotkey { spec, menu } => print_hotkey(&spec, &menu),
        Command::Collections(command) => run_collections(command, &config),
        Command::Sets(command) => run_sets(command, &config),
        Command::Simulate(args) => simulate(args, config),
        Command::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "quickmenus", &mut io::stdout());
            Ok(())
        }
    }
}

fn open_library(config: &Config) -> CollectionLibrary {
    let store = JsonFileStore::new(config.store_dir());
    tracing::debug!(store = %store.root().display(), "opening collection store");
    CollectionLibrary::new(Box::new(store), config.defaults.default_collection().to_owned())
}

fn print_layout(count: i64) -> Result<()> {
    for (index, slot) in radial_positions(count)?.into_iter().enumerate() {
        match slot {
            Some(position) => println!("{index}: {position}"),
            None => println!("{index}: overflow"),
        }
    }
    Ok(())
}

fn print_hotkey(spec: &str, menu: &str) -> Result<()> {
    let key = KeySpec::parse(spec)?;
    println!("key: {key}");
    println!("press: {}", HotkeyCommand::build(menu, None).id);
    println!("release: {}", HotkeyCommand::destroy(menu, None).id);
    Ok(())
}

fn run_collections(command: CollectionsCommand, config: &Config) -> Result<()> {
    let mut library = open_library(config);
    match command {
        CollectionsCommand::List => {
            let names = library.names()?;
            if names.is_empty() {
                println!("no collections");
                return Ok(());
            }
            let active = library.active_name()?;
            for name in names {
                let marker = if name == active { "*" } else { " " };
                println!("{marker} {name}");
            }
        }
        CollectionsCommand::Show { name, json } => {
            let name = match name {
                Some(name) => name,
                None => library.active_name()?,
            };
            if !library.contains(&name)? {
                bail!("no collection named '{name}'");
            }
            let collection = library.get(&name)?;
            if json {
                let data = serde_json::to_string_pretty(collection.sets())
                    .context("failed to serialize collection")?;
                println!("{data}");
            } else {
                print_collection(collection);
            }
        }
        CollectionsCommand::Create { name } => library.create(&name)?,
        CollectionsCommand::Rename { old, new } => library.rename(&old, &new)?,
        CollectionsCommand::Delete { name } => {
            if !library.delete(&name)? {
                bail!("no collection named '{name}'");
            }
        }
        CollectionsCommand::Use { name } => library.set_active(&name)?,
    }
    Ok(())
}

fn print_collection(collection: &QuickSelectCollection) {
    println!("{} ({} sets)", collection.name(), collection.len());
    for (index, set) in collection.sets().iter().enumerate() {
        let slot = set
            .position()
            .map(|position| position.to_string())
            .unwrap_or_else(|| "-".into());
        println!("  {index} [{slot}] {}", set.effective_title());
        for node in set.nodes() {
            println!("      {node}");
        }
    }
}

fn run_sets(command: SetsCommand, config: &Config) -> Result<()> {
    let mut library = open_library(config);
    let target_name = |library: &mut CollectionLibrary, target: &Target| match &target.collection {
        Some(name) => Ok(name.clone()),
        None => library.active_name(),
    };

    match command {
        SetsCommand::Add {
            target,
            position,
            title,
            nodes,
        } => {
            let name = target_name(&mut library, &target)?;
            let set = QuickSelectSet::new(&nodes, title, position)?;
            library.with_collection(&name, |collection, store| collection.add_set(set, store))?;
        }
        SetsCommand::Remove {
            target,
            index,
            position,
        } => {
            let name = target_name(&mut library, &target)?;
            match (index, position) {
                (Some(index), _) => {
                    library.with_collection(&name, |collection, store| {
                        collection.remove_at_index(index, store).map(|_| ())
                    })?;
                }
                (None, Some(position)) => {
                    let removed = library.with_collection(&name, |collection, store| {
                        collection.remove_at_position(position, store)
                    })?;
                    if !removed {
                        println!("no set at {position}");
                    }
                }
                (None, None) => bail!("either --index or --position is required"),
            }
        }
        SetsCommand::Rename {
            target,
            index,
            title,
        } => {
            let name = target_name(&mut library, &target)?;
            library.with_collection(&name, |collection, store| {
                collection.modify_set(index, store, |set| {
                    set.rename(Some(title));
                    Ok(())
                })
            })?;
        }
        SetsCommand::Clear { target } => {
            let name = target_name(&mut library, &target)?;
            library.with_collection(&name, |collection, store| collection.clear(store))?;
        }
    }
    Ok(())
}

fn simulate(args: SimulateArgs, config: Config) -> Result<()> {
    if config.menu(&args.menu).is_none() {
        bail!("no menu group named '{}' is configured", args.menu);
    }

    let store = JsonFileStore::new(config.store_dir());
    let mut host = HeadlessHost::new().with_panel(args.panel);
    host.select(args.selection);

    let mut quick = QuickMenus::new(config, Box::new(store));
    quick.load(&mut host)?;

    let report = quick.press(&args.menu, &mut host);
    for (kind, err) in &report.failed {
        println!("failed: {kind}: {err}");
    }
    for kind in &report.skipped {
        println!("skipped: {kind}");
    }
    if args.show {
        for popup in host.popup_ids() {
            quick.menu_will_show(&popup, &mut host)?;
        }
    }
    print!("{}", host.render());

    let outcome = quick.release(&mut host);
    println!("shown: {}", outcome.shown);
    if let Some(command) = outcome.secondary {
        println!("secondary: {command}");
    }
    Ok(())
}
