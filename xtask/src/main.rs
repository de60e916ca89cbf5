use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest for the quickmenus crate
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Review pending menu snapshots with cargo insta
    Snapshots {
        /// Accept every pending snapshot instead of reviewing interactively
        #[arg(long)]
        accept: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
        Commands::Snapshots { accept } => run_insta(accept)?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run").arg("-p").arg("quickmenus");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo nextest run failed");
    }
    Ok(())
}

fn run_insta(accept: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("insta")
        .arg(if accept { "accept" } else { "review" })
        .arg("-p")
        .arg("quickmenus");
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo insta failed");
    }
    Ok(())
}
