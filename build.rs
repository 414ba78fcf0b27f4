use clap::CommandFactory;
use clap_complete::{Shell, generate_to};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::io::Result;
use std::path::{Path, PathBuf};

#[path = "src/cli.rs"]
mod cli;

use cli::Cli;

const BIN: &str = "markmatch";

fn generate_completions(outdir: &Path) -> Result<()> {
    let mut cmd = Cli::command();
    for shell in [Shell::Bash, Shell::Fish, Shell::Zsh] {
        generate_to(shell, &mut cmd, BIN, outdir)?;
    }
    Ok(())
}

fn render_page(cmd: clap::Command, title: &str, dir: &Path) -> Result<()> {
    let mut buffer = Vec::new();
    Man::new(cmd).title(title).render(&mut buffer)?;
    fs::write(dir.join(format!("{}.1", title)), buffer)
}

/// `markmatch.1` plus `markmatch-parse.1`.
fn generate_man_pages(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    let cmd = Cli::command();
    render_page(cmd.clone(), BIN, dir)?;

    if let Some(parse) = cmd.find_subcommand("parse") {
        render_page(parse.clone(), &format!("{}-parse", BIN), dir)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    if let Some(outdir) = env::var_os("OUT_DIR") {
        generate_completions(Path::new(&outdir))?;
    }
    generate_man_pages(&PathBuf::from("target/man"))?;

    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=build.rs");

    Ok(())
}
