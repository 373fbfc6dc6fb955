// Renders the man page and shell completions from the CLI definition.

use clap::CommandFactory;
use clap_complete::{generate_to, Shell};

// Brings `Cli` (and `PathBuf`) into scope.
include!("src/cli.rs");

fn main() -> std::io::Result<()> {
    println!("cargo:rerun-if-changed=src/cli.rs");

    let out_dir = match std::env::var_os("OUT_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => return Ok(()),
    };

    let mut cmd = Cli::command();

    let man = clap_mangen::Man::new(cmd.clone());
    let mut buffer = Vec::new();
    man.render(&mut buffer)?;
    std::fs::write(out_dir.join("motifpipe-setup.1"), buffer)?;

    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
        generate_to(shell, &mut cmd, "motifpipe-setup", &out_dir)?;
    }
    Ok(())
}
