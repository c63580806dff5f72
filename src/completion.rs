//! # Shell Completion Module
//!
//! Generates completion scripts through clap and lists song names from the
//! catalog for dynamic completion of `similar` and `playlist`.
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! cadence completion bash > ~/.local/share/bash-completion/completions/cadence
//!
//! # Generate zsh completions
//! cadence completion zsh > ~/.config/zsh/completions/_cadence
//! ```

use crate::db;
use anyhow::Result;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use log::debug;
use std::io::{self, Write};
use std::path::Path;

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    let bin_name = cmd.get_name().to_string();
    generate(gen, cmd, bin_name, &mut io::stdout());
}

pub fn shell_to_completion_shell(shell: crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Song names from the catalog at `db_path`, deduplicated, in catalog order.
///
/// A missing database yields no names rather than an error, so completion
/// never fails noisily before the first import.
pub fn get_song_completions(db_path: &Path) -> Result<Vec<String>> {
    if !db_path.exists() {
        debug!("No catalog at {}, no song completions", db_path.display());
        return Ok(Vec::new());
    }

    let conn = db::open(db_path)?;
    let mut seen = std::collections::HashSet::new();
    Ok(db::song_names(&conn)?
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect())
}

/// Writes one completion candidate per line, quoting names with whitespace.
pub fn write_song_completions<W: Write>(out: &mut W, names: &[String]) -> io::Result<()> {
    for name in names {
        if name.contains(char::is_whitespace) {
            writeln!(out, "\"{}\"", name.replace('"', "\\\""))?;
        } else {
            writeln!(out, "{name}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_conversion() {
        assert_eq!(
            shell_to_completion_shell(crate::cli::Shell::Bash),
            CompletionShell::Bash
        );
        assert_eq!(
            shell_to_completion_shell(crate::cli::Shell::Zsh),
            CompletionShell::Zsh
        );
    }

    #[test]
    fn test_get_song_completions_missing_db() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = get_song_completions(&dir.path().join("nope.db"));
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_names_with_spaces_are_quoted() {
        let mut out = Vec::new();
        let names = vec!["Teardrop".to_string(), "So \"What\" Now".to_string()];
        write_song_completions(&mut out, &names).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Teardrop\n\"So \\\"What\\\" Now\"\n"
        );
    }
}
