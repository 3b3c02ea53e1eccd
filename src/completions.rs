use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap_complete::{generate, Shell};

use crate::app::AppError;

const BIN_NAME: &str = "rolodex";

pub fn generate_completions(shell: Shell, buf: &mut dyn Write) {
    let mut cmd = crate::cli::styled_command();
    generate(shell, &mut cmd, BIN_NAME, buf);
}

/// Where `--install` writes the script for `shell`, relative to `home`.
/// Zsh gets an `_rolodex` function file that the user adds to `fpath`.
fn install_path(shell: Shell, home: &Path) -> Option<PathBuf> {
    match shell {
        Shell::Bash => Some(
            home.join(".local/share/bash-completion/completions")
                .join(BIN_NAME),
        ),
        Shell::Zsh => Some(home.join(".zfunc").join(format!("_{BIN_NAME}"))),
        Shell::Fish => Some(
            home.join(".config/fish/completions")
                .join(format!("{BIN_NAME}.fish")),
        ),
        _ => None,
    }
}

fn install_into(shell: Shell, home: &Path) -> Result<PathBuf, AppError> {
    let path = install_path(shell, home).ok_or_else(|| {
        AppError::InvalidArgument(format!("--install does not support {shell}; redirect stdout instead"))
    })?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut buf = Vec::new();
    generate_completions(shell, &mut buf);
    std::fs::write(&path, buf)?;
    if shell == Shell::Zsh {
        log::info!(
            "add `fpath=({} $fpath)` before compinit in .zshrc",
            path.parent().unwrap_or(home).display()
        );
    }
    Ok(path)
}

pub fn run_completions_command(shell: Option<Shell>, install: bool) -> Result<(), AppError> {
    let shell = shell.or_else(Shell::from_env).ok_or_else(|| {
        AppError::InvalidArgument("unable to detect shell from $SHELL; pass a shell name".to_string())
    })?;

    if install {
        let home = dirs::home_dir()
            .ok_or_else(|| AppError::NotFound("home directory".to_string()))?;
        let path = install_into(shell, &home)?;
        log::info!("completions installed to {}", path.display());
        println!("{}", path.display());
    } else {
        let mut stdout = io::stdout().lock();
        generate_completions(shell, &mut stdout);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(shell: Shell) -> String {
        let mut buf = Vec::new();
        generate_completions(shell, &mut buf);
        String::from_utf8(buf).expect("completions should be utf-8")
    }

    #[test]
    fn scripts_cover_rolodex_subcommands_and_flags() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
            let text = script(shell);
            for word in ["rolodex", "new-contacts", "candidates", "as-of", "people-dir"] {
                assert!(text.contains(word), "{shell} completions should mention {word}");
            }
        }
    }

    #[test]
    fn install_writes_one_file_per_shell_under_home() {
        let home = std::env::temp_dir().join(format!("rolodex-comp-{}", uuid::Uuid::now_v7()));

        let bash = install_into(Shell::Bash, &home).expect("bash install should succeed");
        assert!(bash.ends_with(".local/share/bash-completion/completions/rolodex"));
        let zsh = install_into(Shell::Zsh, &home).expect("zsh install should succeed");
        assert!(zsh.ends_with(".zfunc/_rolodex"));
        let fish = install_into(Shell::Fish, &home).expect("fish install should succeed");
        assert!(fish.ends_with(".config/fish/completions/rolodex.fish"));

        let content = std::fs::read_to_string(&zsh).expect("zsh script should be readable");
        assert!(content.contains("#compdef rolodex"));
        assert!(!home.join(".zshrc").exists());

        let _ = std::fs::remove_dir_all(home);
    }

    #[test]
    fn install_rejects_shells_without_a_home_location() {
        let home = std::env::temp_dir().join(format!("rolodex-comp-{}", uuid::Uuid::now_v7()));
        let err = install_into(Shell::Elvish, &home).expect_err("elvish has no install path");
        assert!(matches!(err, AppError::InvalidArgument(_)));
        assert!(!home.exists());
    }

    #[test]
    fn explicit_shell_prints_without_touching_the_environment() {
        assert!(run_completions_command(Some(Shell::Fish), false).is_ok());
    }
}
