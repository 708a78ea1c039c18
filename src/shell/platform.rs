//! Platform-specific shell detection.

use std::path::{Path, PathBuf};

/// Known shell types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellType {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Cmd,
    Unknown,
}

impl ShellType {
    /// Parse shell type from executable name.
    pub fn from_executable(exe: &str) -> Self {
        let name = Path::new(exe)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();

        match name.as_str() {
            "bash" => ShellType::Bash,
            "zsh" => ShellType::Zsh,
            "fish" => ShellType::Fish,
            "powershell" | "pwsh" => ShellType::PowerShell,
            "cmd" => ShellType::Cmd,
            _ => ShellType::Unknown,
        }
    }
}

/// The user's shell executable.
pub fn shell_executable() -> PathBuf {
    if cfg!(target_os = "windows") {
        std::env::var("COMSPEC")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("cmd.exe"))
    } else {
        std::env::var("SHELL")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/bin/sh"))
    }
}

/// Flag that makes `shell` run the following argument as a command.
///
/// Bash and zsh run as interactive login shells (`-lic`) so version
/// managers activated from rc files (nvm, fnm, mise, asdf) are on PATH. In CI
/// the interactive flag is dropped: without a TTY it fails to set up job
/// control. Other shells get a plain `-c`.
pub fn shell_flag(shell: ShellType) -> &'static str {
    match shell {
        ShellType::Cmd => "/C",
        ShellType::PowerShell => "-Command",
        ShellType::Bash | ShellType::Zsh if is_ci() => "-lc",
        ShellType::Bash | ShellType::Zsh => "-lic",
        ShellType::Fish | ShellType::Unknown => "-c",
    }
}

/// Check if running in a CI environment.
pub fn is_ci() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("CIRCLECI").is_ok()
        || std::env::var("TRAVIS").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_type_from_executable() {
        assert_eq!(ShellType::from_executable("/bin/bash"), ShellType::Bash);
        assert_eq!(ShellType::from_executable("/usr/bin/zsh"), ShellType::Zsh);
        assert_eq!(ShellType::from_executable("fish"), ShellType::Fish);
        assert_eq!(ShellType::from_executable("pwsh.exe"), ShellType::PowerShell);
        assert_eq!(ShellType::from_executable("C:\\cmd.exe"), ShellType::Cmd);
        assert_eq!(ShellType::from_executable("/bin/dash"), ShellType::Unknown);
    }

    #[test]
    fn windows_shells_use_their_own_flags() {
        assert_eq!(shell_flag(ShellType::Cmd), "/C");
        assert_eq!(shell_flag(ShellType::PowerShell), "-Command");
    }

    #[test]
    fn plain_shells_use_dash_c() {
        assert_eq!(shell_flag(ShellType::Fish), "-c");
        assert_eq!(shell_flag(ShellType::Unknown), "-c");
    }

    #[test]
    fn login_shells_always_load_profile() {
        assert!(shell_flag(ShellType::Bash).starts_with("-l"));
        assert!(shell_flag(ShellType::Zsh).starts_with("-l"));
    }

    #[test]
    fn shell_executable_is_not_empty() {
        assert!(!shell_executable().as_os_str().is_empty());
    }
}
