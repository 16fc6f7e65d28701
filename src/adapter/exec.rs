//! External command resolution and invocation
//!
//! Executable lookups are memoized per command name for the life of the
//! process. Commands run as blocking subprocesses without a shell; each
//! template token becomes one argument, so substituted values never split
//! or expand.

use crate::error::AdapterError;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use tracing::debug;

/// Suffixes tried on Windows when `PATHEXT` is unset.
const WINDOWS_SUFFIXES: &[&str] = &["exe", "bat", "cmd", "com"];

fn found() -> &'static DashMap<String, PathBuf> {
    static FOUND: OnceLock<DashMap<String, PathBuf>> = OnceLock::new();
    FOUND.get_or_init(DashMap::new)
}

/// Locate an executable by name.
///
/// On Unix-like systems `which` is consulted first. Then every search
/// directory plus the current working directory is scanned, trying the
/// platform's executable suffixes.
pub fn resolve_executable(command: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
    if let Some(path) = found().get(command) {
        return Some(path.clone());
    }

    let path = locate(command, search_paths)?;
    debug!(command, path = %path.display(), "resolved executable");
    found().insert(command.to_string(), path.clone());
    Some(path)
}

fn locate(command: &str, search_paths: &[PathBuf]) -> Option<PathBuf> {
    let direct = Path::new(command);
    if direct.is_absolute() {
        return is_executable(direct).then(|| direct.to_path_buf());
    }

    let windows = cfg!(windows);
    if !windows {
        if let Some(path) = which(command) {
            return Some(path);
        }
    }

    let mut directories = search_paths.to_vec();
    if let Ok(cwd) = std::env::current_dir() {
        directories.push(cwd);
    }

    let suffixes = executable_suffixes(windows);
    directories.iter().find_map(|dir| {
        suffixes.iter().find_map(|suffix| {
            let candidate = if suffix.is_empty() {
                dir.join(command)
            } else {
                dir.join(format!("{}.{}", command, suffix))
            };
            is_executable(&candidate).then_some(candidate)
        })
    })
}

fn executable_suffixes(windows: bool) -> Vec<String> {
    let mut suffixes: Vec<String> = if windows {
        match std::env::var("PATHEXT") {
            Ok(pathext) => pathext
                .split(';')
                .map(|s| s.trim_start_matches('.').to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => WINDOWS_SUFFIXES.iter().map(|s| s.to_string()).collect(),
        }
    } else {
        Vec::new()
    };
    suffixes.push(String::new());
    suffixes
}

fn which(command: &str) -> Option<PathBuf> {
    let output = Command::new("which")
        .arg(command)
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn is_marker_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Replace `:name:` markers in a token with parameter values.
///
/// Markers with no matching parameter are removed.
fn substitute(token: &str, params: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    let mut rest = token;

    while let Some(start) = rest.find(':') {
        let after = &rest[start + 1..];
        match after.find(':') {
            Some(end) if is_marker_name(&after[..end]) => {
                out.push_str(&rest[..start]);
                if let Some(value) = params.get(&after[..end]) {
                    out.push_str(value);
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push_str(&rest[..=start]);
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Run a command template such as `:command: -o :destination: :source:`.
///
/// `params["command"]` names the executable and is resolved first. The
/// call succeeds only on a zero exit status, returning the last line of
/// standard output, or `None` when there was no output.
pub fn run_external(
    template: &str,
    params: &BTreeMap<String, String>,
    search_paths: &[PathBuf],
) -> Result<Option<String>, AdapterError> {
    let command = params
        .get("command")
        .ok_or_else(|| AdapterError::InvalidArguments("no command parameter".to_string()))?;
    let executable = resolve_executable(command, search_paths)
        .ok_or_else(|| AdapterError::External(format!("command {} not found", command)))?;

    let mut resolved = params.clone();
    resolved.insert(
        "command".to_string(),
        executable.to_string_lossy().into_owned(),
    );

    let argv: Vec<String> = template
        .split_whitespace()
        .map(|token| substitute(token, &resolved))
        .filter(|arg| !arg.is_empty())
        .collect();
    let (program, rest) = argv
        .split_first()
        .ok_or_else(|| AdapterError::InvalidArguments("empty command template".to_string()))?;

    debug!(program = %program, args = ?rest, "running external command");
    let output = Command::new(program)
        .args(rest)
        .stdin(Stdio::null())
        .stderr(Stdio::piped())
        .output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AdapterError::External(format!(
            "{} exited with {}: {}",
            command,
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .last()
        .map(str::to_string))
}
