use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::adapters::process_utils::run_and_collect_first_line;
use crate::execution::{CommandSpec, ProcessExecutor, ProcessSpawnRequest};
use crate::models::{ManagerAction, ManagerKind};

/// Resolves `binary_name` to an executable path: first through the platform
/// lookup tool (`where.exe` / `which`), then by walking `extra_paths` and
/// `PATH` directly.
pub(crate) async fn which_executable(
    executor: &dyn ProcessExecutor,
    binary_name: &str,
    extra_paths: &[String],
    manager: ManagerKind,
) -> Option<PathBuf> {
    if binary_name.trim().is_empty() {
        return None;
    }

    match which_executable_via_lookup(executor, binary_name, manager).await {
        Some(found) => Some(found),
        None => discover_executable_path(binary_name, extra_paths),
    }
}

async fn which_executable_via_lookup(
    executor: &dyn ProcessExecutor,
    binary_name: &str,
    manager: ManagerKind,
) -> Option<PathBuf> {
    let lookup = if cfg!(windows) { "where.exe" } else { "which" };
    let request = ProcessSpawnRequest::new(
        manager,
        ManagerAction::Detect,
        CommandSpec::new(lookup).arg(binary_name),
    );

    run_and_collect_first_line(executor, request)
        .await
        .map(PathBuf::from)
}

fn discover_executable_path(binary_name: &str, extra_paths: &[String]) -> Option<PathBuf> {
    if binary_name.contains('/') || binary_name.contains('\\') {
        let absolute = PathBuf::from(binary_name);
        return absolute.is_file().then_some(absolute);
    }

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for extra in extra_paths {
        push_candidates(Path::new(extra), binary_name, &mut candidates, &mut seen);
    }

    if let Some(path_var) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&path_var) {
            push_candidates(&dir, binary_name, &mut candidates, &mut seen);
        }
    }

    candidates.into_iter().find(|candidate| candidate.is_file())
}

fn push_candidates(
    dir: &Path,
    binary_name: &str,
    candidates: &mut Vec<PathBuf>,
    seen: &mut HashSet<String>,
) {
    for file_name in executable_file_names(binary_name) {
        let candidate = dir.join(file_name);
        let rendered = candidate.to_string_lossy().to_string();
        if rendered.is_empty() {
            continue;
        }

        if seen.insert(rendered) {
            candidates.push(candidate);
        }
    }
}

fn executable_file_names(binary_name: &str) -> Vec<String> {
    if !cfg!(windows) || Path::new(binary_name).extension().is_some() {
        return vec![binary_name.to_string()];
    }

    let extensions = std::env::var("PATHEXT").unwrap_or_else(|_| ".COM;.EXE;.BAT;.CMD".to_string());
    extensions
        .split(';')
        .filter(|extension| !extension.is_empty())
        .map(|extension| format!("{binary_name}{}", extension.to_ascii_lowercase()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::discover_executable_path;

    #[cfg(unix)]
    #[test]
    fn finds_executable_in_extra_path() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("fake-manager");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();

        let found = discover_executable_path(
            "fake-manager",
            &[dir.path().to_string_lossy().to_string()],
        );
        assert_eq!(found, Some(tool));
    }

    #[test]
    fn unknown_binary_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let found = discover_executable_path(
            "hostup-definitely-missing-tool",
            &[dir.path().to_string_lossy().to_string()],
        );
        assert_eq!(found, None);
    }
}
