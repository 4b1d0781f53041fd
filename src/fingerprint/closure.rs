//! Source closure discovery
//!
//! Collects every file that can influence the build of a package: sources,
//! descriptors and lock files of the package's module, of modules nested in
//! its tree, and of every module reachable through local `replace`
//! directives, wherever they live on disk. A `go.work` above the package
//! switches the build to workspace mode, so it joins the closure together
//! with the modules it uses.

use crate::error::{GrError, GrResult};
use crate::fingerprint::gomod::{GoMod, DESCRIPTOR, LOCKFILE, WORKSPACE, WORKSPACE_LOCKFILE};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// File extensions `go build` feeds to the compiler, assembler or cgo
const SOURCE_EXTENSIONS: &[&str] = &[
    "go", "s", "S", "sx", "c", "h", "cc", "cpp", "cxx", "hh", "hpp", "hxx", "m", "f", "F", "for",
    "f90", "syso",
];

/// Find the module that owns `dir`: `dir` itself or its closest ancestor
/// containing a descriptor.
pub fn find_module_root(dir: &Path) -> GrResult<PathBuf> {
    let dir = dir
        .canonicalize()
        .map_err(|e| GrError::io(format!("resolving {}", dir.display()), e))?;

    dir.ancestors()
        .find(|d| d.join(DESCRIPTOR).is_file())
        .map(Path::to_path_buf)
        .ok_or_else(|| GrError::MalformedDependency {
            descriptor: dir.join(DESCRIPTOR),
            reason: format!("no {} in {} or any parent directory", DESCRIPTOR, dir.display()),
        })
}

/// Compute the set of files the build of the package at `root` depends on.
///
/// Paths are canonical and absolute. Local `replace` edges may form cycles;
/// every module directory is processed at most once.
pub fn closure_files(root: &Path) -> GrResult<BTreeSet<PathBuf>> {
    let package = root
        .canonicalize()
        .map_err(|e| GrError::io(format!("resolving {}", root.display()), e))?;
    let module = find_module_root(&package)?;

    let mut files = BTreeSet::new();
    let mut queue = VecDeque::from([module]);

    if let Some(work) = find_workspace(&package) {
        debug!("Workspace: {}", work.display());
        let sum = work.with_file_name(WORKSPACE_LOCKFILE);
        if sum.is_file() {
            files.insert(sum);
        }
        queue.extend(workspace_modules(&work)?);
        files.insert(work);
    }

    let mut visited: HashSet<PathBuf> = HashSet::new();
    // Module roots whose whole subtree has already been collected
    let mut walked: HashSet<PathBuf> = HashSet::new();

    while let Some(unit) = queue.pop_front() {
        if !visited.insert(unit.clone()) {
            continue;
        }

        if !walked.contains(&unit) {
            for nested in collect_tree(&unit, &mut files)? {
                walked.insert(nested.clone());
                queue.push_back(nested);
            }
            walked.insert(unit.clone());
        }

        for dep in local_dependencies(&unit)? {
            debug!("{} -> {}", unit.display(), dep.display());
            queue.push_back(dep);
        }
    }

    debug!("Closure of {} module(s): {} files", visited.len(), files.len());
    Ok(files)
}

/// Nearest `go.work` in `dir` or its ancestors, as `go build` looks it up
fn find_workspace(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .map(|d| d.join(WORKSPACE))
        .find(|work| work.is_file())
}

/// Module directories a workspace file brings into the build
fn workspace_modules(work: &Path) -> GrResult<Vec<PathBuf>> {
    let base = work.parent().unwrap_or(Path::new("/"));
    let parsed = GoMod::from_file(work)?;

    let uses = parsed
        .uses
        .iter()
        .zip(parsed.use_dirs(base))
        .map(|(dir, path)| module_dir(work, &format!("use {}", dir), &path));
    let replaces = parsed
        .local_replaces
        .iter()
        .zip(parsed.local_dirs(base))
        .map(|(r, path)| module_dir(work, &format!("{} => {}", r.module, r.target), &path));

    uses.chain(replaces).collect()
}

/// Walk a module's directory tree, adding relevant files to `files`.
/// Returns the nested module roots encountered below `unit`.
fn collect_tree(unit: &Path, files: &mut BTreeSet<PathBuf>) -> GrResult<Vec<PathBuf>> {
    let mut nested = Vec::new();

    let walker = WalkDir::new(unit)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e));

    for entry in walker {
        let entry =
            entry.map_err(|e| GrError::io(format!("walking {}", unit.display()), e.into()))?;
        let path = entry.path();

        if entry.file_type().is_dir() {
            if entry.depth() > 0 && path.join(DESCRIPTOR).is_file() {
                debug!("Nested module: {}", path.display());
                nested.push(path.to_path_buf());
            }
            continue;
        }

        if is_closure_file(entry.file_name()) && path.is_file() {
            files.insert(path.to_path_buf());
        }
    }

    Ok(nested)
}

/// Resolve the local `replace` targets declared by the module at `unit`
fn local_dependencies(unit: &Path) -> GrResult<Vec<PathBuf>> {
    let descriptor = unit.join(DESCRIPTOR);
    let gomod = GoMod::from_file(&descriptor)?;

    gomod
        .local_replaces
        .iter()
        .zip(gomod.local_dirs(unit))
        .map(|(r, dir)| module_dir(&descriptor, &format!("{} => {}", r.module, r.target), &dir))
        .collect()
}

/// Canonicalize a directory referenced from `descriptor` and check that it
/// holds a module
fn module_dir(descriptor: &Path, reference: &str, dir: &Path) -> GrResult<PathBuf> {
    let malformed = |reason: String| GrError::MalformedDependency {
        descriptor: descriptor.to_path_buf(),
        reason: format!("{}: {}", reference, reason),
    };

    let dir = dir.canonicalize().map_err(|e| malformed(e.to_string()))?;
    if !dir.is_dir() {
        return Err(malformed("not a directory".to_string()));
    }
    if !dir.join(DESCRIPTOR).is_file() {
        return Err(malformed(format!("no {} in {}", DESCRIPTOR, dir.display())));
    }
    Ok(dir)
}

/// Entries the go tool never looks at
fn is_ignored(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.')
        || name.starts_with('_')
        || (entry.file_type().is_dir() && name == "testdata")
}

fn is_closure_file(name: &OsStr) -> bool {
    let Some(name) = name.to_str() else {
        return false;
    };
    if name == DESCRIPTOR || name == LOCKFILE {
        return true;
    }
    if name.ends_with("_test.go") {
        return false;
    }
    Path::new(name)
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}
