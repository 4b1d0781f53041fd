//! Module descriptor parsing
//!
//! Only the parts of `go.mod` that can pull files from disk into a build
//! are interpreted: `replace` directives whose target is a filesystem
//! path. Everything else (`module`, `go`, `require`, `exclude`, ...) names
//! remote coordinates and is covered by hashing the file contents.
//!
//! `go.work` shares the syntax, so the same parser also collects its
//! `use` directories.

use crate::error::{GrError, GrResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Module descriptor file name
pub const DESCRIPTOR: &str = "go.mod";

/// Dependency lock file name
pub const LOCKFILE: &str = "go.sum";

/// Workspace file name
pub const WORKSPACE: &str = "go.work";

/// Workspace lock file name
pub const WORKSPACE_LOCKFILE: &str = "go.work.sum";

/// A `replace` directive pointing at a directory on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalReplace {
    /// Module path being replaced (left-hand side, without version)
    pub module: String,
    /// Target path exactly as written in the descriptor
    pub target: String,
}

/// Parsed view of a module descriptor
#[derive(Debug, Clone, Default)]
pub struct GoMod {
    /// Declared module path, if any
    pub module: Option<String>,
    /// Local-path replacements in declaration order
    pub local_replaces: Vec<LocalReplace>,
    /// Module directories listed by `use` (workspace files only)
    pub uses: Vec<String>,
}

impl GoMod {
    /// Read and parse the descriptor at `path`
    pub fn from_file(path: &Path) -> GrResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| GrError::io(format!("reading {}", path.display()), e))?;
        Self::parse(&content).map_err(|reason| GrError::MalformedDependency {
            descriptor: path.to_path_buf(),
            reason,
        })
    }

    /// Parse descriptor text
    pub fn parse(content: &str) -> Result<Self, String> {
        let mut gomod = GoMod::default();
        let mut block: Option<String> = None;

        for (lineno, raw) in content.lines().enumerate() {
            let lineno = lineno + 1;
            let tokens = tokenize(raw).map_err(|e| format!("line {}: {}", lineno, e))?;
            let Some((first, rest)) = tokens.split_first() else {
                continue;
            };

            if let Some(verb) = &block {
                if first == ")" {
                    block = None;
                    continue;
                }
                gomod.directive(verb, &tokens, lineno)?;
                continue;
            }

            if rest.len() == 1 && rest[0] == "(" {
                block = Some(first.clone());
                continue;
            }
            gomod.directive(first, rest, lineno)?;
        }

        if let Some(verb) = block {
            return Err(format!("unterminated {} block", verb));
        }

        Ok(gomod)
    }

    fn directive(&mut self, verb: &str, args: &[String], lineno: usize) -> Result<(), String> {
        match verb {
            "module" => self.module = args.first().cloned(),
            "replace" => self.push_replace(args, lineno)?,
            "use" => match args {
                [dir] => self.uses.push(dir.clone()),
                _ => return Err(format!("line {}: use takes exactly one directory", lineno)),
            },
            _ => {}
        }
        Ok(())
    }

    fn push_replace(&mut self, args: &[String], lineno: usize) -> Result<(), String> {
        let arrow = args
            .iter()
            .position(|t| t == "=>")
            .ok_or_else(|| format!("line {}: replace without '=>'", lineno))?;

        let (lhs, rhs) = (&args[..arrow], &args[arrow + 1..]);
        let module = lhs
            .first()
            .ok_or_else(|| format!("line {}: replace without module path", lineno))?;

        let target = match rhs {
            [target] => target,
            // `path version` is a remote replacement
            [_, _] => return Ok(()),
            _ => return Err(format!("line {}: malformed replacement target", lineno)),
        };

        if is_local_path(target) {
            self.local_replaces.push(LocalReplace {
                module: module.clone(),
                target: target.clone(),
            });
        }
        Ok(())
    }

    /// Resolve local replacement targets against the descriptor's directory
    pub fn local_dirs(&self, module_dir: &Path) -> Vec<PathBuf> {
        self.local_replaces
            .iter()
            .map(|r| module_dir.join(&r.target))
            .collect()
    }

    /// Resolve `use` directories against the workspace file's directory
    pub fn use_dirs(&self, workspace_dir: &Path) -> Vec<PathBuf> {
        self.uses.iter().map(|u| workspace_dir.join(u)).collect()
    }
}

/// Whether a replacement target names a directory rather than a module path
fn is_local_path(target: &str) -> bool {
    target.starts_with("./")
        || target.starts_with("../")
        || target == "."
        || target == ".."
        || Path::new(target).is_absolute()
}

/// Split one line into tokens.
///
/// Quoted strings become a single unquoted token, `(` and `)` are tokens
/// of their own, and a `//` comment ends the line.
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut rest = line.trim_start();

    while !rest.is_empty() && !rest.starts_with("//") {
        let (token, tail) = match rest.as_bytes()[0] {
            b'(' | b')' => (rest[..1].to_string(), &rest[1..]),
            b'"' => interpreted_string(rest)?,
            b'`' => {
                let end = rest[1..].find('`').ok_or("unterminated raw string")?;
                (rest[1..end + 1].to_string(), &rest[end + 2..])
            }
            _ => {
                let end = rest
                    .find(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '`'))
                    .unwrap_or(rest.len());
                (rest[..end].to_string(), &rest[end..])
            }
        };
        tokens.push(token);
        rest = tail.trim_start();
    }

    Ok(tokens)
}

/// Decode a double-quoted string at the start of `s`
fn interpreted_string(s: &str) -> Result<(String, &str), String> {
    let mut value = String::new();
    let mut chars = s.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((value, &s[i + 1..])),
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, escaped)) => value.push(escaped),
                None => break,
            },
            c => value.push(c),
        }
    }
    Err("unterminated quoted string".to_string())
}
