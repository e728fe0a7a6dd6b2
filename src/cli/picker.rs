//! Finding documents to grade and choosing one at the terminal.
//!
//! Discovery is shared with the TUI's Upload tab. The text prompt reads from
//! any `BufRead`, so the selection rules are exercised without a terminal.

use std::ffi::OsStr;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::domain::DocumentKind;
use crate::error::{AppError, EXIT_USAGE};

/// Directories below the starting point that are still searched.
const MAX_DEPTH: usize = 4;

/// `.pdf` / `.docx` files under the current directory, sorted by display path.
pub fn discover_documents() -> Vec<PathBuf> {
    documents_under(Path::new("."))
}

fn documents_under(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![(root.to_path_buf(), 0usize)];

    while let Some((dir, depth)) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();
            if file_type.is_dir() {
                if depth < MAX_DEPTH && !is_ignored_dir(&entry.file_name()) {
                    pending.push((path, depth + 1));
                }
            } else if file_type.is_file() && DocumentKind::from_path(&path).is_some() {
                found.push(path);
            }
        }
    }

    found.sort_by_cached_key(|p| pretty_path(p));
    found
}

// Hidden directories (VCS metadata, caches) and build output.
fn is_ignored_dir(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('.') || name == "target" || name == "node_modules"
}

/// Path for display, without a leading `./`.
pub fn pretty_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

/// Check that `path` names an existing `.pdf` or `.docx` file.
pub fn check_document(path: &Path) -> Result<PathBuf, AppError> {
    let problem = if DocumentKind::from_path(path).is_none() {
        format!("Expected a .pdf or .docx file (got: {}).", path.display())
    } else if path.is_dir() {
        format!("Expected a file, got a directory: {}", path.display())
    } else if !path.exists() {
        format!("File not found: {}", path.display())
    } else {
        return Ok(path.to_path_buf());
    };
    Err(AppError::new(EXIT_USAGE, problem))
}

/// What one line of prompt input asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Selection {
    Cancel,
    Pick(PathBuf),
    /// Not usable; the message says why and the prompt repeats.
    Invalid(String),
}

/// Interpret a prompt answer: `q`, a 1-based index into `files`, or a path.
pub fn interpret(input: &str, files: &[PathBuf]) -> Selection {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        return Selection::Cancel;
    }
    if input.is_empty() {
        return Selection::Invalid("Enter a number or a path.".to_string());
    }

    let candidate = match input.parse::<usize>() {
        Ok(n) => match n.checked_sub(1).and_then(|i| files.get(i)) {
            Some(path) => path.as_path(),
            None => {
                return Selection::Invalid(format!(
                    "Invalid choice: {n}. Enter a number between 1 and {}.",
                    files.len()
                ));
            }
        },
        Err(_) => Path::new(input),
    };

    match check_document(candidate) {
        Ok(path) => Selection::Pick(path),
        Err(err) => Selection::Invalid(err.to_string()),
    }
}

/// Ask on stdin/stdout which discovered document to use.
pub fn prompt_for_document_path() -> Result<PathBuf, AppError> {
    let files = discover_documents();
    choose_document(&files, io::stdin().lock(), io::stdout().lock())
}

/// List `files`, then read answers from `input` until one selects a document.
pub fn choose_document<R: BufRead, W: Write>(
    files: &[PathBuf],
    mut input: R,
    mut out: W,
) -> Result<PathBuf, AppError> {
    if files.is_empty() {
        return Err(AppError::new(
            EXIT_USAGE,
            "No .pdf or .docx files found. Provide one with `grader parse <file>`.",
        ));
    }

    let write_err =
        |e: io::Error| AppError::new(EXIT_USAGE, format!("Failed to write prompt: {e}"));

    writeln!(out, "Found {} document(s):", files.len()).map_err(write_err)?;
    for (n, path) in (1..).zip(files) {
        writeln!(out, "{n:>3}) {}", pretty_path(path)).map_err(write_err)?;
    }

    let mut line = String::new();
    loop {
        write!(out, "Select a file by number (1-{}) or type a path (q to quit): ", files.len())
            .and_then(|()| out.flush())
            .map_err(write_err)?;

        line.clear();
        let read = input
            .read_line(&mut line)
            .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to read input: {e}")))?;
        if read == 0 {
            return Err(AppError::new(
                EXIT_USAGE,
                "No input received. Provide a document path with `grader parse <file>`.",
            ));
        }

        match interpret(&line, files) {
            Selection::Pick(path) => return Ok(path),
            Selection::Cancel => return Err(AppError::new(EXIT_USAGE, "Canceled.")),
            Selection::Invalid(why) => writeln!(out, "{why}").map_err(write_err)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, b"x").unwrap();
        path
    }

    fn relative(root: &Path, found: &[PathBuf]) -> Vec<String> {
        found
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn discovery_skips_hidden_and_build_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "b.docx");
        touch(root, "week1/a.PDF");
        touch(root, "notes.txt");
        touch(root, "target/c.pdf");
        touch(root, ".git/d.pdf");
        touch(root, "node_modules/e.docx");

        let found = documents_under(root);
        assert_eq!(relative(root, &found), ["b.docx", "week1/a.PDF"]);
    }

    #[test]
    fn discovery_stops_below_max_depth() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "1/2/3/4/shallow.pdf");
        touch(root, "1/2/3/4/5/deep.pdf");

        let found = documents_under(root);
        assert_eq!(relative(root, &found), ["1/2/3/4/shallow.pdf"]);
    }

    #[test]
    fn check_rejects_wrong_extension_directories_and_missing_files() {
        let err = check_document(Path::new("essay.txt")).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);

        let err = check_document(Path::new("definitely-missing.docx")).unwrap_err();
        assert!(err.to_string().contains("File not found"));

        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("drafts.pdf");
        fs::create_dir(&folder).unwrap();
        assert!(check_document(&folder).unwrap_err().to_string().contains("directory"));

        let path = touch(dir.path(), "essay.docx");
        assert_eq!(check_document(&path).unwrap(), path);
    }

    #[test]
    fn answers_are_interpreted() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![touch(dir.path(), "a.pdf"), touch(dir.path(), "b.docx")];

        assert_eq!(interpret("Q\n", &files), Selection::Cancel);
        assert_eq!(interpret(" 2 ", &files), Selection::Pick(files[1].clone()));
        assert_eq!(
            interpret("0", &files),
            Selection::Invalid("Invalid choice: 0. Enter a number between 1 and 2.".to_string())
        );
        assert!(matches!(interpret("", &files), Selection::Invalid(_)));

        let typed = files[0].display().to_string();
        assert_eq!(interpret(&typed, &files), Selection::Pick(files[0].clone()));
        match interpret("notes.txt", &files) {
            Selection::Invalid(why) => assert!(why.starts_with("Expected a .pdf or .docx")),
            other => panic!("unexpected selection: {other:?}"),
        }
    }

    #[test]
    fn prompt_repeats_until_a_valid_answer() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![touch(dir.path(), "essay.pdf")];
        let mut out = Vec::new();

        let picked = choose_document(&files, Cursor::new("7\nnotes.txt\n1\n"), &mut out).unwrap();
        assert_eq!(picked, files[0]);

        let shown = String::from_utf8(out).unwrap();
        assert!(shown.starts_with("Found 1 document(s):\n"));
        assert!(shown.contains("Invalid choice: 7."));
        assert!(shown.contains("Expected a .pdf or .docx file (got: notes.txt)."));
        assert_eq!(shown.matches("Select a file").count(), 3);
    }

    #[test]
    fn prompt_cancel_and_end_of_input_are_usage_errors() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![touch(dir.path(), "essay.pdf")];

        let err = choose_document(&files, Cursor::new("q\n"), Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Canceled.");

        let err = choose_document(&files, Cursor::new(""), Vec::new()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
        assert!(err.to_string().starts_with("No input received"));

        let err = choose_document(&[], Cursor::new("1\n"), Vec::new()).unwrap_err();
        assert!(err.to_string().starts_with("No .pdf or .docx files found"));
    }
}
