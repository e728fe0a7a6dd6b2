//! Named-tool dispatch.
//!
//! External agents call the four operations by name with JSON arguments. The
//! outputs keep the historical shapes: string operations signal failure with a
//! leading `Error`, object operations with an `{"error": ...}` object.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::app::pipeline::Grader;

pub const PARSE_FILE: &str = "parse_file";
pub const CHECK_PLAGIARISM: &str = "check_plagiarism";
pub const GRADE_TEXT: &str = "grade_text";
pub const GENERATE_FEEDBACK: &str = "generate_feedback";

/// Every tool name, in the order they are usually called.
pub const TOOL_NAMES: [&str; 4] =
    [PARSE_FILE, CHECK_PLAGIARISM, GRADE_TEXT, GENERATE_FEEDBACK];

#[derive(Debug, Deserialize)]
struct ParseFileArgs {
    file_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct TextArgs {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GradeArgs {
    text: String,
    rubric: String,
}

/// Run the tool called `name` and return its JSON output.
pub fn dispatch(grader: &Grader, name: &str, args: &Value) -> Value {
    debug!(tool = name, "dispatching tool call");
    match name {
        PARSE_FILE => match parse_args::<ParseFileArgs>(args) {
            Ok(a) => Value::String(
                grader
                    .parse_file(&a.file_path)
                    .unwrap_or_else(|e| e.sentinel()),
            ),
            Err(msg) => Value::String(msg),
        },
        CHECK_PLAGIARISM => match parse_args::<TextArgs>(args) {
            Ok(a) => match grader.check_plagiarism(&a.text) {
                Ok(report) => to_object(&report),
                Err(e) => error_object(e.to_string()),
            },
            Err(msg) => error_object(msg),
        },
        GRADE_TEXT => match parse_args::<GradeArgs>(args) {
            Ok(a) => match grader.grade_text(&a.text, &a.rubric) {
                Ok(report) => to_object(&report),
                Err(e) => error_object(e.to_string()),
            },
            Err(msg) => error_object(msg),
        },
        GENERATE_FEEDBACK => match parse_args::<GradeArgs>(args) {
            Ok(a) => Value::String(match grader.generate_feedback(&a.text, &a.rubric) {
                Ok(feedback) => feedback.0,
                Err(e) => e.sentinel(),
            }),
            Err(msg) => Value::String(msg),
        },
        other => {
            warn!(tool = other, "unknown tool requested");
            Value::String(format!("Error: Tool '{other}' not found."))
        }
    }
}

/// Parse the raw `--args` string, then dispatch.
pub fn dispatch_str(grader: &Grader, name: &str, raw_args: &str) -> Value {
    match serde_json::from_str::<Value>(raw_args) {
        Ok(args) => dispatch(grader, name, &args),
        Err(e) => Value::String(format!("Error: invalid tool arguments: {e}")),
    }
}

fn parse_args<T: DeserializeOwned>(args: &Value) -> Result<T, String> {
    T::deserialize(args).map_err(|e| format!("Error: invalid tool arguments: {e}"))
}

// Object keys come out in insertion order (serde_json `preserve_order`).
fn to_object<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| error_object(e.to_string()))
}

fn error_object(message: String) -> Value {
    json!({ "error": message })
}
