//! Saved replay names

use crate::consts::MAX_STRING;
use crate::progress::Status;

/// Room kept for the `_NN` suffix
const SUFFIX_LEN: usize = 3;

fn status_code(status: Status) -> &'static str {
    match status {
        Status::Goal => "g",
        Status::Fall => "xf",
        Status::Time => "xt",
        Status::None => "x",
    }
}

/// Expand a replay name pattern and append the first free `_NN` suffix.
///
/// `%s` is the set id, `%l` the level name, `%r` the result code and `%%` a
/// literal percent. Unknown sequences are dropped. `exists` reports whether a
/// candidate name is taken; if `_01` through `_99` all are, `_99` is returned.
pub fn format_replay_name<F>(
    fmt: &str,
    set: Option<&str>,
    level: Option<&str>,
    status: Status,
    exists: F,
) -> String
where
    F: Fn(&str) -> bool,
{
    let set = set.unwrap_or("none");
    let level = level.unwrap_or("00");

    let mut name = String::new();
    let mut chars = fmt.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            name.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => name.push_str(set),
            Some('l') => name.push_str(level),
            Some('r') => name.push_str(status_code(status)),
            Some('%') => name.push('%'),
            _ => {}
        }
    }

    let mut end = name.len().min(MAX_STRING - 1 - SUFFIX_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    name.truncate(end);

    let mut candidate = String::new();
    for i in 1..100 {
        candidate = format!("{name}_{i:02}");
        if !exists(&candidate) {
            break;
        }
    }
    candidate
}
