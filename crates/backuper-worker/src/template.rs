//! Placeholder substitution for script lines and output paths.
//!
//! Recognised tokens are `${BACKUP_ID}`, `${BACKUP_NAME}`, `${TEMP_DIR}`, and
//! `${VAR}` for any variable in the injected [`Environment`]. Built-in tokens
//! win over environment variables of the same name. Substitution is a single
//! left-to-right pass: inserted values are never scanned again, and unknown
//! tokens are kept verbatim.

use std::collections::HashMap;

const TOKEN_OPEN: &str = "${";
const TOKEN_CLOSE: char = '}';

/// Snapshot of environment variables available to templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the current process environment. Non-UTF-8 entries are skipped.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    /// Look up a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Values of the built-in tokens for one run.
#[derive(Debug, Clone, Copy)]
pub struct TemplateContext<'a> {
    /// Value of `${BACKUP_ID}`.
    pub backup_id: &'a str,
    /// Value of `${BACKUP_NAME}`.
    pub backup_name: &'a str,
    /// Value of `${TEMP_DIR}`.
    pub temp_dir: &'a str,
}

impl<'a> TemplateContext<'a> {
    fn builtin(&self, name: &str) -> Option<&'a str> {
        match name {
            "BACKUP_ID" => Some(self.backup_id),
            "BACKUP_NAME" => Some(self.backup_name),
            "TEMP_DIR" => Some(self.temp_dir),
            _ => None,
        }
    }
}

/// Replace every recognised token in `input`.
pub fn substitute(input: &str, context: &TemplateContext<'_>, env: &Environment) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find(TOKEN_OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + TOKEN_OPEN.len()..];

        let Some(end) = after_open.find(TOKEN_CLOSE) else {
            out.push_str(&rest[start..]);
            return out;
        };

        let name = &after_open[..end];
        match context.builtin(name).or_else(|| env.get(name)) {
            Some(value) => {
                out.push_str(value);
                rest = &after_open[end + 1..];
            }
            None => {
                // Keep the opener and rescan from the next character so a
                // nested `${...}` inside an unknown token still resolves.
                out.push_str(TOKEN_OPEN);
                rest = after_open;
            }
        }
    }

    out.push_str(rest);
    out
}
