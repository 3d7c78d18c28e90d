//! String-to-value conversions shared by the positional, flag and binding
//! accessors.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// A type that can be produced from one raw command-line value.
pub trait FromArg: Sized {
    fn from_arg(raw: &str) -> std::result::Result<Self, String>;
}

impl FromArg for String {
    fn from_arg(raw: &str) -> std::result::Result<Self, String> {
        Ok(raw.to_string())
    }
}

impl FromArg for PathBuf {
    fn from_arg(raw: &str) -> std::result::Result<Self, String> {
        Ok(PathBuf::from(raw))
    }
}

impl FromArg for bool {
    fn from_arg(raw: &str) -> std::result::Result<Self, String> {
        parse_bool(raw).ok_or_else(|| "expected a boolean (true/false, t/f, 1/0)".to_string())
    }
}

macro_rules! from_arg_via_parse {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromArg for $ty {
                fn from_arg(raw: &str) -> std::result::Result<Self, String> {
                    raw.parse::<$ty>().map_err(|e| e.to_string())
                }
            }
        )*
    };
}

from_arg_via_parse!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, char,
);

/// Accepts the same spellings as Go's `strconv.ParseBool`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Convert `raw` into `T`, naming `target` in the error.
pub fn coerce<T: FromArg>(target: &str, raw: &str) -> Result<T> {
    T::from_arg(raw).map_err(|reason| Error::InvalidValue {
        target: target.to_string(),
        value: raw.to_string(),
        reason,
    })
}

/// Derive a flag name from an identifier: `dry_run`, `DryRun` and `dryRun`
/// all become `dry-run`; acronyms stay together (`APIResources` becomes
/// `api-resources`).
pub fn kebab_case(ident: &str) -> String {
    let ident = ident.strip_prefix("r#").unwrap_or(ident);
    let chars: Vec<char> = ident.chars().collect();
    let mut out = String::with_capacity(ident.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            if !out.is_empty() && !out.ends_with('-') {
                out.push('-');
            }
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 && !out.ends_with('-') {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_lower)
            {
                out.push('-');
            }
        }
        out.push(c.to_ascii_lowercase());
    }

    while out.ends_with('-') {
        out.pop();
    }
    out
}
