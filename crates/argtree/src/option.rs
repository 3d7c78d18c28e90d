//! Classification of single option-style tokens.
//!
//! ```text
//! -v --verbose
//! -I/usr/include -I=/usr/include -I /usr/include
//! -aux
//! /c
//! /v:on
//! ```

/// Inline value separators; the first one found splits key from value.
/// `=` and `:` are dropped, a `/` stays at the front of the value so that
/// `-I/usr/include` keeps its absolute path.
const VALUE_SEPARATORS: [char; 3] = ['=', '/', ':'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionStyle {
    /// `/key`
    Windows,
    /// `-key`
    Short,
    /// `--key`
    Long,
}

/// One option-style token split into its parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionToken<'t> {
    pub style: OptionStyle,
    pub key: &'t str,
    /// `Some` when a separator was present, even if nothing follows it.
    pub value: Option<&'t str>,
}

/// Split `token` into style, key and inline value. Returns `None` for tokens
/// that are not option-style.
pub fn parse_option(token: &str) -> Option<OptionToken<'_>> {
    let (style, body) = if let Some(rest) = token.strip_prefix("--") {
        (OptionStyle::Long, rest)
    } else if let Some(rest) = token.strip_prefix('-') {
        (OptionStyle::Short, rest)
    } else if let Some(rest) = token.strip_prefix('/') {
        (OptionStyle::Windows, rest)
    } else {
        return None;
    };

    let (key, value) = match body.find(VALUE_SEPARATORS) {
        Some(idx) if body[idx..].starts_with('/') => (&body[..idx], Some(&body[idx..])),
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };

    Some(OptionToken { style, key, value })
}

/// `help` and `h` request help in any style, registered or not.
pub(crate) fn is_help_key(key: &str) -> bool {
    key == "help" || key == "h"
}

pub(crate) fn is_version_request(opt: &OptionToken<'_>) -> bool {
    matches!(
        (opt.style, opt.key),
        (OptionStyle::Long, "version") | (OptionStyle::Short, "V")
    )
}
