//! Option parsing: the second pass over the tokens that command-path
//! resolution deferred.

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::command::Command;
use crate::error::{Error, Result};
use crate::flag::FlagState;
use crate::option::{OptionStyle, OptionToken, is_help_key, is_version_request, parse_option};
use crate::resolve::SEPARATOR;

/// The union of the flags declared along a command chain.
///
/// Commands are merged root to leaf and every name overwrites earlier
/// entries, so a leaf flag shadows an ancestor flag with the same name. All
/// names of one flag share a single [`FlagState`].
#[derive(Debug, Default)]
pub(crate) struct EffectiveFlags<'a> {
    keys: IndexMap<&'a str, usize>,
    states: Vec<FlagState<'a>>,
}

impl<'a> EffectiveFlags<'a> {
    pub(crate) fn merge(chain: &[&'a Command]) -> Self {
        let mut keys = IndexMap::new();
        let mut states = Vec::new();

        for command in chain {
            for flag in command.get_flags() {
                let slot = states.len();
                states.push(FlagState::new(flag));
                for name in flag.names() {
                    keys.insert(name, slot);
                }
            }
        }

        Self { keys, states }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&FlagState<'a>> {
        self.slot(key).map(|slot| &self.states[slot])
    }

    /// Distinct flags still reachable under at least one name, in the order
    /// their first name was registered.
    pub(crate) fn reachable(&self) -> impl Iterator<Item = &FlagState<'a>> {
        self.reachable_slots()
            .into_iter()
            .map(|slot| &self.states[slot])
    }

    /// Apply env/default values and enforce `required` on every reachable flag.
    pub(crate) fn validate(&mut self, env: &[(String, String)]) -> Result<()> {
        for slot in self.reachable_slots() {
            self.states[slot].validate(env)?;
        }
        Ok(())
    }

    fn slot(&self, key: &str) -> Option<usize> {
        self.keys.get(key).copied()
    }

    fn reachable_slots(&self) -> IndexSet<usize> {
        self.keys.values().copied().collect()
    }

    fn single_char_slot(&self, c: char) -> Option<usize> {
        let mut buf = [0u8; 4];
        self.slot(c.encode_utf8(&mut buf))
    }

    /// `-abc` where `a`, `b` and `c` are all single-character flags. Any
    /// unknown character (or an inline value) disqualifies the whole token.
    fn combined_slots(&self, opt: &OptionToken<'_>) -> Option<Vec<usize>> {
        if opt.style != OptionStyle::Short || opt.value.is_some() {
            return None;
        }
        if opt.key.chars().nth(1).is_none() {
            return None;
        }
        opt.key.chars().map(|c| self.single_char_slot(c)).collect()
    }

    /// Whether `token` should be left alone by value lookahead.
    ///
    /// Dash tokens always count. Slash tokens only count when their key is a
    /// known flag or a help request, so `-I /usr/include` still binds the
    /// path.
    fn looks_like_option(&self, token: &str) -> bool {
        if token.starts_with('-') {
            return true;
        }
        match parse_option(token) {
            Some(opt) if opt.style == OptionStyle::Windows && !opt.key.is_empty() => {
                is_help_key(opt.key) || self.slot(opt.key).is_some()
            }
            _ => false,
        }
    }
}

/// Result of scanning the deferred tokens.
#[derive(Debug, Default)]
pub(crate) struct Scan<'a> {
    pub params: Vec<&'a str>,
    pub help: bool,
    pub version: bool,
    /// First failure seen. Help and version requests take precedence over it.
    pub error: Option<Error>,
}

/// Match `tokens` against `flags`, accumulating values into the flag states
/// and collecting everything else as positional parameters.
///
/// Unknown options are not an error: they are kept as positional parameters
/// with their original spelling.
pub(crate) fn scan<'a>(
    flags: &mut EffectiveFlags<'a>,
    tokens: &[&'a str],
    version_enabled: bool,
) -> Scan<'a> {
    let mut out = Scan {
        params: Vec::with_capacity(tokens.len()),
        ..Default::default()
    };

    let mut idx = 0usize;
    let mut after_separator = false;
    while idx < tokens.len() {
        let token = tokens[idx];
        idx += 1;

        if after_separator {
            out.params.push(token);
            continue;
        }
        if token == SEPARATOR {
            after_separator = true;
            continue;
        }

        let Some(opt) = parse_option(token) else {
            out.params.push(token);
            continue;
        };
        if opt.key.is_empty() {
            out.params.push(token);
            continue;
        }

        if is_help_key(opt.key) {
            out.help = true;
            continue;
        }
        if version_enabled && is_version_request(&opt) && flags.slot(opt.key).is_none() {
            out.version = true;
            continue;
        }

        if let Some(slots) = flags.combined_slots(&opt) {
            for slot in slots {
                if let Err(err) = flags.states[slot].add_option("") {
                    out.error.get_or_insert(err);
                }
            }
            continue;
        }

        let Some(slot) = flags.slot(opt.key) else {
            debug!(token, "unrecognized option kept as positional parameter");
            out.params.push(token);
            continue;
        };

        let value = match opt.value {
            Some(value) => value,
            None if flags.states[slot].flag().is_switch() => "",
            None => match tokens.get(idx) {
                Some(next) if !flags.looks_like_option(next) => {
                    idx += 1;
                    next
                }
                _ => "",
            },
        };

        if let Err(err) = flags.states[slot].add_option(value) {
            out.error.get_or_insert(err);
        }
    }

    out
}
