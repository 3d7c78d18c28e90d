use crate::error::{Error, Result};

/// A named option descriptor.
///
/// A flag is declared with one or more comma-separated names (`"include,I"`);
/// the first one is its key. A separate short alias can be added with
/// [`Flag::short`]. Every name resolves to the same flag during parsing, so
/// occurrences under any of them accumulate into one value list.
#[derive(Debug, Clone, Default)]
pub struct Flag {
    names: Vec<String>,
    short: Option<String>,
    default_value: Option<String>,
    hint: Option<String>,
    usage: String,
    env: Option<String>,
    required: bool,
    multiple: bool,
    switch: bool,
}

impl Flag {
    pub fn new(names: &str) -> Self {
        Self {
            names: names
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(|n| n.trim_start_matches('-').to_string())
                .collect(),
            ..Default::default()
        }
    }

    /// Add a single-character alias (`-I`). Leading dashes are ignored.
    pub fn short(mut self, short: impl Into<String>) -> Self {
        let short = short.into();
        let short = short.trim().trim_start_matches('-');
        if !short.is_empty() {
            self.short = Some(short.to_string());
        }
        self
    }

    /// Value used when the flag never occurs.
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Parameter name shown in help (`--include <DIR>`).
    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Environment variable read when the flag is absent from the command line.
    pub fn env(mut self, var: impl Into<String>) -> Self {
        self.env = Some(var.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Never take the following token as this flag's value.
    pub fn switch(mut self) -> Self {
        self.switch = true;
        self
    }

    /// The first declared name, or the short alias when no name was given.
    pub fn key(&self) -> &str {
        self.names
            .first()
            .or(self.short.as_ref())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Every name this flag answers to, short alias last.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names
            .iter()
            .chain(self.short.iter())
            .map(String::as_str)
    }

    pub fn get_short(&self) -> Option<&str> {
        self.short.as_deref()
    }

    pub fn get_default(&self) -> Option<&str> {
        self.default_value.as_deref()
    }

    pub fn get_hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    pub fn get_usage(&self) -> &str {
        &self.usage
    }

    pub fn get_env(&self) -> Option<&str> {
        self.env.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn is_switch(&self) -> bool {
        self.switch
    }

    /// How the flag is spelled in messages: `--include` or `-I`.
    pub fn display_name(&self) -> String {
        let key = self.key();
        if key.chars().count() == 1 {
            format!("-{key}")
        } else {
            format!("--{key}")
        }
    }
}

/// Where a flag's current values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// Not set anywhere.
    None,
    CommandLine,
    Env,
    Default,
}

/// The values collected for one flag during a parse.
#[derive(Debug, Clone)]
pub struct FlagState<'a> {
    flag: &'a Flag,
    used: bool,
    source: ValueSource,
    options: Vec<String>,
}

impl<'a> FlagState<'a> {
    pub(crate) fn new(flag: &'a Flag) -> Self {
        Self {
            flag,
            used: false,
            source: ValueSource::None,
            options: Vec::new(),
        }
    }

    /// Record one occurrence. An empty value marks the flag used without
    /// storing anything.
    pub(crate) fn add_option(&mut self, value: &str) -> Result<()> {
        if self.used && !self.flag.multiple {
            return Err(Error::DuplicateOption(self.flag.display_name()));
        }

        self.used = true;
        self.source = ValueSource::CommandLine;
        if !value.is_empty() {
            self.options.push(value.to_string());
        }
        Ok(())
    }

    /// Apply env and default values, then enforce `required`.
    pub(crate) fn validate(&mut self, env: &[(String, String)]) -> Result<()> {
        if !self.used {
            let from_env = self
                .flag
                .env
                .as_deref()
                .and_then(|var| env_lookup(env, var));
            if let Some(value) = from_env {
                self.source = ValueSource::Env;
                self.options = vec![value.to_string()];
                return Ok(());
            }

            if self.flag.required {
                return Err(Error::MissingRequired(self.flag.display_name()));
            }
        }

        if self.options.is_empty() {
            if let Some(default_value) = self.flag.default_value.as_deref() {
                if !default_value.is_empty() {
                    self.options.push(default_value.to_string());
                    if !self.used {
                        self.source = ValueSource::Default;
                    }
                }
            }
        }

        Ok(())
    }

    pub fn flag(&self) -> &'a Flag {
        self.flag
    }

    /// Whether the flag occurred on the command line.
    pub fn is_used(&self) -> bool {
        self.used
    }

    pub fn source(&self) -> ValueSource {
        self.source
    }

    /// The first value.
    pub fn get(&self) -> Option<&str> {
        self.options.first().map(String::as_str)
    }

    pub fn get_at(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    pub fn list(&self) -> &[String] {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

fn env_lookup<'e>(env: &'e [(String, String)], key: &str) -> Option<&'e str> {
    env.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}
