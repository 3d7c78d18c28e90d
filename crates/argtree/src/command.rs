use std::collections::HashMap;
use std::fmt;

use crate::context::Context;
use crate::error::Result;
use crate::flag::Flag;

/// Handler invoked when its command is part of the resolved chain.
pub type Action = Box<dyn Fn(&mut Context<'_>) -> Result<()>>;

/// A node in the command tree.
#[derive(Default)]
pub struct Command {
    name: String,
    group: String,
    about: String,
    long_about: String,
    header: String,
    footer: String,
    aliases: Vec<String>,
    flags: Vec<Flag>,
    children: Vec<Command>,
    action: Option<Action>,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("aliases", &self.aliases)
            .field("flags", &self.flags)
            .field("children", &self.children)
            .field("action", &self.action.is_some())
            .finish()
    }
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Group tag used to caption this command in its parent's help.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// One-line description. A leading `$` makes it a translation key.
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = about.into();
        self
    }

    pub fn long_about(mut self, long_about: impl Into<String>) -> Self {
        self.long_about = long_about.into();
        self
    }

    pub fn header(mut self, text: &str) -> Self {
        self.add_header(text);
        self
    }

    pub fn footer(mut self, text: &str) -> Self {
        self.add_footer(text);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn subcommand(mut self, child: Command) -> Self {
        self.add_child(child);
        self
    }

    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<()> + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    /// Append a child. Sibling names are not checked here; see
    /// [`Command::sibling_conflicts`].
    pub fn add_child(&mut self, child: Command) {
        self.children.push(child);
    }

    pub fn add_flag(&mut self, flag: Flag) {
        self.flags.push(flag);
    }

    pub fn add_header(&mut self, text: &str) {
        self.header.push_str(text);
    }

    pub fn add_footer(&mut self, text: &str) {
        self.footer.push_str(text);
    }

    pub(crate) fn set_action(&mut self, action: Action) {
        self.action = Some(action);
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    pub fn get_group(&self) -> &str {
        &self.group
    }

    pub fn get_about(&self) -> &str {
        &self.about
    }

    pub fn get_long_about(&self) -> &str {
        &self.long_about
    }

    pub fn get_header(&self) -> &str {
        &self.header
    }

    pub fn get_footer(&self) -> &str {
        &self.footer
    }

    pub fn get_aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn get_flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn get_children(&self) -> &[Command] {
        &self.children
    }

    pub fn get_action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    /// Exact, case-sensitive match against the name or any alias.
    pub fn is_named(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|a| a == name)
    }

    /// The first child (in declaration order) answering to `name`.
    pub fn find_child(&self, name: &str) -> Option<&Command> {
        self.children.iter().find(|c| c.is_named(name))
    }

    /// Describe every name or alias shared by two siblings anywhere below
    /// this command. Only the first of such siblings is reachable.
    pub fn sibling_conflicts(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_conflicts(&mut out);
        out
    }

    fn collect_conflicts(&self, out: &mut Vec<String>) {
        let mut seen: HashMap<&str, &str> = HashMap::new();
        for child in &self.children {
            let names = std::iter::once(child.name.as_str()).chain(
                child
                    .aliases
                    .iter()
                    .map(String::as_str)
                    .filter(|a| *a != child.name),
            );
            for name in names {
                if let Some(prev) = seen.insert(name, child.name.as_str()) {
                    let parent = if self.name.is_empty() {
                        "<root>"
                    } else {
                        self.name.as_str()
                    };
                    out.push(format!(
                        "command name conflict under '{parent}': '{name}' refers to both '{prev}' and '{}'",
                        child.name
                    ));
                }
            }
            child.collect_conflicts(out);
        }
    }
}
