use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::command::Command;
use crate::context::Context;
use crate::error::Result;
use crate::flag::Flag;
use crate::help::{DefaultHelp, HelpRenderer};
use crate::i18n::Translations;
use crate::parser::{EffectiveFlags, scan};
use crate::resolve::resolve;

/// What an argument vector asks for.
#[derive(Debug)]
pub enum ParseOutcome<'a> {
    /// Dispatch the chain with [`Context::next`].
    Run(Context<'a>),
    /// Render help for [`Context::command`].
    Help(Context<'a>),
    /// `--version` output, newline terminated.
    Version(String),
}

/// A git-style command line application: a root command holding global
/// flags and the top-level commands, plus help configuration.
pub struct App {
    name: String,
    version: Option<String>,
    root: Command,
    groups: IndexMap<String, String>,
    languages: Translations,
    help: Box<dyn HelpRenderer>,
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("root", &self.root)
            .field("groups", &self.groups)
            .finish_non_exhaustive()
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new("")
    }
}

impl App {
    /// An empty `name` is replaced by the file name of argv[0] at run time.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            version: None,
            root: Command::default(),
            groups: IndexMap::new(),
            languages: Translations::default(),
            help: Box::new(DefaultHelp::default()),
        }
    }

    /// Enables `--version` / `-V` unless a flag claims those names.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Replace the help renderer.
    pub fn help<H: HelpRenderer + 'static>(mut self, renderer: H) -> Self {
        self.help = Box::new(renderer);
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

    /// Caption printed above the commands tagged with `name`.
    pub fn group(mut self, name: impl Into<String>, caption: impl Into<String>) -> Self {
        self.add_group(name, caption);
        self
    }

    pub fn languages(mut self, languages: Translations) -> Self {
        self.languages = languages;
        self
    }

    /// Global flag, visible to every command.
    pub fn flag(mut self, flag: Flag) -> Self {
        self.add_flag(flag);
        self
    }

    pub fn flags(mut self, flags: impl IntoIterator<Item = Flag>) -> Self {
        for flag in flags {
            self.add_flag(flag);
        }
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.add_command(command);
        self
    }

    pub fn commands(mut self, commands: impl IntoIterator<Item = Command>) -> Self {
        for command in commands {
            self.add_command(command);
        }
        self
    }

    /// Root handler. It runs first for every dispatched invocation, and
    /// arguments that name no command reach it instead of falling back to
    /// help. An empty argument list still renders help.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> Result<()> + 'static,
    {
        self.root.set_action(Box::new(action));
        self
    }

    pub fn add_header(&mut self, text: &str) {
        self.root.add_header(text);
    }

    pub fn add_footer(&mut self, text: &str) {
        self.root.add_footer(text);
    }

    pub fn add_group(&mut self, name: impl Into<String>, caption: impl Into<String>) {
        self.groups.insert(name.into(), caption.into());
    }

    pub fn add_flag(&mut self, flag: Flag) {
        self.root.add_flag(flag);
    }

    pub fn add_command(&mut self, command: Command) {
        self.root.add_child(command);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn root(&self) -> &Command {
        &self.root
    }

    pub fn help_renderer(&self) -> &dyn HelpRenderer {
        self.help.as_ref()
    }

    /// The caption registered for `group`, or the group name itself.
    pub fn group_caption<'s>(&'s self, group: &'s str) -> &'s str {
        match self.groups.get(group) {
            Some(caption) if !caption.is_empty() => caption,
            _ => group,
        }
    }

    pub fn translate<'s>(&'s self, text: &'s str, alternative: &str) -> &'s str {
        self.languages.translate(text, alternative)
    }

    fn display_name(&self, argv0: Option<&String>) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        argv0
            .and_then(|p| Path::new(p).file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Resolve and parse a full argument vector (argv[0] included).
    ///
    /// `env` is consulted for flags that declare an environment variable.
    /// Parse failures are only reported when neither help nor version output
    /// was requested.
    pub fn parse<'a>(
        &'a self,
        args: &'a [String],
        env: &[(String, String)],
    ) -> Result<ParseOutcome<'a>> {
        for conflict in self.root.sibling_conflicts() {
            warn!("{conflict}");
        }

        let name = self.display_name(args.first());
        let rest = args.get(1..).unwrap_or_default();

        let resolution = resolve(&self.root, rest);
        debug!(
            commands = ?resolution.chain.iter().map(|c| c.get_name()).collect::<Vec<_>>(),
            deferred = ?resolution.deferred,
            "resolved command path"
        );

        let mut flags = EffectiveFlags::merge(&resolution.chain);
        let pass = scan(&mut flags, &resolution.deferred, self.version.is_some());

        let explicit_help = resolution.help || pass.help;
        if pass.version && !explicit_help {
            let version = self.version.as_deref().unwrap_or_default();
            return Ok(ParseOutcome::Version(format!("{name} {version}\n")));
        }

        // A bare invocation always shows help. Other root-only invocations
        // reach the root handler when there is one.
        let root_only = resolution.chain.len() == 1;
        let help = explicit_help || rest.is_empty() || (root_only && !self.root.has_action());
        if help {
            debug!(explicit = explicit_help, "help requested");
        } else {
            if let Some(err) = pass.error {
                return Err(err);
            }
            flags.validate(env)?;
        }

        let ctx = Context::new(self, name, resolution.chain, flags, pass.params);
        Ok(if help {
            ParseOutcome::Help(ctx)
        } else {
            ParseOutcome::Run(ctx)
        })
    }

    /// Parse `args`, then dispatch the handler chain or write help/version
    /// output to `out`.
    pub fn run_with(
        &self,
        args: &[String],
        env: &[(String, String)],
        out: &mut dyn Write,
    ) -> Result<()> {
        match self.parse(args, env)? {
            ParseOutcome::Run(mut ctx) => ctx.next(),
            ParseOutcome::Help(ctx) => Ok(self.help.render(&ctx, out)?),
            ParseOutcome::Version(text) => {
                out.write_all(text.as_bytes())?;
                Ok(())
            }
        }
    }

    /// Process entry point: runs with the real argv and environment, writes
    /// help to stdout and reports failures on stderr.
    pub fn execute(&self) -> ExitCode {
        let args: Vec<String> = std::env::args_os()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let env: Vec<(String, String)> = std::env::vars_os()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.to_string_lossy().into_owned(),
                )
            })
            .collect();

        let mut stdout = io::stdout().lock();
        match self.run_with(&args, &env, &mut stdout) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                debug!(error = ?err, "invocation failed");
                eprintln!("error: {err}");
                ExitCode::FAILURE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn display_name_comes_from_argv0_when_unset() {
        let app = App::default().command(Command::new("x"));
        let args = argv(&["/usr/local/bin/tool"]);
        match app.parse(&args, &[]).unwrap() {
            ParseOutcome::Help(ctx) => assert_eq!(ctx.name(), "tool"),
            other => panic!("expected help, got: {other:?}"),
        }

        let app = App::new("  named ").command(Command::new("x"));
        assert_eq!(app.name(), "named");
    }

    #[test]
    fn run_with_writes_help_and_version() {
        let app = App::new("tool")
            .version("0.1.0")
            .command(Command::new("build").about("Build it"));

        let mut out = Vec::new();
        app.run_with(&argv(&["tool"]), &[], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("build  Build it"));

        let mut out = Vec::new();
        app.run_with(&argv(&["tool", "-V"]), &[], &mut out).unwrap();
        assert_eq!(out, b"tool 0.1.0\n");
    }

    #[test]
    fn run_with_dispatches_and_propagates_errors() {
        let app = App::new("tool").command(
            Command::new("check")
                .flag(Flag::new("strict").switch())
                .action(|ctx| {
                    if ctx.flag_bool("strict")? {
                        return Err("strict mode failed".into());
                    }
                    Ok(())
                }),
        );

        let mut out = Vec::new();
        app.run_with(&argv(&["tool", "check"]), &[], &mut out).unwrap();
        assert!(out.is_empty());

        let err = app
            .run_with(&argv(&["tool", "check", "--strict"]), &[], &mut out)
            .unwrap_err();
        assert_eq!(err.to_string(), "strict mode failed");
    }

    #[test]
    fn empty_argv_is_help_even_with_root_action() {
        let app = App::new("prog")
            .action(|_| Err("root handler must not run".into()))
            .command(Command::new("create"));

        match app.parse(&argv(&["prog"]), &[]).unwrap() {
            ParseOutcome::Help(ctx) => assert_eq!(ctx.commands().len(), 1),
            other => panic!("expected help, got: {other:?}"),
        }

        let args = argv(&["prog", "stray"]);
        match app.parse(&args, &[]).unwrap() {
            ParseOutcome::Run(ctx) => assert_eq!(ctx.args(), ["stray"]),
            other => panic!("expected run, got: {other:?}"),
        }
    }

    #[test]
    fn group_caption_falls_back_to_name() {
        let app = App::new("tool").group("Deploy", "Deploy Commands:");
        assert_eq!(app.group_caption("Deploy"), "Deploy Commands:");
        assert_eq!(app.group_caption("Other"), "Other");
    }
}
