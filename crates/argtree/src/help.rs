//! Help text rendering.
//!
//! Default layout:
//!
//! ```text
//! {header}
//! {long description}
//!
//! {group caption}
//!   {command}  {about}
//!
//! Available options:
//!   {flags}  {usage}
//!
//! Inherited options:
//!   {flags}  {usage}
//!
//! Usage: {app} {commands} [<args>] [<options>]
//!
//! {footer}
//! ```

use std::io::{self, Write};

use indexmap::IndexMap;

use crate::app::App;
use crate::command::Command;
use crate::context::Context;
use crate::flag::Flag;

/// Writes help for the command a [`Context`] resolved to.
pub trait HelpRenderer {
    fn render(&self, ctx: &Context<'_>, out: &mut dyn Write) -> io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct DefaultHelp {
    indent: String,
}

impl Default for DefaultHelp {
    fn default() -> Self {
        Self {
            indent: "  ".to_string(),
        }
    }
}

impl DefaultHelp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix for command and option rows.
    pub fn indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    fn write_commands(&self, w: &mut HelpWriter<'_>, app: &App, cmd: &Command) -> io::Result<()> {
        let children = cmd.get_children();
        if children.is_empty() {
            return Ok(());
        }

        let mut groups: IndexMap<&str, Vec<&Command>> = IndexMap::new();
        for child in children {
            groups.entry(child.get_group()).or_default().push(child);
        }
        let width = children
            .iter()
            .map(|c| c.get_name().chars().count())
            .max()
            .unwrap_or(0);

        for (group, commands) in groups {
            w.divide();
            if group.is_empty() {
                w.write("Available commands:")?;
            } else {
                w.write(app.group_caption(group))?;
            }

            for c in commands {
                let prefix = format!("{}{:width$}  ", self.indent, c.get_name());
                let fallback = format!("{}_s", c.get_name());
                w.write_indent(&prefix, app.translate(c.get_about(), &fallback))?;
            }
        }
        Ok(())
    }

    fn write_flags(
        &self,
        w: &mut HelpWriter<'_>,
        app: &App,
        caption: &str,
        flags: &[&Flag],
    ) -> io::Result<()> {
        if flags.is_empty() {
            return Ok(());
        }

        let rows: Vec<(String, String)> = flags
            .iter()
            .map(|f| (flag_left(f), flag_help(app, f)))
            .collect();
        let width = rows
            .iter()
            .map(|(left, _)| left.chars().count())
            .max()
            .unwrap_or(0);

        w.divide();
        w.write(caption)?;
        for (left, help) in rows {
            let prefix = format!("{}{:width$}  ", self.indent, left);
            w.write_indent(&prefix, &help)?;
        }
        Ok(())
    }

    fn write_usage(&self, w: &mut HelpWriter<'_>, ctx: &Context<'_>) -> io::Result<()> {
        let mut line = format!("Usage: {}", ctx.name());
        for c in ctx.commands().iter().skip(1) {
            line.push(' ');
            line.push_str(c.get_name());
        }
        if !ctx.command().get_children().is_empty() {
            line.push_str(" <command>");
        }
        line.push_str(" [<args>] [<options>]");
        w.write(&line)
    }
}

impl HelpRenderer for DefaultHelp {
    fn render(&self, ctx: &Context<'_>, out: &mut dyn Write) -> io::Result<()> {
        let app = ctx.app();
        let target = ctx.command();
        let mut w = HelpWriter::new(out);

        w.write(target.get_header())?;
        w.divide();
        let fallback = format!("{}_l", target.get_name());
        w.write(app.translate(target.get_long_about(), &fallback).trim_matches('\n'))?;

        self.write_commands(&mut w, app, target)?;

        let own: Vec<&Flag> = target.get_flags().iter().collect();
        self.write_flags(&mut w, app, "Available options:", &own)?;
        self.write_flags(&mut w, app, "Inherited options:", &inherited_flags(ctx.commands()))?;

        w.divide();
        self.write_usage(&mut w, ctx)?;
        w.divide();
        w.write(target.get_footer())?;
        w.flush()
    }
}

/// Ancestor flags that keep at least one name not redeclared further down
/// the chain.
fn inherited_flags<'a>(chain: &[&'a Command]) -> Vec<&'a Flag> {
    let mut out = Vec::new();
    let Some((_, ancestors)) = chain.split_last() else {
        return out;
    };

    for (depth, cmd) in ancestors.iter().enumerate() {
        let deeper = &chain[depth + 1..];
        for flag in cmd.get_flags() {
            let shadowed = flag.names().all(|name| {
                deeper
                    .iter()
                    .flat_map(|c| c.get_flags())
                    .any(|f| f.names().any(|n| n == name))
            });
            if !shadowed {
                out.push(flag);
            }
        }
    }
    out
}

/// `-I, --include <DIR>`
fn flag_left(flag: &Flag) -> String {
    let (short, long): (Vec<&str>, Vec<&str>) = flag.names().partition(|n| n.chars().count() == 1);
    let mut names: Vec<String> = short.iter().map(|n| format!("-{n}")).collect();
    names.extend(long.iter().map(|n| format!("--{n}")));

    let mut out = names.join(", ");
    if let Some(hint) = flag.get_hint() {
        out.push_str(&format!(" <{hint}>"));
    }
    out
}

fn flag_help(app: &App, flag: &Flag) -> String {
    let mut out = app.translate(flag.get_usage(), "").trim().to_string();
    let mut suffix = |text: String| {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&text);
    };

    if flag.is_required() {
        suffix("(required)".to_string());
    }
    if let Some(default_value) = flag.get_default() {
        suffix(format!("[default: {default_value}]"));
    }
    if let Some(var) = flag.get_env() {
        suffix(format!("[env: {var}]"));
    }
    out
}

/// Line-oriented writer that keeps sections separated by exactly one blank
/// line and skips empty content.
struct HelpWriter<'w> {
    out: &'w mut dyn Write,
    last: String,
    size: usize,
    pending_divide: bool,
}

impl<'w> HelpWriter<'w> {
    fn new(out: &'w mut dyn Write) -> Self {
        Self {
            out,
            last: String::new(),
            size: 0,
            pending_divide: false,
        }
    }

    /// Write `content`, adding a trailing newline when missing.
    fn write(&mut self, content: &str) -> io::Result<()> {
        if content.is_empty() {
            return Ok(());
        }
        if std::mem::take(&mut self.pending_divide)
            && self.size > 0
            && !self.last.ends_with("\n\n")
        {
            self.emit("\n")?;
        }
        if content.ends_with('\n') {
            self.emit(content)
        } else {
            self.emit(&format!("{content}\n"))
        }
    }

    /// Write `content` after `prefix`; continuation lines are aligned under
    /// the first.
    fn write_indent(&mut self, prefix: &str, content: &str) -> io::Result<()> {
        if content.is_empty() {
            return self.write(prefix.trim_end());
        }

        let pad = " ".repeat(prefix.chars().count());
        for (i, line) in content.lines().enumerate() {
            let lead = if i == 0 { prefix } else { pad.as_str() };
            self.write(&format!("{lead}{line}"))?;
        }
        Ok(())
    }

    /// Request a blank line before the next non-empty write.
    fn divide(&mut self) {
        self.pending_divide = true;
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn emit(&mut self, content: &str) -> io::Result<()> {
        self.out.write_all(content.as_bytes())?;
        self.size += content.len();
        if content.len() > 2 {
            self.last = content.to_string();
        } else {
            self.last.push_str(content);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::app::{App, ParseOutcome};
    use crate::command::Command;
    use crate::flag::Flag;
    use crate::i18n::Translations;

    fn app() -> App {
        App::new("kubectl")
            .header("kubectl controls the cluster.\n")
            .footer("Use \"kubectl <command> --help\" for more information.\n")
            .group("Beginner", "Basic Commands (Beginner):")
            .languages([("get_s", "Display resources")].into_iter().collect::<Translations>())
            .flag(
                Flag::new("namespace,n")
                    .hint("NS")
                    .usage("Namespace scope")
                    .default_value("default"),
            )
            .flag(Flag::new("verbose").short("v").switch().usage("Noisy logging"))
            .command(
                Command::new("create")
                    .group("Beginner")
                    .about("Create a resource")
                    .long_about("Create a resource from a file or from stdin.")
                    .flag(Flag::new("filename,f").required().usage("Files to use"))
                    .flag(Flag::new("namespace").usage("Overrides the global namespace"))
                    .subcommand(Command::new("namespace").about("Create a namespace")),
            )
            .command(Command::new("get").group("Beginner").about("$get_s"))
            .command(Command::new("version").about("Print the client version"))
    }

    fn render(app: &App, args: &[&str]) -> String {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let ParseOutcome::Help(ctx) = app.parse(&args, &[]).unwrap() else {
            panic!("expected help mode");
        };
        let mut out = Vec::new();
        app.help_renderer().render(&ctx, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn root_help_layout() {
        let app = app();
        let text = render(&app, &["kubectl"]);
        let expected = "\
kubectl controls the cluster.

Basic Commands (Beginner):
  create   Create a resource
  get      Display resources

Available commands:
  version  Print the client version

Available options:
  -n, --namespace <NS>  Namespace scope [default: default]
  -v, --verbose         Noisy logging

Usage: kubectl <command> [<args>] [<options>]

Use \"kubectl <command> --help\" for more information.
";
        assert_eq!(text, expected);
    }

    #[test]
    fn subcommand_help_lists_inherited_options() {
        let app = app();
        let text = render(&app, &["/usr/bin/kubectl", "help", "create"]);

        assert!(text.starts_with("Create a resource from a file or from stdin.\n"));
        assert!(text.contains("Available commands:\n  namespace  Create a namespace\n"));
        assert!(text.contains("  -f, --filename  Files to use (required)\n"));
        assert!(text.contains("Inherited options:\n  -n, --namespace <NS>"));
        assert!(text.contains("  -v, --verbose "));
        assert!(text.ends_with("Usage: kubectl create <command> [<args>] [<options>]\n"));
        assert!(!text.contains("kubectl controls the cluster."));
    }

    #[test]
    fn multi_line_usage_is_aligned() {
        let app = App::new("tool").flag(Flag::new("mode").usage("first line\nsecond line"));
        let text = render(&app, &["tool", "--help"]);
        assert!(text.contains("  --mode  first line\n          second line\n"));
    }
}
