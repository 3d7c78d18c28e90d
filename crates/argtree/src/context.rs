use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use crate::app::App;
use crate::bind::{Bind, Binder};
use crate::coerce::{FromArg, coerce};
use crate::command::Command;
use crate::error::{Error, Result};
use crate::flag::FlagState;
use crate::parser::EffectiveFlags;

/// Cursor value meaning "aborted"; always past the end of any chain.
const ABORT_INDEX: isize = isize::MAX / 2;

/// Everything a handler can see about one invocation: the resolved command
/// chain, flag values, positional parameters and a side-channel for passing
/// data between handlers.
pub struct Context<'a> {
    app: &'a App,
    name: String,
    commands: Vec<&'a Command>,
    flags: EffectiveFlags<'a>,
    params: Vec<&'a str>,
    data: HashMap<String, Box<dyn Any>>,
    index: isize,
}

impl fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain: Vec<&str> = self.commands.iter().map(|c| c.get_name()).collect();
        let data: Vec<&str> = self.data.keys().map(String::as_str).collect();
        f.debug_struct("Context")
            .field("name", &self.name)
            .field("commands", &chain)
            .field("flags", &self.flags)
            .field("params", &self.params)
            .field("data", &data)
            .field("index", &self.index)
            .finish()
    }
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        app: &'a App,
        name: String,
        commands: Vec<&'a Command>,
        flags: EffectiveFlags<'a>,
        params: Vec<&'a str>,
    ) -> Self {
        Self {
            app,
            name,
            commands,
            flags,
            params,
            data: HashMap::new(),
            index: -1,
        }
    }

    pub fn app(&self) -> &'a App {
        self.app
    }

    /// Program name shown in usage lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved chain, root first.
    pub fn commands(&self) -> &[&'a Command] {
        &self.commands
    }

    /// The deepest resolved command.
    pub fn command(&self) -> &'a Command {
        self.commands
            .last()
            .copied()
            .unwrap_or_else(|| self.app.root())
    }

    // Positional parameters

    pub fn narg(&self) -> usize {
        self.params.len()
    }

    pub fn args(&self) -> &[&'a str] {
        &self.params
    }

    pub fn arg(&self, index: usize) -> Option<&'a str> {
        self.params.get(index).copied()
    }

    pub fn arg_as<T: FromArg>(&self, index: usize) -> Result<T> {
        let raw = self.arg(index).ok_or(Error::MissingArgument(index))?;
        coerce(&format!("argument {index}"), raw)
    }

    pub fn arg_bool(&self, index: usize) -> Result<bool> {
        self.arg_as(index)
    }

    pub fn arg_int(&self, index: usize) -> Result<i64> {
        self.arg_as(index)
    }

    pub fn arg_uint(&self, index: usize) -> Result<u64> {
        self.arg_as(index)
    }

    pub fn arg_f32(&self, index: usize) -> Result<f32> {
        self.arg_as(index)
    }

    pub fn arg_f64(&self, index: usize) -> Result<f64> {
        self.arg_as(index)
    }

    // Flags

    /// Number of distinct flags that occurred on the command line.
    pub fn nflag(&self) -> usize {
        self.flags.reachable().filter(|f| f.is_used()).count()
    }

    /// Look a flag up by any of its names.
    pub fn flag(&self, key: &str) -> Option<&FlagState<'a>> {
        self.flags.get(key)
    }

    /// Every flag in scope for this invocation.
    pub fn flags(&self) -> impl Iterator<Item = &FlagState<'a>> {
        self.flags.reachable()
    }

    /// First value of a flag (command line, env or default).
    pub fn flag_str(&self, key: &str) -> Option<&str> {
        self.flag(key).and_then(FlagState::get)
    }

    pub fn flag_as<T: FromArg>(&self, key: &str) -> Result<T> {
        let raw = self
            .flag_str(key)
            .ok_or_else(|| Error::MissingValue(key.to_string()))?;
        coerce(key, raw)
    }

    /// A flag given without a value reads as `true`; an absent flag without
    /// a default reads as `false`.
    pub fn flag_bool(&self, key: &str) -> Result<bool> {
        match self.flag(key) {
            Some(state) => match state.get() {
                Some(raw) => coerce(key, raw),
                None => Ok(state.is_used()),
            },
            None => Ok(false),
        }
    }

    pub fn flag_int(&self, key: &str) -> Result<i64> {
        self.flag_as(key)
    }

    pub fn flag_uint(&self, key: &str) -> Result<u64> {
        self.flag_as(key)
    }

    pub fn flag_f32(&self, key: &str) -> Result<f32> {
        self.flag_as(key)
    }

    pub fn flag_f64(&self, key: &str) -> Result<f64> {
        self.flag_as(key)
    }

    pub fn flag_list(&self, key: &str) -> &[String] {
        self.flag(key).map(FlagState::list).unwrap_or(&[])
    }

    /// Populate `target` from the flags of this invocation.
    pub fn bind<B: Bind + ?Sized>(&self, target: &mut B) -> Result<()> {
        let mut binder = Binder::new(self);
        target.bind(&mut binder)
    }

    // Side-channel

    pub fn set<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.data.insert(key.into(), Box::new(value));
    }

    /// `None` when the key is missing or holds another type.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.data.get(key).and_then(|v| v.downcast_ref())
    }

    pub fn get_mut<T: Any>(&mut self, key: &str) -> Option<&mut T> {
        self.data.get_mut(key).and_then(|v| v.downcast_mut())
    }

    /// Take a value out; a value of another type is left in place.
    pub fn remove<T: Any>(&mut self, key: &str) -> Option<T> {
        if !self.data.get(key)?.is::<T>() {
            return None;
        }
        self.data
            .remove(key)
            .and_then(|v| v.downcast().ok())
            .map(|v| *v)
    }

    // Flow control

    /// Run the pending handlers of the chain.
    ///
    /// Handlers may call `next` themselves to run the rest of the chain
    /// before continuing (middleware style); entries are never run twice.
    /// A handler error stops the chain and is returned.
    pub fn next(&mut self) -> Result<()> {
        self.index += 1;
        while let Some(command) = self.current() {
            if let Some(action) = command.get_action() {
                action(self)?;
            }
            self.index += 1;
        }
        Ok(())
    }

    /// Stop the chain; no further handler runs.
    pub fn abort(&mut self) {
        self.index = ABORT_INDEX;
    }

    pub fn is_aborted(&self) -> bool {
        self.index >= ABORT_INDEX
    }

    fn current(&self) -> Option<&'a Command> {
        usize::try_from(self.index)
            .ok()
            .and_then(|i| self.commands.get(i).copied())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::app::{App, ParseOutcome};
    use crate::command::Command;
    use crate::error::Error;
    use crate::flag::Flag;

    type Log = Rc<RefCell<Vec<String>>>;

    fn argv(items: &[&str]) -> Vec<String> {
        std::iter::once("prog")
            .chain(items.iter().copied())
            .map(str::to_string)
            .collect()
    }

    fn record(log: &Log, entry: &str) {
        log.borrow_mut().push(entry.to_string());
    }

    fn dispatch(app: &App, args: &[&str]) -> (crate::error::Result<()>, bool) {
        let args = argv(args);
        let ParseOutcome::Run(mut ctx) = app.parse(&args, &[]).unwrap() else {
            panic!("expected Run");
        };
        let result = ctx.next();
        (result, ctx.is_aborted())
    }

    #[test]
    fn abort_in_second_handler_skips_third() {
        let log: Log = Rc::default();
        let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
        let app = App::new("prog")
            .action(move |_| {
                record(&l1, "root");
                Ok(())
            })
            .command(
                Command::new("create")
                    .action(move |ctx| {
                        record(&l2, "create");
                        ctx.abort();
                        Ok(())
                    })
                    .subcommand(Command::new("ns").action(move |_| {
                        record(&l3, "ns");
                        Ok(())
                    })),
            );

        let (result, aborted) = dispatch(&app, &["create", "ns"]);
        result.unwrap();
        assert!(aborted);
        assert_eq!(*log.borrow(), ["root", "create"]);
    }

    #[test]
    fn nested_next_never_reruns_an_entry() {
        let log: Log = Rc::default();
        let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
        let app = App::new("prog")
            .action(move |ctx| {
                record(&l1, "root:before");
                ctx.next()?;
                record(&l1, "root:after");
                Ok(())
            })
            .command(
                Command::new("remote")
                    .action(move |_| {
                        record(&l2, "remote");
                        Ok(())
                    })
                    .subcommand(Command::new("add"))
                    .subcommand(Command::new("show").action(move |_| {
                        record(&l3, "show");
                        Ok(())
                    })),
            );

        let (result, aborted) = dispatch(&app, &["remote", "add", "origin"]);
        result.unwrap();
        assert!(!aborted);
        assert_eq!(*log.borrow(), ["root:before", "remote", "root:after"]);

        log.borrow_mut().clear();
        let (result, _) = dispatch(&app, &["remote", "show"]);
        result.unwrap();
        assert_eq!(
            *log.borrow(),
            ["root:before", "remote", "show", "root:after"]
        );
    }

    #[test]
    fn handler_error_stops_the_chain() {
        let log: Log = Rc::default();
        let l1 = log.clone();
        let app = App::new("prog").command(
            Command::new("fail")
                .action(|_| Err("boom".into()))
                .subcommand(Command::new("after").action(move |_| {
                    record(&l1, "after");
                    Ok(())
                })),
        );

        let (result, _) = dispatch(&app, &["fail", "after"]);
        assert!(matches!(result, Err(Error::Failed(msg)) if msg == "boom"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn side_channel_passes_data_down_the_chain() {
        let seen: Rc<RefCell<Option<String>>> = Rc::default();
        let out = seen.clone();
        let app = App::new("prog")
            .action(|ctx| {
                ctx.set("user", "alice".to_string());
                ctx.set("attempts", 3u32);
                Ok(())
            })
            .command(Command::new("whoami").action(move |ctx| {
                assert!(ctx.get::<u64>("attempts").is_none());
                assert!(ctx.remove::<i32>("attempts").is_none());
                *ctx.get_mut::<u32>("attempts").unwrap() += 1;
                assert_eq!(ctx.remove::<u32>("attempts"), Some(4));
                *out.borrow_mut() = ctx.get::<String>("user").cloned();
                Ok(())
            }));

        let (result, _) = dispatch(&app, &["whoami"]);
        result.unwrap();
        assert_eq!(seen.borrow().as_deref(), Some("alice"));
    }

    #[test]
    fn typed_accessors() {
        let app = App::new("prog")
            .action(|_| Ok(()))
            .flag(Flag::new("ratio").default_value("0.5"))
            .flag(Flag::new("dry-run").switch())
            .flag(Flag::new("force").switch())
            .flag(Flag::new("count"))
            .flag(Flag::new("tag,t").multiple());
        let args = argv(&["42", "true", "-1", "--dry-run", "-t", "a", "-t", "b", "--count=x"]);
        let ParseOutcome::Run(ctx) = app.parse(&args, &[]).unwrap() else {
            panic!("expected Run");
        };

        assert_eq!(ctx.narg(), 3);
        assert_eq!(ctx.arg_uint(0).unwrap(), 42);
        assert!(ctx.arg_bool(1).unwrap());
        assert!((ctx.arg_f32(0).unwrap() - 42.0).abs() < f32::EPSILON);
        assert!(matches!(ctx.arg_int(3), Err(Error::MissingArgument(3))));
        assert!(matches!(ctx.arg_uint(2), Err(Error::InvalidValue { .. })));

        assert!((ctx.flag_f64("ratio").unwrap() - 0.5).abs() < f64::EPSILON);
        assert!(ctx.flag_bool("dry-run").unwrap());
        assert!(!ctx.flag_bool("force").unwrap());
        assert!(!ctx.flag_bool("missing").unwrap());
        assert_eq!(ctx.flag_list("t"), ["a", "b"]);
        assert!(ctx.flag_list("missing").is_empty());
        assert!(matches!(ctx.flag_int("count"), Err(Error::InvalidValue { .. })));
        assert!(matches!(ctx.flag_uint("force"), Err(Error::MissingValue(_))));
        assert_eq!(ctx.nflag(), 3);
    }
}
