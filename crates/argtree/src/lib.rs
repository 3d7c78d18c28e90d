//! Git-style command trees and cross-platform option parsing.
//!
//! An [`App`] owns a tree of [`Command`]s. A command line is resolved in two
//! passes: bare words walk the tree (`app create namespace`), then the
//! remaining tokens are matched against the flags of every command on the
//! resolved path. Options may be written as `/k`, `-k` or `--k`, with inline
//! values separated by `=`, `:` or `/`.
//!
//! Handlers run root to leaf through [`Context::next`], so a handler on an
//! outer command can act as middleware for everything below it.
//!
//! ```rust,ignore
//! let app = App::new("kubectl")
//!     .flag(Flag::new("namespace,n").default_value("default"))
//!     .command(Command::new("get").action(|ctx| {
//!         println!("{:?} in {:?}", ctx.args(), ctx.flag_str("namespace"));
//!         Ok(())
//!     }));
//! std::process::exit(if app.execute() == ExitCode::SUCCESS { 0 } else { 1 });
//! ```

mod app;
mod bind;
mod coerce;
mod command;
mod context;
mod error;
mod flag;
mod help;
mod i18n;
mod option;
mod parser;
mod resolve;

pub use app::{App, ParseOutcome};
pub use bind::{Bind, BindValue, Binder};
pub use coerce::{FromArg, coerce, kebab_case, parse_bool};
pub use command::{Action, Command};
pub use context::Context;
pub use error::{Error, Result};
pub use flag::{Flag, FlagState, ValueSource};
pub use help::{DefaultHelp, HelpRenderer};
pub use i18n::Translations;
pub use option::{OptionStyle, OptionToken, parse_option};
