//! Command-path resolution: the first pass over argv.

use crate::command::Command;

/// Bare token that switches on help mode at the top level.
pub(crate) const HELP_COMMAND: &str = "help";

/// End-of-options marker.
pub(crate) const SEPARATOR: &str = "--";

#[derive(Debug)]
pub(crate) struct Resolution<'a> {
    /// Root first, deepest match last.
    pub chain: Vec<&'a Command>,
    /// Tokens left for option parsing, in their original order.
    pub deferred: Vec<&'a str>,
    /// `help` was given as the top-level command.
    pub help: bool,
}

/// Whether `token` starts like an option (`-x`, `--x`, `/x`).
pub(crate) fn is_option_style(token: &str) -> bool {
    token.starts_with('-') || token.starts_with('/')
}

/// Walk `args` (argv without the program name) down the tree below `root`.
///
/// Option-style tokens are deferred without being looked at. The first bare
/// token that does not name a child of the current command stops the walk;
/// it and everything after it are deferred verbatim. There is no backtracking.
pub(crate) fn resolve<'a>(root: &'a Command, args: &'a [String]) -> Resolution<'a> {
    let mut chain = vec![root];
    let mut deferred: Vec<&'a str> = Vec::with_capacity(args.len());
    let mut help = false;
    let mut current = root;

    for (idx, token) in args.iter().enumerate() {
        let token = token.as_str();

        if token == SEPARATOR {
            deferred.extend(args[idx..].iter().map(String::as_str));
            break;
        }

        if is_option_style(token) {
            deferred.push(token);
            continue;
        }

        if let Some(child) = current.find_child(token) {
            chain.push(child);
            current = child;
            continue;
        }

        // `app help create` renders help for `create`, unless the app
        // declares its own `help` command.
        if token == HELP_COMMAND && !help && chain.len() == 1 {
            help = true;
            continue;
        }

        deferred.extend(args[idx..].iter().map(String::as_str));
        break;
    }

    Resolution {
        chain,
        deferred,
        help,
    }
}
