//! Populating plain structs from parsed flags.
//!
//! A target type implements [`Bind`] and registers each field with the
//! [`Binder`], either with an explicit flag name or through [`bind_fields!`],
//! which derives the kebab-case name from the field identifier:
//!
//! ```rust,ignore
//! struct CreateFlags {
//!     dry_run: bool,
//!     filename: Vec<PathBuf>,
//!     labels: HashMap<String, String>,
//! }
//!
//! impl Bind for CreateFlags {
//!     fn bind(&mut self, b: &mut Binder<'_, '_>) -> argtree::Result<()> {
//!         bind_fields!(b, self, dry_run, labels);
//!         b.field("filename", &mut self.filename)
//!     }
//! }
//! ```
//!
//! Fields whose flag is missing, or was neither given nor defaulted, keep
//! their current value.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::path::PathBuf;

use crate::coerce::{FromArg, parse_bool};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::flag::FlagState;

/// A struct that can be filled from an invocation's flags.
pub trait Bind {
    fn bind(&mut self, binder: &mut Binder<'_, '_>) -> Result<()>;
}

/// Reads flag values for [`Bind`] implementations.
#[derive(Debug)]
pub struct Binder<'c, 'a> {
    ctx: &'c Context<'a>,
}

impl<'c, 'a> Binder<'c, 'a> {
    pub(crate) fn new(ctx: &'c Context<'a>) -> Self {
        Self { ctx }
    }

    /// Fill `slot` from the flag named `name`.
    pub fn field<T: BindValue + ?Sized>(&mut self, name: &str, slot: &mut T) -> Result<()> {
        let Some(state) = self.ctx.flag(name) else {
            return Ok(());
        };
        if state.is_empty() && !state.is_used() {
            return Ok(());
        }
        slot.bind_from(name, state)
    }
}

/// A field type [`Binder`] knows how to fill.
pub trait BindValue {
    fn bind_from(&mut self, field: &str, state: &FlagState<'_>) -> Result<()>;
}

fn convert<T: FromArg>(field: &str, raw: &str) -> Result<T> {
    T::from_arg(raw).map_err(|reason| Error::Bind {
        field: field.to_string(),
        reason: format!("'{raw}': {reason}"),
    })
}

macro_rules! bind_scalar {
    ($($ty:ty),* $(,)?) => {
        $(
            impl BindValue for $ty {
                fn bind_from(&mut self, field: &str, state: &FlagState<'_>) -> Result<()> {
                    if let Some(raw) = state.get() {
                        *self = convert(field, raw)?;
                    }
                    Ok(())
                }
            }
        )*
    };
}

bind_scalar!(
    String, PathBuf, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32,
    f64,
);

/// A switch given without a value binds as `true`.
impl BindValue for bool {
    fn bind_from(&mut self, field: &str, state: &FlagState<'_>) -> Result<()> {
        *self = match state.get() {
            Some(raw) => parse_bool(raw).ok_or_else(|| Error::Bind {
                field: field.to_string(),
                reason: format!("'{raw}' is not a boolean"),
            })?,
            None => state.is_used(),
        };
        Ok(())
    }
}

impl<T: FromArg> BindValue for Option<T> {
    fn bind_from(&mut self, field: &str, state: &FlagState<'_>) -> Result<()> {
        if let Some(raw) = state.get() {
            *self = Some(convert(field, raw)?);
        }
        Ok(())
    }
}

impl<T: FromArg> BindValue for Vec<T> {
    fn bind_from(&mut self, field: &str, state: &FlagState<'_>) -> Result<()> {
        *self = state
            .list()
            .iter()
            .map(|raw| convert(field, raw))
            .collect::<Result<_>>()?;
        Ok(())
    }
}

impl<K, V> BindValue for HashMap<K, V>
where
    K: FromArg + Eq + Hash,
    V: FromArg,
{
    fn bind_from(&mut self, field: &str, state: &FlagState<'_>) -> Result<()> {
        *self = pairs(field, state)?;
        Ok(())
    }
}

impl<K, V> BindValue for BTreeMap<K, V>
where
    K: FromArg + Ord,
    V: FromArg,
{
    fn bind_from(&mut self, field: &str, state: &FlagState<'_>) -> Result<()> {
        *self = pairs(field, state)?;
        Ok(())
    }
}

/// Every value must be `key=value` or `key:value`.
fn pairs<K, V, C>(field: &str, state: &FlagState<'_>) -> Result<C>
where
    K: FromArg,
    V: FromArg,
    C: FromIterator<(K, V)>,
{
    state
        .list()
        .iter()
        .map(|entry| {
            let (k, v) = entry.split_once(['=', ':']).ok_or_else(|| Error::Bind {
                field: field.to_string(),
                reason: format!("'{entry}' is not a KEY=VALUE or KEY:VALUE pair"),
            })?;
            Ok((convert(field, k)?, convert(field, v)?))
        })
        .collect()
}

/// Register struct fields with a [`Binder`] under kebab-case names derived
/// from their identifiers (`dry_run` binds `--dry-run`).
#[macro_export]
macro_rules! bind_fields {
    ($binder:expr, $target:expr, $($field:ident),+ $(,)?) => {
        $(
            $binder.field(&$crate::kebab_case(stringify!($field)), &mut $target.$field)?;
        )+
    };
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::path::PathBuf;

    use super::{Bind, Binder};
    use crate::app::{App, ParseOutcome};
    use crate::error::{Error, Result};
    use crate::flag::Flag;

    #[derive(Debug, Default)]
    struct CreateFlags {
        dry_run: bool,
        edit: bool,
        output: String,
        replicas: u32,
        filename: Vec<PathBuf>,
        labels: HashMap<String, String>,
        limits: BTreeMap<String, u64>,
        timeout: Option<f64>,
        selector: String,
    }

    impl Bind for CreateFlags {
        fn bind(&mut self, b: &mut Binder<'_, '_>) -> Result<()> {
            crate::bind_fields!(b, self, dry_run, edit, output, replicas, labels, limits, timeout);
            b.field("filename", &mut self.filename)?;
            b.field("l", &mut self.selector)
        }
    }

    fn app() -> App {
        App::new("prog")
            .action(|_| Ok(()))
            .flag(Flag::new("dry-run").switch())
            .flag(Flag::new("edit").switch())
            .flag(Flag::new("output,o").default_value("yaml"))
            .flag(Flag::new("replicas"))
            .flag(Flag::new("filename,f").multiple())
            .flag(Flag::new("labels").multiple())
            .flag(Flag::new("limits").multiple())
            .flag(Flag::new("timeout"))
            .flag(Flag::new("selector,l"))
    }

    fn bind(args: &[&str]) -> Result<CreateFlags> {
        let app = app();
        let args: Vec<String> = std::iter::once("prog")
            .chain(args.iter().copied())
            .map(str::to_string)
            .collect();
        let ParseOutcome::Run(ctx) = app.parse(&args, &[])? else {
            panic!("expected Run");
        };
        let mut flags = CreateFlags {
            selector: "keep".to_string(),
            ..Default::default()
        };
        ctx.bind(&mut flags)?;
        Ok(flags)
    }

    #[test]
    fn binds_scalars_sequences_and_maps() {
        let flags = bind(&[
            "--dry-run",
            "--replicas=3",
            "-f",
            "a.yaml",
            "-f",
            "b.yaml",
            "--labels",
            "app=web",
            "--labels=tier:front",
            "--limits",
            "cpu=2",
            "--timeout",
            "1.5",
        ])
        .unwrap();

        assert!(flags.dry_run);
        assert!(!flags.edit);
        assert_eq!(flags.output, "yaml");
        assert_eq!(flags.replicas, 3);
        assert_eq!(
            flags.filename,
            [PathBuf::from("a.yaml"), PathBuf::from("b.yaml")]
        );
        assert_eq!(flags.labels["app"], "web");
        assert_eq!(flags.labels["tier"], "front");
        assert_eq!(flags.limits["cpu"], 2);
        assert_eq!(flags.timeout, Some(1.5));
        assert_eq!(flags.selector, "keep");
    }

    #[test]
    fn explicit_name_wins_over_field_name() {
        let flags = bind(&["-l", "app=web"]).unwrap();
        assert_eq!(flags.selector, "app=web");
        assert!(flags.labels.is_empty());
    }

    #[test]
    fn conversion_failures_name_the_field() {
        let err = bind(&["--replicas", "many"]).unwrap_err();
        assert!(matches!(err, Error::Bind { ref field, .. } if field == "replicas"));

        let err = bind(&["--labels", "novalue"]).unwrap_err();
        match err {
            Error::Bind { field, reason } => {
                assert_eq!(field, "labels");
                assert!(reason.contains("KEY=VALUE"));
            }
            other => panic!("expected Bind, got: {other:?}"),
        }

        let err = bind(&["--limits", "cpu=lots"]).unwrap_err();
        assert!(matches!(err, Error::Bind { ref field, .. } if field == "limits"));
    }
}
