use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use argtree::{App, Bind, Binder, Command, Context, Flag, Translations, bind_fields};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

const HELP_TEXT: &str = include_str!("../assets/help.en.json");

fn main() -> Result<ExitCode> {
    init_tracing();
    let app = app()?;
    Ok(app.execute())
}

fn app() -> Result<App> {
    let languages =
        Translations::from_json_str(HELP_TEXT).context("failed to load help translations")?;

    Ok(App::new("")
        .version(env!("CARGO_PKG_VERSION"))
        .languages(languages)
        .header("argtree-demo controls a pretend Kubernetes cluster.\n")
        .footer("Use \"argtree-demo <command> --help\" for more information about a command.\n")
        .group("Beginner", "Basic Commands (Beginner):")
        .group("Intermediate", "Basic Commands (Intermediate):")
        .flag(
            Flag::new("namespace,n")
                .hint("NAME")
                .usage("Namespace scope for this request")
                .env("KUBECTL_NAMESPACE")
                .default_value("default"),
        )
        .flag(
            Flag::new("verbose")
                .short("v")
                .switch()
                .usage("Print request details"),
        )
        .action(root)
        .command(
            Command::new("create")
                .group("Beginner")
                .about("$create_s")
                .flag(
                    Flag::new("filename,f")
                        .multiple()
                        .hint("FILE")
                        .usage("Files that contain the configuration to apply"),
                )
                .flag(
                    Flag::new("dry-run")
                        .switch()
                        .usage("Only print the object that would be sent"),
                )
                .action(create)
                .subcommand(
                    Command::new("namespace")
                        .alias("ns")
                        .about("Create a namespace with the specified name")
                        .action(create_namespace),
                )
                .subcommand(
                    Command::new("configmap")
                        .alias("cm")
                        .about("Create a config map from literal values")
                        .flag(
                            Flag::new("from-literal")
                                .multiple()
                                .required()
                                .hint("KEY=VALUE")
                                .usage("Key and literal value to insert"),
                        )
                        .action(create_configmap),
                ),
        )
        .command(
            Command::new("get")
                .group("Intermediate")
                .flag(
                    Flag::new("output,o")
                        .hint("FORMAT")
                        .default_value("table")
                        .usage("Output format: table, wide, json or yaml"),
                )
                .flag(
                    Flag::new("selector,l")
                        .hint("QUERY")
                        .usage("Label selector to filter on"),
                )
                .flag(
                    Flag::new("all-namespaces,A")
                        .switch()
                        .usage("List across all namespaces"),
                )
                .action(get),
        )
        .command(
            Command::new("delete")
                .group("Intermediate")
                .about("$delete_s")
                .flag(Flag::new("yes,y").switch().usage("Confirm the deletion"))
                .action(confirm_delete)
                .subcommand(
                    Command::new("pod")
                        .alias("po")
                        .about("Delete a pod by name")
                        .action(delete_pod),
                ),
        )
        .command(Command::new("version").about("$version_s").action(version)))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();
}

/// Runs before every command handler.
fn root(ctx: &mut Context<'_>) -> argtree::Result<()> {
    if ctx.commands().len() == 1 {
        if let Some(word) = ctx.arg(0) {
            return Err(format!("unknown command '{word}'").into());
        }
        // Flags only, like `argtree-demo -v`.
        let mut stdout = io::stdout().lock();
        return Ok(ctx.app().help_renderer().render(ctx, &mut stdout)?);
    }

    let verbose = ctx.flag_bool("verbose")?;
    ctx.set("verbose", verbose);
    debug!(
        command = ctx.command().get_name(),
        namespace = ?ctx.flag_str("namespace"),
        "dispatching"
    );
    Ok(())
}

#[derive(Debug, Default)]
struct CreateFlags {
    filename: Vec<PathBuf>,
    dry_run: bool,
}

impl Bind for CreateFlags {
    fn bind(&mut self, b: &mut Binder<'_, '_>) -> argtree::Result<()> {
        bind_fields!(b, self, filename, dry_run);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct ConfigMapFlags {
    from_literal: BTreeMap<String, String>,
}

impl Bind for ConfigMapFlags {
    fn bind(&mut self, b: &mut Binder<'_, '_>) -> argtree::Result<()> {
        bind_fields!(b, self, from_literal);
        Ok(())
    }
}

fn dry_run_suffix(dry_run: bool) -> &'static str {
    if dry_run { " (dry run)" } else { "" }
}

fn create(ctx: &mut Context<'_>) -> argtree::Result<()> {
    let mut flags = CreateFlags::default();
    ctx.bind(&mut flags)?;

    // `create` alone works from files; subcommands build the object from flags.
    if ctx.commands().len() == 2 {
        if flags.filename.is_empty() {
            return Err("must specify one of -f or a resource type".into());
        }
        for file in &flags.filename {
            println!("created from {}{}", file.display(), dry_run_suffix(flags.dry_run));
        }
    }

    ctx.set("create", flags);
    Ok(())
}

fn dry_run(ctx: &Context<'_>) -> bool {
    ctx.get::<CreateFlags>("create").is_some_and(|f| f.dry_run)
}

fn create_namespace(ctx: &mut Context<'_>) -> argtree::Result<()> {
    let name = ctx
        .arg(0)
        .ok_or_else(|| "namespace name is required".to_string())?;
    println!("namespace/{name} created{}", dry_run_suffix(dry_run(ctx)));
    Ok(())
}

fn create_configmap(ctx: &mut Context<'_>) -> argtree::Result<()> {
    let name = ctx
        .arg(0)
        .ok_or_else(|| "config map name is required".to_string())?;
    let mut flags = ConfigMapFlags::default();
    ctx.bind(&mut flags)?;

    println!("configmap/{name} created{}", dry_run_suffix(dry_run(ctx)));
    for (key, value) in &flags.from_literal {
        println!("  {key}={value}");
    }
    Ok(())
}

fn get(ctx: &mut Context<'_>) -> argtree::Result<()> {
    let resource = ctx
        .arg(0)
        .ok_or_else(|| "you must specify the type of resource to get".to_string())?;
    let namespace = if ctx.flag_bool("all-namespaces")? {
        "*"
    } else {
        ctx.flag_str("namespace").unwrap_or("default")
    };
    let output = ctx.flag_str("output").unwrap_or("table");

    if ctx.get::<bool>("verbose").copied().unwrap_or(false) {
        println!("GET /api/v1/namespaces/{namespace}/{resource}");
    }
    println!("resource: {resource}");
    println!("namespace: {namespace}");
    println!("output: {output}");
    if let Some(selector) = ctx.flag_str("selector") {
        println!("selector: {selector}");
    }
    for extra in ctx.args().iter().skip(1) {
        println!("ignored: {extra}");
    }
    Ok(())
}

/// Guards every `delete` subcommand.
fn confirm_delete(ctx: &mut Context<'_>) -> argtree::Result<()> {
    if !ctx.flag_bool("yes")? {
        eprintln!("refusing to delete without --yes");
        ctx.abort();
    }
    Ok(())
}

fn delete_pod(ctx: &mut Context<'_>) -> argtree::Result<()> {
    let name = ctx.arg(0).ok_or_else(|| "pod name is required".to_string())?;
    println!("pod/{name} deleted");
    Ok(())
}

fn version(_: &mut Context<'_>) -> argtree::Result<()> {
    println!("Client Version: v{}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
