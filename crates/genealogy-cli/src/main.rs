//! `genealogy` command-line tool

mod render;

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use genealogy_core::{GenealogyConfig, GenealogyEngine, JobInfo, RepairOptions};
use genealogy_store::FsStore;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("genealogy")
        .version(genealogy_core::VERSION)
        .about("Track, report and repair résumé variant genealogy")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("workspace")
                .long("workspace")
                .short('w')
                .env("GENEALOGY_WORKSPACE")
                .default_value(".")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("Workspace holding the variants and templates directories"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .global(true)
                .help("Configuration file (default: <workspace>/genealogy.toml if present)"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .value_parser(["text", "json"])
                .default_value("text")
                .global(true)
                .help("Log output format on stderr"),
        )
        .subcommand(
            Command::new("analyze")
                .about("Summarise variants, issues and cycles")
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("tree")
                .about("Print the genealogy forest")
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("generations")
                .about("List variants by computed generation")
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("fix")
                .about("Rewrite stale or conflicting lineage metadata")
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .action(ArgAction::SetTrue)
                        .help("Report what would change without writing"),
                )
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("lineage")
                .about("Show the chain from a root template to a variant")
                .arg(Arg::new("name").required(true))
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("hybrids")
                .about("List variants with two or more parents")
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("descendants")
                .about("Variants orphaned if a document were deleted")
                .arg(Arg::new("name").required(true))
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("add-parent")
                .about("Declare parents on an existing variant")
                .arg(Arg::new("variant").required(true))
                .arg(Arg::new("parents").required(true).num_args(1..))
                .arg(Arg::new("job-title").long("job-title"))
                .arg(Arg::new("job-company").long("job-company")),
        )
        .subcommand(
            Command::new("create-hybrid")
                .about("Author a new hybrid from two or more parents")
                .arg(Arg::new("parents").required(true).num_args(2..))
                .arg(
                    Arg::new("name")
                        .long("name")
                        .required(true)
                        .help("Filename of the new variant"),
                )
                .arg(
                    Arg::new("features")
                        .long("features")
                        .help("What the hybrid combines"),
                ),
        )
}

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON")
}

fn init_logging(format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("genealogy=info,genealogy_core=info,genealogy_store=warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if format == "json" {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn load_config(workspace: &Path, explicit: Option<&PathBuf>) -> Result<GenealogyConfig> {
    match explicit {
        Some(path) => GenealogyConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => GenealogyConfig::discover(workspace)
            .with_context(|| format!("loading config from {}", workspace.display())),
    }
}

fn engine(matches: &ArgMatches) -> Result<GenealogyEngine<FsStore>> {
    let workspace = matches
        .get_one::<PathBuf>("workspace")
        .context("workspace argument missing")?;
    if !workspace.is_dir() {
        bail!("workspace {} is not a directory", workspace.display());
    }
    let config = load_config(workspace, matches.get_one::<PathBuf>("config"))?;
    let store = config.fs_store(workspace);
    tracing::debug!("workspace {}", workspace.display());
    Ok(GenealogyEngine::new(store, config))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<()> {
    let Some((command, args)) = matches.subcommand() else {
        bail!("no command given");
    };
    let engine = engine(args)?;
    let json = args.try_get_one::<bool>("json").ok().flatten().copied().unwrap_or(false);

    match command {
        "analyze" => {
            let analysis = engine.analyze()?;
            if json {
                print_json(&analysis.to_report())?;
            } else {
                print!("{}", render::summary(&analysis));
            }
        }
        "tree" => {
            let tree = engine.tree()?;
            if json {
                print_json(&tree)?;
            } else {
                print!("{}", render::tree(&tree));
            }
        }
        "generations" => {
            let analysis = engine.analyze()?;
            if json {
                print_json(&analysis.by_generation())?;
            } else {
                print!("{}", render::generations(&analysis));
            }
        }
        "fix" => {
            let dry_run = args.get_flag("dry-run");
            let options = if dry_run {
                RepairOptions::dry_run()
            } else {
                RepairOptions::new()
            };
            let report = engine.repair(options)?;
            if json {
                print_json(&report)?;
            } else {
                print!("{}", render::repair(&report, dry_run));
            }
        }
        "lineage" => {
            let name = required(args, "name")?;
            let steps = engine.lineage(name)?;
            if json {
                print_json(&steps)?;
            } else {
                print!("{}", render::lineage(&steps));
            }
        }
        "hybrids" => {
            let nodes = engine.hybrids()?;
            if json {
                print_json(&nodes)?;
            } else {
                print!("{}", render::hybrids(&nodes));
            }
        }
        "descendants" => {
            let name = required(args, "name")?;
            let names = engine.descendants(name)?;
            if json {
                print_json(&names)?;
            } else {
                print!("{}", render::descendants(name, &names));
            }
        }
        "add-parent" => {
            let variant = required(args, "variant")?;
            let parents: Vec<String> = args
                .get_many::<String>("parents")
                .into_iter()
                .flatten()
                .cloned()
                .collect();
            let mut job = JobInfo::new();
            if let Some(title) = args.get_one::<String>("job-title") {
                job = job.with_title(title);
            }
            if let Some(company) = args.get_one::<String>("job-company") {
                job = job.with_company(company);
            }
            let block = engine
                .stamp_parents(variant, &parents, &job)
                .with_context(|| format!("stamping {variant}"))?;
            println!(
                "{variant}: {} (Gen {})",
                block.parents.as_slice().join(", "),
                block.generation
            );
        }
        "create-hybrid" => {
            let parents: Vec<String> = args
                .get_many::<String>("parents")
                .into_iter()
                .flatten()
                .cloned()
                .collect();
            let target = required(args, "name")?;
            let features = args.get_one::<String>("features").map(String::as_str);
            let block = engine
                .create_hybrid(&parents, target, features)
                .with_context(|| format!("creating {target}"))?;
            println!("Created {target} (Gen {}) from {}", block.generation, parents.join(", "));
        }
        other => bail!("unknown command: {other}"),
    }
    Ok(())
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("missing argument <{name}>"))
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    let format = matches
        .get_one::<String>("log-format")
        .map_or("text", String::as_str);
    init_logging(format);

    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
