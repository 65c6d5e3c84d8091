use anyhow::{anyhow, bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use pax_artifact::{ArtifactEntry, EditingContext};
use pax_document::{Document, Node};
use pax_session::logging::{init_tracing, LogFormat};
use pax_session::{Commit, DocumentStore, EditingSession, FileStore, SessionConfig};
use std::path::PathBuf;

fn artifact_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("type")
            .long("type")
            .required(true)
            .help("Artifact source type, e.g. DockerRegistry"),
    )
    .arg(
        Arg::new("connector")
            .long("connector")
            .help("connectorRef: account.<id>, org.<id> or <id>"),
    )
    .arg(
        Arg::new("spec")
            .long("spec")
            .action(ArgAction::Append)
            .value_name("KEY=VALUE")
            .help("Additional spec field (repeatable)"),
    )
}

fn cli() -> Command {
    Command::new("pax")
        .version(pax_session::VERSION)
        .about("Edit pipeline artifacts, sidecars and override sets")
        .subcommand_required(true)
        .arg(
            Arg::new("store")
                .long("store")
                .global(true)
                .default_value(".")
                .value_parser(value_parser!(PathBuf))
                .help("Directory of <pipeline>.yaml documents"),
        )
        .arg(Arg::new("pipeline").long("pipeline").global(true).help("Pipeline document identifier"))
        .arg(Arg::new("stage").long("stage").global(true).help("Selected stage identifier"))
        .arg(
            Arg::new("override-set")
                .long("override-set")
                .global(true)
                .help("Edit this override set of the stage"),
        )
        .arg(
            Arg::new("propagation")
                .long("propagation")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Edit stage-level overrides of a propagated service"),
        )
        .arg(
            Arg::new("parent-override-set")
                .long("parent-override-set")
                .global(true)
                .help("Edit this override set of the parent stage"),
        )
        .arg(
            Arg::new("parent-stage")
                .long("parent-stage")
                .global(true)
                .help("Parent stage name (default: the stage's useFromStage)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Session configuration TOML"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print the edited document instead of saving it"),
        )
        .arg(
            Arg::new("log-format")
                .long("log-format")
                .global(true)
                .default_value("pretty")
                .value_parser(value_parser!(LogFormat))
                .help("Log output format: pretty or json"),
        )
        .subcommand(Command::new("artifacts").about("Show the artifacts of the editing context"))
        .subcommand(Command::new("refs").about("List connector references of the editing context"))
        .subcommand(artifact_args(Command::new("set-primary").about("Replace the primary artifact")))
        .subcommand(Command::new("clear-primary").about("Clear the primary artifact"))
        .subcommand(artifact_args(
            Command::new("upsert-sidecar")
                .about("Replace or append a sidecar")
                .arg(
                    Arg::new("index")
                        .long("index")
                        .required(true)
                        .value_parser(value_parser!(usize)),
                )
                .arg(Arg::new("identifier").long("identifier").required(true)),
        ))
        .subcommand(
            Command::new("remove-sidecar").about("Remove a sidecar").arg(
                Arg::new("index")
                    .long("index")
                    .required(true)
                    .value_parser(value_parser!(usize)),
            ),
        )
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a str> {
    args.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("--{name} is required"))
}

fn editing_context(args: &ArgMatches, root: &Node, stage: &str) -> Result<EditingContext> {
    let override_set = args.get_one::<String>("override-set");
    let parent_set = args.get_one::<String>("parent-override-set");
    let propagation = args.get_flag("propagation");

    match (override_set, parent_set, propagation) {
        (None, None, false) => Ok(EditingContext::Plain),
        (Some(id), None, false) => Ok(EditingContext::OverrideSet(id.clone())),
        (None, None, true) => Ok(EditingContext::StagePropagation),
        (None, Some(id), false) => match args.get_one::<String>("parent-stage") {
            Some(parent) => Ok(EditingContext::ParentOverrideSet {
                override_set: id.clone(),
                parent_stage: parent.clone(),
            }),
            None => Ok(EditingContext::inherited(root, stage, id.clone())?),
        },
        _ => bail!("choose at most one of --override-set, --propagation, --parent-override-set"),
    }
}

fn artifact_entry(args: &ArgMatches, identifier: Option<&str>) -> Result<ArtifactEntry> {
    let artifact_type = required(args, "type")?;
    let mut entry = match identifier {
        Some(id) => ArtifactEntry::sidecar(id, artifact_type, Node::object()),
        None => ArtifactEntry::primary(artifact_type, Node::object()),
    };
    if let Some(connector) = args.get_one::<String>("connector") {
        entry = entry.with_spec_field("connectorRef", Node::string(connector.as_str()));
    }
    for field in args.get_many::<String>("spec").into_iter().flatten() {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| anyhow!("--spec expects KEY=VALUE, got '{field}'"))?;
        entry = entry.with_spec_field(key, Node::string(value));
    }
    Ok(entry)
}

fn print_commit(commit: &Commit) {
    if !commit.changed {
        println!("no change");
    }
    for reference in &commit.reconciliation.missing {
        println!("unresolved connector: {reference}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let format = matches.get_one::<LogFormat>("log-format").copied().unwrap_or_default();
    init_tracing(format, "info");

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => SessionConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => SessionConfig::default(),
    };

    let store = FileStore::new(
        matches
            .get_one::<PathBuf>("store")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(".")),
    );
    let pipeline = required(&matches, "pipeline")?;
    let stage = required(&matches, "stage")?;

    let yaml = store.load(pipeline).await?;
    let document = Document::from_yaml(&yaml).with_context(|| format!("parsing pipeline '{pipeline}'"))?;
    let context = editing_context(&matches, document.root(), stage)?;
    let mut session = EditingSession::open(pipeline, document, stage, context, config)?;

    let commit = match matches.subcommand() {
        Some(("artifacts", _)) => {
            let list = session.artifacts()?;
            print!("{}", Document::new(list.write_container(None)).to_yaml()?);
            return Ok(());
        }
        Some(("refs", _)) => {
            for reference in session.references()? {
                println!("{}\t{}", reference.scope, reference.identifier);
            }
            return Ok(());
        }
        Some(("set-primary", args)) => session.set_primary(artifact_entry(args, None)?)?,
        Some(("clear-primary", _)) => session.clear_primary()?,
        Some(("upsert-sidecar", args)) => {
            let index = args.get_one::<usize>("index").copied().unwrap_or_default();
            let identifier = required(args, "identifier")?;
            session.upsert_sidecar(index, artifact_entry(args, Some(identifier))?)?
        }
        Some(("remove-sidecar", args)) => {
            let index = args.get_one::<usize>("index").copied().unwrap_or_default();
            session.remove_sidecar(index)?
        }
        Some((other, _)) => bail!("unknown command '{other}'"),
        None => bail!("no command given"),
    };

    print_commit(&commit);
    if matches.get_flag("dry-run") {
        print!("{}", session.to_yaml()?);
    } else if session.is_modified() {
        let hash = session.save(&store).await?;
        println!("saved {pipeline} ({})", hash.short());
    }
    Ok(())
}
