use clap::{Parser, Subcommand, ValueEnum};
use facette_backend::{
    config::read_config_file,
    storage::{
        Backend, Collection, Entity, Graph, MetricGroup, Scale, SourceGroup, StorageResult, Unit,
    },
    util::{get_driver, get_target},
};
use serde::Serialize;
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (defaults to FACETTE_DB_DRIVER / FACETTE_DB_TARGET)
    #[arg(short)]
    file: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Create the schema and report backend health
    Init,

    /// Print every stored entity of a kind as JSON
    List { kind: Kind },

    /// Print one stored entity as JSON
    Get { kind: Kind, id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Graphs,
    Collections,
    Sourcegroups,
    Metricgroups,
    Scales,
    Units,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("facette_backend", LevelFilter::INFO),
        ("facette_storectl", LevelFilter::TRACE),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let backend = match &args.file {
        Some(file) => Backend::connect(&read_config_file(file)?).await?,
        None => Backend::open(&get_driver(), &get_target()).await?,
    };

    match args.command {
        Command::Init => {
            let health = backend.health_check().await?;
            info!("{}", health.message);
            println!("{}", serde_json::to_string_pretty(&health.metadata)?);
        }
        Command::List { kind } => match kind {
            Kind::Graphs => print_list::<Graph>(&backend).await?,
            Kind::Collections => print_list::<Collection>(&backend).await?,
            Kind::Sourcegroups => print_list::<SourceGroup>(&backend).await?,
            Kind::Metricgroups => print_list::<MetricGroup>(&backend).await?,
            Kind::Scales => print_list::<Scale>(&backend).await?,
            Kind::Units => print_list::<Unit>(&backend).await?,
        },
        Command::Get { kind, id } => match kind {
            Kind::Graphs => print_one::<Graph>(&backend, &id).await?,
            Kind::Collections => print_one::<Collection>(&backend, &id).await?,
            Kind::Sourcegroups => print_one::<SourceGroup>(&backend, &id).await?,
            Kind::Metricgroups => print_one::<MetricGroup>(&backend, &id).await?,
            Kind::Scales => print_one::<Scale>(&backend, &id).await?,
            Kind::Units => print_one::<Unit>(&backend, &id).await?,
        },
    }

    backend.close().await?;
    Ok(())
}

async fn print_list<E: Entity + Serialize>(backend: &Backend) -> anyhow::Result<()> {
    let mut entities: Vec<E> = Vec::new();
    backend.list(&mut entities, "").await?;
    println!("{}", serde_json::to_string_pretty(&entities)?);
    Ok(())
}

async fn print_one<E: Entity + Serialize>(backend: &Backend, id: &str) -> anyhow::Result<()> {
    let entity = fetch::<E>(backend, id).await?;
    println!("{}", serde_json::to_string_pretty(&entity)?);
    Ok(())
}

async fn fetch<E: Entity>(backend: &Backend, id: &str) -> StorageResult<E> {
    let mut entity = E::default();
    backend.get(id, &mut entity).await?;
    Ok(entity)
}
