//! predql - evaluate or translate predicate filters over a demo collection

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand, ValueEnum};
use predql::catalog::{Catalog, CollectionSchema};
use predql::expression::{Mode, Node, NodeKind};
use predql::filter::parse_filter;
use predql::memory::{MemoryStore, Record, SharedStore};
use predql::planner::plan;
use predql::sql::{split_property, Backend, SqlTranslator};
use predql::value::{DataType, Value};

/// predql - a predicate query engine for in-memory and SQL backends
#[derive(ClapParser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the normalized tree and its post-order evaluation plan
    Plan {
        /// Filter text, e.g. "age > 30 and city in ('NY', 'LA')"
        #[arg(short, long)]
        filter: String,
    },
    /// Evaluate the filter against the demo records
    Eval {
        #[arg(short, long)]
        filter: String,
    },
    /// Translate the filter into parameterized SQL
    Translate {
        #[arg(short, long)]
        filter: String,

        /// Target backend
        #[arg(short, long, value_enum, default_value = "sqlite")]
        backend: BackendKind,

        /// Print only the condition, without the surrounding select
        #[arg(long)]
        no_where: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BackendKind {
    Sqlite,
    Sqlserver,
}

impl BackendKind {
    fn backend(self) -> Backend {
        match self {
            BackendKind::Sqlite => Backend::sqlite(),
            BackendKind::Sqlserver => Backend::sql_server(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match args.command {
        Command::Plan { filter } => print_plan(&parse(&filter)?),
        Command::Eval { filter } => evaluate(&parse(&filter)?),
        Command::Translate {
            filter,
            backend,
            no_where,
        } => translate(&parse(&filter)?, backend, no_where),
    }
}

fn parse(filter: &str) -> Result<Node> {
    parse_filter(filter).with_context(|| format!("Failed to parse filter '{}'", filter))
}

fn print_plan(node: &Node) -> Result<()> {
    let normalized = node.normalized();
    println!("tree: {}", normalized);

    let plan = plan(&normalized);
    for (index, step) in plan.steps().enumerate() {
        let label = match &step.node.kind {
            NodeKind::Leaf(leaf) => leaf.to_string(),
            NodeKind::Group { operator, .. } => {
                format!("{} of steps {:?}", operator.keyword(), step.children)
            }
        };
        let negation = if step.node.negated { "not " } else { "" };
        println!("{:>3}: {}{}", index, negation, label);
    }
    Ok(())
}

fn evaluate(node: &Node) -> Result<()> {
    let schema = demo_schema();
    let store = SharedStore::new(demo_records());
    let keys = store
        .query_validated(node, &schema)
        .context("Failed to evaluate filter")?;

    let guard = store.read();
    for key in &keys {
        if let Some(record) = guard.get(key) {
            let fields: Vec<String> = record
                .values
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            println!("{} {{{}}}", key, fields.join(", "));
        }
    }
    println!("{} of {} records matched", keys.len(), guard.len());
    Ok(())
}

fn translate(node: &Node, kind: BackendKind, no_where: bool) -> Result<()> {
    let catalog = Catalog::new(kind.backend());
    catalog
        .register(demo_schema())
        .context("Failed to register demo collection")?;
    let schema = catalog.get("people")?;
    let translator = SqlTranslator::new(schema.as_ref(), catalog.backend());

    let translation = if no_where {
        translator.translate(node)
    } else {
        translator.select_keys(node)
    }
    .context("Failed to translate filter")?;

    println!("{}", translation.text);
    for parameter in &translation.parameters {
        println!("  {} = {}", parameter.name, parameter.value);
    }
    Ok(())
}

/// The `people` collection used by every subcommand
fn demo_schema() -> CollectionSchema {
    CollectionSchema::new("people", "people", "id")
        .with_value("name", "name", DataType::Varchar)
        .with_value("age", "age", DataType::Int64)
        .with_value("city", "city", DataType::Varchar)
        .with_value("active", "active", DataType::Boolean)
        .with_property(Mode::Value, split_property("balance", "people", "balance"))
        .with_meta("created", "created_at", DataType::Timestamp)
}

fn demo_records() -> MemoryStore {
    let people = [
        ("p1", "Ada", 25i64, "NY", true, 120u64, 1_000i64),
        ("p2", "Grace", 40, "LA", true, u64::MAX, 2_000),
        ("p3", "Linus", 50, "SF", false, 1 << 63, 3_000),
        ("p4", "Barbara", 33, "NY", true, 0, 4_000),
    ];

    people
        .into_iter()
        .map(|(key, name, age, city, active, balance, created)| {
            Record::new(key)
                .with_value("name", name)
                .with_value("age", age)
                .with_value("city", city)
                .with_value("active", active)
                .with_value("balance", balance)
                .with_meta("created", Value::Timestamp(created))
        })
        .collect()
}
