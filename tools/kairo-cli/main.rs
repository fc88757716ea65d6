use clap::Parser;
use kairo::prelude::*;
use kairo::schema::Schema;
use std::fs;
use std::time::Instant;

/// Compiles a saved graph against a schema pack and prints a validation
/// report: execution order, per-node invalid reasons, edge completeness.
#[derive(Parser)]
#[command(name = "kairo-cli", version, about)]
struct Args {
    /// Path to the schema pack: a JSON array of schema definitions
    schemas: String,

    /// Path to the saved graph (JSON)
    graph: String,

    /// Write the compiled plan to this path (bincode)
    #[arg(short, long)]
    output: Option<String>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let schemas: Vec<Schema> = serde_json::from_str(&fs::read_to_string(&args.schemas)?)?;
    let total = schemas.len();
    let mut registry = SchemaRegistry::new();
    let rejections = registry.register_batch(schemas);
    println!(
        "Registered {}/{} schema(s)",
        total - rejections.len(),
        total
    );
    for rejection in &rejections {
        eprintln!("Rejected schema '{}':", rejection.schema_id);
        for reason in &rejection.reasons {
            eprintln!("  - {}", reason);
        }
    }

    let saved = SavedGraph::from_file(&args.graph)?;
    let mut store = GraphStore::load_graph(saved, &registry)?;
    println!(
        "Loaded graph: {} node(s), {} edge(s)",
        store.node_count(),
        store.edges().len()
    );

    let start = Instant::now();
    let plan = match GraphCompiler::new(&registry).compile(&store) {
        Ok(plan) => plan,
        Err(e) => {
            eprintln!("Compilation failed: {}", e);
            std::process::exit(1);
        }
    };
    store.apply_plan(&plan);
    println!("Compiled in {:.2?}", start.elapsed());

    println!("\nExecution order:");
    for id in &plan.order {
        let Some(node) = plan.node(id) else { continue };
        let mut flags = Vec::new();
        if node.invalid() {
            flags.push("invalid");
        }
        if !node.executable {
            flags.push("disabled");
        }
        if node.child {
            flags.push("child");
        }
        let suffix = if flags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", flags.join(", "))
        };
        println!("  {} ({}){}", id, node.schema_id, suffix);
        for reason in &node.reasons {
            println!("      ! {}", reason);
        }
        if let Some(children) = &node.children {
            println!("      iterates over: {}", children.join(", "));
        }
    }

    let broken = plan.edge_complete.values().filter(|c| !**c).count();
    println!(
        "\nEdges: {} total, {} broken",
        plan.edge_complete.len(),
        broken
    );

    if let Some(path) = &args.output {
        plan.save(path)?;
        println!("Plan written to {}", path);
    }
    Ok(())
}
