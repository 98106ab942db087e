use super::args::*;
use llmbench_core::engine::runner::RunExecutor;
use llmbench_core::model::{Benchmark, JsonMap, SuccessState};
use llmbench_core::providers::cohere::CohereProvider;
use llmbench_core::providers::huggingface::HuggingFaceProvider;
use llmbench_core::providers::openai::OpenAiProvider;
use llmbench_core::providers::ProviderRegistry;
use llmbench_core::storage::Store;
use llmbench_core::{import, report, validate};
use std::path::Path;
use std::sync::Arc;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const EXAMPLES_FAILED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Init(args) => cmd_init(args),
        Command::Benchmark(cmd) => cmd_benchmark(&cli.db, cmd),
        Command::Example(cmd) => cmd_example(&cli.db, cmd),
        Command::Template(cmd) => cmd_template(&cli.db, cmd),
        Command::Models => cmd_models(),
        Command::Run(args) => cmd_run(&cli.db, args).await,
        Command::Retry(args) => cmd_retry(&cli.db, args).await,
        Command::Evaluate(args) => cmd_evaluate(&cli.db, args),
        Command::Pending(args) => cmd_pending(&cli.db, args),
        Command::Results(args) => cmd_results(&cli.db, args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    write_file_if_missing(&args.config, crate::templates::BENCHMARK_YAML)?;
    if args.examples {
        write_file_if_missing(Path::new("examples.jsonl"), crate::templates::EXAMPLES_JSONL)?;
        write_file_if_missing(
            Path::new("system-template.txt"),
            crate::templates::SYSTEM_TEMPLATE_TXT,
        )?;
    }
    Ok(exit_codes::OK)
}

fn cmd_benchmark(db: &Path, cmd: BenchmarkCmd) -> anyhow::Result<i32> {
    let store = open_store(db)?;
    match cmd {
        BenchmarkCmd::Create { file } => {
            let definition =
                llmbench_core::config::load_benchmark_definition(&file).map_err(|e| anyhow::anyhow!(e))?;
            if store.benchmark_by_name(&definition.name)?.is_some() {
                eprintln!(
                    "config error: a benchmark already exists with the name {}",
                    definition.name
                );
                return Ok(exit_codes::CONFIG_ERROR);
            }
            let id = store.create_benchmark(
                &definition.name,
                definition.eval_method,
                &definition.input_schema,
                &definition.output_schema,
            )?;
            eprintln!("created benchmark {} (id {})", definition.name, id);
        }
        BenchmarkCmd::List => {
            for (benchmark, example_count) in store.list_benchmarks()? {
                println!(
                    "{}\t{}\t{}\t{} examples",
                    benchmark.id,
                    benchmark.name,
                    benchmark.eval_method.as_str(),
                    example_count
                );
            }
        }
        BenchmarkCmd::Show { name } => {
            let benchmark = require_benchmark(&store, &name)?;
            println!("name: {}", benchmark.name);
            println!("eval_method: {}", benchmark.eval_method.as_str());
            println!("input_schema:\n{}", schema_yaml(&benchmark.input_schema)?);
            println!("output_schema:\n{}", schema_yaml(&benchmark.output_schema)?);
            for template in store.templates_for_benchmark(benchmark.id)? {
                println!("template: {} (id {})", template.name, template.id);
            }
        }
    }
    Ok(exit_codes::OK)
}

fn cmd_example(db: &Path, cmd: ExampleCmd) -> anyhow::Result<i32> {
    let store = open_store(db)?;
    match cmd {
        ExampleCmd::Add {
            benchmark,
            inputs,
            expected,
        } => {
            let benchmark = require_benchmark(&store, &benchmark)?;
            let inputs: JsonMap = serde_json::from_str(&inputs)
                .map_err(|e| anyhow::anyhow!("--inputs is not a JSON object: {}", e))?;
            let expected: JsonMap = serde_json::from_str(&expected)
                .map_err(|e| anyhow::anyhow!("--expected is not a JSON object: {}", e))?;
            validate::check_example_fields(&benchmark.input_schema, &inputs, "inputs")?;
            validate::check_example_fields(&benchmark.output_schema, &expected, "expected_outputs")?;

            let id = store.insert_example(benchmark.id, &inputs, &expected)?;
            eprintln!("added example {} to {}", id, benchmark.name);
        }
        ExampleCmd::Import { benchmark, file } => {
            let benchmark = require_benchmark(&store, &benchmark)?;
            let rows = import::load_examples_jsonl(&file)?;
            for (i, (inputs, expected)) in rows.iter().enumerate() {
                validate::check_example_fields(
                    &benchmark.input_schema,
                    inputs,
                    &format!("line {}: inputs", i + 1),
                )?;
                validate::check_example_fields(
                    &benchmark.output_schema,
                    expected,
                    &format!("line {}: expected_outputs", i + 1),
                )?;
            }
            let added = store.insert_examples(benchmark.id, &rows)?;
            eprintln!("added {} examples to {}", added, benchmark.name);
        }
    }
    Ok(exit_codes::OK)
}

fn cmd_template(db: &Path, cmd: TemplateCmd) -> anyhow::Result<i32> {
    let store = open_store(db)?;
    match cmd {
        TemplateCmd::Create {
            benchmark,
            name,
            system_file,
            input_file,
        } => {
            let benchmark = require_benchmark(&store, &benchmark)?;
            let system_template = std::fs::read_to_string(&system_file).map_err(|e| {
                anyhow::anyhow!("failed to read {}: {}", system_file.display(), e)
            })?;
            let input_template = input_file
                .map(|p| {
                    std::fs::read_to_string(&p)
                        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", p.display(), e))
                })
                .transpose()?;

            let id = store.create_prompt_template(
                benchmark.id,
                &name,
                &system_template,
                input_template.as_deref(),
            )?;
            eprintln!("created template {} (id {}) for {}", name, id, benchmark.name);
        }
        TemplateCmd::List { benchmark } => {
            let benchmark = require_benchmark(&store, &benchmark)?;
            for template in store.templates_for_benchmark(benchmark.id)? {
                println!("{}\t{}", template.id, template.name);
            }
        }
    }
    Ok(exit_codes::OK)
}

fn cmd_models() -> anyhow::Result<i32> {
    for model in build_registry().available_models() {
        println!("{}", model);
    }
    Ok(exit_codes::OK)
}

async fn cmd_run(db: &Path, args: RunArgs) -> anyhow::Result<i32> {
    let store = open_store(db)?;
    let benchmark = require_benchmark(&store, &args.benchmark)?;
    let template = store
        .template_by_name(benchmark.id, &args.template)?
        .ok_or_else(|| anyhow::anyhow!("no such prompt template: {}", args.template))?;

    let executor = RunExecutor::new(store.clone(), build_registry());
    let report_data = executor
        .run_benchmark(benchmark.id, &args.model, template.id)
        .await?;

    let examples = store.examples_for_benchmark(benchmark.id)?;
    println!(
        "benchmark run {} ({} against {})",
        report_data.benchmark_run.id, benchmark.name, args.model
    );
    report::console::print_results(&examples, &report_data.results);
    report::console::print_summary(&report_data.results);

    Ok(run_exit_code(&report_data.results))
}

async fn cmd_retry(db: &Path, args: RetryArgs) -> anyhow::Result<i32> {
    let store = open_store(db)?;
    let executor = RunExecutor::new(store.clone(), build_registry());
    let run = executor.retry(args.example_run).await?;

    let example = store
        .example_by_id(run.example_id)?
        .ok_or_else(|| anyhow::anyhow!("no such example: {}", run.example_id))?;
    let runs = [run];
    report::console::print_results(std::slice::from_ref(&example), &runs);
    Ok(run_exit_code(&runs))
}

fn cmd_evaluate(db: &Path, args: EvaluateArgs) -> anyhow::Result<i32> {
    if !args.pass && !args.fail {
        anyhow::bail!("specify --pass or --fail");
    }
    let store = open_store(db)?;
    let executor = RunExecutor::new(store, build_registry());
    if executor.evaluate(args.example_run, args.pass)? {
        eprintln!("example run {} evaluated", args.example_run);
    } else {
        eprintln!(
            "example run {} has already been evaluated",
            args.example_run
        );
    }
    Ok(exit_codes::OK)
}

fn cmd_pending(db: &Path, args: PendingArgs) -> anyhow::Result<i32> {
    let store = open_store(db)?;
    let benchmark_run = store
        .benchmark_run_by_id(args.benchmark_run)?
        .ok_or_else(|| anyhow::anyhow!("no such benchmark run: {}", args.benchmark_run))?;
    let examples = store.examples_for_benchmark(benchmark_run.benchmark_id)?;
    let pending = store.pending_example_runs(benchmark_run.id)?;

    if pending.is_empty() {
        eprintln!("nothing awaiting evaluation");
    } else {
        report::console::print_results(&examples, &pending);
        eprintln!("{} example runs awaiting evaluation", pending.len());
    }
    Ok(exit_codes::OK)
}

fn cmd_results(db: &Path, args: ResultsArgs) -> anyhow::Result<i32> {
    let store = open_store(db)?;
    let benchmark_run = store
        .benchmark_run_by_id(args.benchmark_run)?
        .ok_or_else(|| anyhow::anyhow!("no such benchmark run: {}", args.benchmark_run))?;
    let examples = store.examples_for_benchmark(benchmark_run.benchmark_id)?;
    let runs = store.example_runs_for_run(benchmark_run.id)?;

    let started = chrono::DateTime::parse_from_rfc3339(&benchmark_run.created_at)
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|_| benchmark_run.created_at.clone());
    println!(
        "benchmark run {} (model {}, {})",
        benchmark_run.id, benchmark_run.model, started
    );
    report::console::print_results(&examples, &runs);
    report::console::print_summary(&runs);
    Ok(exit_codes::OK)
}

fn open_store(db: &Path) -> anyhow::Result<Store> {
    if let Some(parent) = db.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = Store::open(db)?;
    store.init_schema()?;
    Ok(store)
}

fn build_registry() -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(HuggingFaceProvider::from_env()));
    registry.register(Arc::new(OpenAiProvider::from_env()));
    registry.register(Arc::new(CohereProvider::from_env()));
    registry
}

fn require_benchmark(store: &Store, name: &str) -> anyhow::Result<Benchmark> {
    store
        .benchmark_by_name(name)?
        .ok_or_else(|| anyhow::anyhow!("no such benchmark: {}", name))
}

fn run_exit_code(runs: &[llmbench_core::model::ExampleRun]) -> i32 {
    if runs.iter().any(|r| r.success == SuccessState::Fail) {
        exit_codes::EXAMPLES_FAILED
    } else {
        exit_codes::OK
    }
}

fn schema_yaml(schema: &llmbench_core::model::Schema) -> anyhow::Result<String> {
    Ok(serde_yaml::to_string(schema)?)
}

fn write_file_if_missing(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    if !path.exists() {
        std::fs::write(path, content)?;
        eprintln!("created {}", path.display());
    } else {
        eprintln!("note: {} already exists (skipped)", path.display());
    }
    Ok(())
}
