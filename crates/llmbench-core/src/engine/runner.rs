use crate::model::{
    Benchmark, BenchmarkRun, EvalMethod, Example, ExampleRun, ExampleRunRecord, PromptTemplate,
    SuccessState,
};
use crate::providers::{CompletionProvider, ProviderRegistry};
use crate::score::score;
use crate::storage::Store;
use crate::{extract, prompt, validate};

/// Orchestrates example execution: render prompts, call the provider, parse
/// and validate the response, score it, persist the result row. Store and
/// registry are injected; the executor owns no globals.
pub struct RunExecutor {
    store: Store,
    registry: ProviderRegistry,
}

#[derive(Debug)]
pub struct BenchmarkRunReport {
    pub benchmark_run: BenchmarkRun,
    pub results: Vec<ExampleRun>,
}

impl RunExecutor {
    pub fn new(store: Store, registry: ProviderRegistry) -> Self {
        Self { store, registry }
    }

    /// Runs every example of a benchmark against one model and one prompt
    /// template, strictly sequentially. A failed example is recorded and the
    /// run moves on; only missing ids or storage trouble abort.
    pub async fn run_benchmark(
        &self,
        benchmark_id: i64,
        model: &str,
        prompt_template_id: i64,
    ) -> anyhow::Result<BenchmarkRunReport> {
        let benchmark = self
            .store
            .benchmark_by_id(benchmark_id)?
            .ok_or_else(|| anyhow::anyhow!("no such benchmark: {}", benchmark_id))?;
        let template = self
            .store
            .template_by_id(prompt_template_id)?
            .ok_or_else(|| anyhow::anyhow!("no such prompt template: {}", prompt_template_id))?;
        let provider = self
            .registry
            .lookup(model)
            .ok_or_else(|| anyhow::anyhow!("unknown model: {}", model))?;
        let examples = self.store.examples_for_benchmark(benchmark.id)?;

        let benchmark_run = self
            .store
            .create_benchmark_run(benchmark.id, model, template.id)?;
        tracing::info!(
            event = "benchmark_run_start",
            run_id = benchmark_run.id,
            benchmark = %benchmark.name,
            model,
            examples = examples.len()
        );

        for example in &examples {
            let record = self
                .execute(&benchmark, example, &template, provider.as_ref(), model)
                .await;
            let id = self
                .store
                .insert_example_run(example.id, benchmark_run.id, &record)?;
            tracing::debug!(
                event = "example_run_done",
                example_run_id = id,
                success = ?record.success,
                error = record.error.as_deref()
            );
        }

        let results = self.store.example_runs_for_run(benchmark_run.id)?;
        Ok(BenchmarkRunReport {
            benchmark_run,
            results,
        })
    }

    /// Re-executes one example run and overwrites its row in place.
    pub async fn retry(&self, example_run_id: i64) -> anyhow::Result<ExampleRun> {
        let prior = self
            .store
            .example_run_by_id(example_run_id)?
            .ok_or_else(|| anyhow::anyhow!("no such example run: {}", example_run_id))?;
        let benchmark_run = self
            .store
            .benchmark_run_by_id(prior.benchmark_run_id)?
            .ok_or_else(|| anyhow::anyhow!("no such benchmark run: {}", prior.benchmark_run_id))?;
        let benchmark = self
            .store
            .benchmark_by_id(benchmark_run.benchmark_id)?
            .ok_or_else(|| anyhow::anyhow!("no such benchmark: {}", benchmark_run.benchmark_id))?;
        let template = self
            .store
            .template_by_id(benchmark_run.prompt_template_id)?
            .ok_or_else(|| {
                anyhow::anyhow!("no such prompt template: {}", benchmark_run.prompt_template_id)
            })?;
        let example = self
            .store
            .example_by_id(prior.example_id)?
            .ok_or_else(|| anyhow::anyhow!("no such example: {}", prior.example_id))?;
        let provider = self
            .registry
            .lookup(&benchmark_run.model)
            .ok_or_else(|| anyhow::anyhow!("unknown model: {}", benchmark_run.model))?;

        let record = self
            .execute(
                &benchmark,
                &example,
                &template,
                provider.as_ref(),
                &benchmark_run.model,
            )
            .await;
        self.store.overwrite_example_run(prior.id, &record)?;

        self.store
            .example_run_by_id(prior.id)?
            .ok_or_else(|| anyhow::anyhow!("example run {} vanished mid-retry", prior.id))
    }

    /// Records a human rating. Only valid while the run is awaiting
    /// evaluation; returns false if it has already been rated.
    pub fn evaluate(&self, example_run_id: i64, passed: bool) -> anyhow::Result<bool> {
        let run = self
            .store
            .example_run_by_id(example_run_id)?
            .ok_or_else(|| anyhow::anyhow!("no such example run: {}", example_run_id))?;
        if !run.success.is_pending() {
            return Ok(false);
        }
        let success = if passed {
            SuccessState::Pass
        } else {
            SuccessState::Fail
        };
        self.store.set_example_run_success(example_run_id, success)?;
        Ok(true)
    }

    async fn execute(
        &self,
        benchmark: &Benchmark,
        example: &Example,
        template: &PromptTemplate,
        provider: &dyn CompletionProvider,
        model: &str,
    ) -> ExampleRunRecord {
        let system_prompt = prompt::render(
            &template.system_template,
            &benchmark.input_schema,
            &example.inputs,
        );
        let input_prompt = template
            .input_template
            .as_deref()
            .map(|t| prompt::render(t, &benchmark.input_schema, &example.inputs))
            .unwrap_or_default();
        let raw_prompt = prompt::concat_prompts(&system_prompt, &input_prompt);

        let completion = provider
            .complete(model, &system_prompt, &input_prompt)
            .await;

        let text = match (completion.text, completion.error) {
            (_, Some(error)) => {
                return ExampleRunRecord {
                    outputs: None,
                    success: failure_state(benchmark.eval_method),
                    error: Some(error),
                    raw_prompt,
                    raw_response: None,
                    duration_ms: None,
                };
            }
            (Some(text), None) => text,
            (None, None) => {
                return ExampleRunRecord {
                    outputs: None,
                    success: failure_state(benchmark.eval_method),
                    error: Some("provider returned no output".to_string()),
                    raw_prompt,
                    raw_response: None,
                    duration_ms: None,
                };
            }
        };

        let parsed = extract::extract_json(&text)
            .and_then(|value| validate::validate_outputs(&benchmark.output_schema, &value));

        match parsed {
            Ok(outputs) => {
                let success = score(benchmark.eval_method, &example.expected_outputs, &outputs);
                ExampleRunRecord {
                    outputs: Some(outputs),
                    success,
                    error: None,
                    raw_prompt,
                    raw_response: Some(text),
                    duration_ms: completion.duration_ms,
                }
            }
            Err(failure) => ExampleRunRecord {
                outputs: None,
                success: failure_state(benchmark.eval_method),
                error: Some(failure.to_string()),
                raw_prompt,
                raw_response: Some(text),
                duration_ms: completion.duration_ms,
            },
        }
    }
}

// A failure can still be rated by a human on human-evaluated benchmarks, so
// it stays pending there instead of going straight to Fail.
fn failure_state(method: EvalMethod) -> SuccessState {
    match method {
        EvalMethod::Human => SuccessState::PendingHumanReview,
        EvalMethod::Equality => SuccessState::Fail,
    }
}
