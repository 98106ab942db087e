use crate::model::{Example, ExampleRun, SuccessState};
use crate::prompt::value_text;
use std::collections::HashMap;

/// Per-example result table: expected vs. actual for every output variable,
/// plus the success marker, error text, and duration.
pub fn print_results(examples: &[Example], runs: &[ExampleRun]) {
    let by_id: HashMap<i64, &Example> = examples.iter().map(|e| (e.id, e)).collect();

    for run in runs {
        println!("{} example run #{}", marker(run.success), run.id);
        if let Some(example) = by_id.get(&run.example_id) {
            for (key, expected) in &example.expected_outputs {
                let got = run
                    .outputs
                    .as_ref()
                    .and_then(|o| o.get(key))
                    .map(value_text)
                    .unwrap_or_else(|| "-".to_string());
                println!("    {}: expected {}, got {}", key, value_text(expected), got);
            }
        }
        if let Some(error) = &run.error {
            println!("    error: {}", error);
        }
        if let Some(ms) = run.duration_ms {
            println!("    duration: {:.1}s", ms as f64 / 1000.0);
        }
    }
}

pub fn print_summary(runs: &[ExampleRun]) {
    let mut pass = 0;
    let mut fail = 0;
    let mut pending = 0;

    for run in runs {
        match run.success {
            SuccessState::Pass => pass += 1,
            SuccessState::Fail => {
                fail += 1;
                eprintln!(
                    "FAIL [example run {}]: {}",
                    run.id,
                    run.error
                        .as_deref()
                        .unwrap_or("outputs did not match expectations")
                );
            }
            SuccessState::PendingHumanReview => pending += 1,
        }
    }

    eprintln!("Results: pass={} fail={} pending={}", pass, fail, pending);
}

fn marker(success: SuccessState) -> &'static str {
    match success {
        SuccessState::Pass => "✅",
        SuccessState::Fail => "❌",
        SuccessState::PendingHumanReview => "⏳",
    }
}
