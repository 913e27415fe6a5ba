use std::path::PathBuf;

use anyhow::Context;
use judge_workspace::{ExecutionResult, Portal, Transport, Workspace};

pub struct ExecuteArgs {
    pub problem_id: String,
    pub file: PathBuf,
    pub language: Option<String>,
}

async fn prepare<T: Transport>(portal: &Portal<T>, args: &ExecuteArgs) -> anyhow::Result<Workspace<T>> {
    let code = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let workspace = portal.open_workspace(&args.problem_id).await?;
    workspace.set_code(code);
    if let Some(language) = &args.language {
        workspace.select_language(language.clone());
    }
    Ok(workspace)
}

pub async fn run_code<T: Transport>(
    portal: &Portal<T>,
    args: ExecuteArgs,
    custom_input: Option<String>,
) -> anyhow::Result<()> {
    let workspace = prepare(portal, &args).await?;
    let result = workspace.run(custom_input).await;
    workspace.close();

    if let Some(result) = result? {
        print_result(&result);
    }
    Ok(())
}

pub async fn submit_code<T: Transport>(
    portal: &Portal<T>,
    args: ExecuteArgs,
    contest_id: Option<String>,
) -> anyhow::Result<()> {
    let workspace = prepare(portal, &args).await?;
    let result = workspace.submit(contest_id).await;
    workspace.close();

    if let Some(result) = result? {
        print_result(&result);
    }

    // refetched: the submission invalidated the cached summary
    let progress = portal.my_progress().await?;
    println!("progress: {}/{} solved", progress.solved, progress.total);
    Ok(())
}

fn print_result(result: &ExecutionResult) {
    match &result.submission_id {
        Some(id) => println!("submission {id}: {}", result.status),
        None => println!("{}", result.status),
    }
    println!("{}/{} test cases passed", result.passed_count, result.total_count);

    for case in &result.test_results {
        let mark = if case.passed { "ok" } else { "FAIL" };
        let time = case
            .execution_time
            .map(|t| format!("{t}ms"))
            .unwrap_or_else(|| "-".to_string());
        let memory = case
            .memory_used
            .map(|m| format!("{m}KB"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  #{:<3} {:<5} {:<24} {:>8} {:>10}",
            case.test_case_index + 1,
            mark,
            case.status,
            time,
            memory
        );
        if let Some(error) = &case.error {
            for line in error.lines() {
                println!("        {line}");
            }
        }
    }
}
