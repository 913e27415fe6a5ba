use judge_workspace::{Portal, Transport};

pub async fn list_languages<T: Transport>(portal: &Portal<T>) -> anyhow::Result<()> {
    let catalog = portal.languages().await?;
    let default = catalog.default_key(portal.preferred_languages());

    for language in catalog.iter() {
        let marker = if Some(language.key.as_str()) == default { "*" } else { " " };
        println!("{marker} {:<12} {:<12} (judge id {})", language.key, language.name, language.judge_id);
    }
    Ok(())
}

pub async fn show_problem<T: Transport>(portal: &Portal<T>, id: &str) -> anyhow::Result<()> {
    let problem = portal.problem(id).await?;

    println!("{} [{:?}] {:?}", problem.title, problem.difficulty, problem.status);
    println!("time limit {}ms, memory limit {}MB", problem.time_limit, problem.memory_limit);
    println!();
    println!("{}", problem.description);

    for (index, case) in problem.sample_cases().enumerate() {
        println!();
        println!("sample {}:", index + 1);
        println!("  input:  {}", case.input.as_deref().unwrap_or("-"));
        println!("  output: {}", case.output.as_deref().unwrap_or("-"));
    }
    Ok(())
}

pub async fn show_progress<T: Transport>(portal: &Portal<T>) -> anyhow::Result<()> {
    let progress = portal.my_progress().await?;

    println!(
        "solved {} / attempted {} / total {}",
        progress.solved, progress.attempted, progress.total
    );
    for entry in &progress.solved_by_difficulty {
        println!("  {:?}: {}", entry.difficulty, entry.count);
    }
    Ok(())
}
