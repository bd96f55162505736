use param_evolve::{GaConfig, GeneticAlgorithm, ParamMap, Parameter};
use tracing_subscriber::EnvFilter;

/// Rewards `a + b` landing near the code point of `c` and `a` far from it.
fn objective(p: &ParamMap) -> Vec<f64> {
    let a = p.real("a").unwrap_or_default();
    let b = p.real("b").unwrap_or_default();
    let c = p
        .text("c")
        .and_then(|s| s.chars().next())
        .map_or(0.0, |ch| ch as u32 as f64);
    vec![-(a + b - c).powi(2) + a + b, -(a - c).powi(2)]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=param_evolve=debug shows hall-of-fame replacements.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let parameters = vec![
        Parameter::integer("a", 0, 10)?,
        Parameter::real("b", 10.0, 20.0, 0.5)?,
        Parameter::categorical("c", 'a'..='z')?,
    ];

    let ga = GeneticAlgorithm::new(GaConfig::default());
    let result = ga.evolve(&parameters, &objective, &[-1.0, 1.0])?;

    println!("Best score: {}", result.best_score);
    println!("Objectives: {:?}", result.best_objectives);
    for (name, value) in &result.best {
        println!("  {name} = {value}");
    }
    for entry in result.history.entries() {
        println!(
            "Gen {:>3}: best {:>10.2}  mean {:>10.2}  hall of fame {:>10.2}",
            entry.generation, entry.best_score, entry.mean_score, entry.hall_of_fame_score
        );
    }
    Ok(())
}
