//! Transmission-rate sweep
//!
//! Runs one SIR simulation per beta on scoped threads and prints the peak of
//! the infected curve for each.

use sir_model::{build_config, InvalidConfigError, SirEngine};

fn main() -> Result<(), InvalidConfigError> {
    let betas: Vec<f64> = (1..=10).map(|k| 0.05 * k as f64).collect();
    let configs = betas
        .iter()
        .map(|&beta| build_config(100_000.0, 10.0, 0.0, beta, 0.1, 1.0, 365))
        .collect::<Result<Vec<_>, _>>()?;

    let engine = SirEngine::new();
    let trajectories: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = configs
            .iter()
            .map(|cfg| scope.spawn(move || engine.run(cfg)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("sweep worker panicked"))
            .collect()
    });

    println!("{:>6} {:>6} {:>12} {:>8} {:>8}", "beta", "R0", "peak I", "day", "clamps");
    for ((beta, cfg), traj) in betas.iter().zip(&configs).zip(&trajectories) {
        let r0 = cfg.basic_reproduction_number().unwrap_or(f64::INFINITY);
        if let Some(peak) = traj.peak_infected() {
            println!(
                "{beta:>6.2} {r0:>6.2} {:>12.0} {:>8.0} {:>8}",
                peak.infected,
                peak.t,
                traj.instability_count()
            );
        }
    }

    Ok(())
}
