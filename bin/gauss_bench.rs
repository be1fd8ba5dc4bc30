use clap::Parser;
use gauss_solvers::report::{render_csv, render_table, RunRecord};
use gauss_solvers::system::LinearSystem;
use gauss_solvers::{distributed, sequential, threaded, verify, SolveError};
use ndarray::Array1;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "gauss_bench",
    about = "Benchmark Gaussian elimination across sequential, threaded and distributed solvers"
)]
struct Cli {
    /// Matrix sizes to test
    #[arg(long, value_delimiter = ',', default_values_t = vec![100, 200, 500, 1000])]
    sizes: Vec<usize>,

    /// Worker counts for the parallel variants
    #[arg(long, value_delimiter = ',', default_values_t = vec![2, 4, 8])]
    workers: Vec<usize>,

    /// Seed for the random diagonally dominant generator; without it the
    /// fixed deterministic system is used
    #[arg(long)]
    seed: Option<u64>,

    /// Write the results as CSV to this path
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Print the generated system and solution for small sizes
    #[arg(long)]
    show: bool,
}

fn timed<F>(solve: F) -> Result<(Array1<f64>, f64), SolveError>
where
    F: FnOnce() -> Result<Array1<f64>, SolveError>,
{
    let start = Instant::now();
    let x = solve()?;
    Ok((x, start.elapsed().as_secs_f64()))
}

fn check(sys: &LinearSystem, x: &Array1<f64>, method: &str) -> bool {
    if verify::verify(&sys.a, x, &sys.b) {
        true
    } else {
        eprintln!(
            "warning: {method} solution rejected, max residual {:.3e} (n = {})",
            verify::max_residual(&sys.a, x, &sys.b),
            sys.n
        );
        false
    }
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if cli.sizes.is_empty() || cli.workers.iter().any(|&w| w == 0) {
        eprintln!("error: sizes must be non-empty and worker counts positive");
        process::exit(1);
    }

    let mut records = Vec::new();

    for &n in &cli.sizes {
        let sys = match cli.seed {
            Some(seed) => LinearSystem::random_dominant(n, seed),
            None => LinearSystem::well_conditioned(n),
        };
        println!("solving n = {n}");
        if cli.show && n <= 10 {
            print!("{sys}");
        }

        let (baseline_x, baseline) = match timed(|| sequential::solve(&sys.a, &sys.b)) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("error: sequential solve failed for n = {n}: {e}");
                continue;
            }
        };
        if !check(&sys, &baseline_x, "sequential") {
            continue;
        }
        if cli.show && n <= 10 {
            println!("x = {baseline_x}");
        }
        records.push(RunRecord::new("Sequential", n, 1, baseline, baseline));

        for &workers in &cli.workers {
            match timed(|| threaded::solve(&sys.a, &sys.b, workers)) {
                Ok((x, time)) if check(&sys, &x, "threaded") => {
                    records.push(RunRecord::new("Threaded", n, workers, time, baseline));
                }
                Ok(_) => {}
                Err(e) => eprintln!("error: threaded solve ({workers} workers): {e}"),
            }

            match timed(|| distributed::solve(&sys.a, &sys.b, workers)) {
                Ok((x, time)) if check(&sys, &x, "distributed") => {
                    records.push(RunRecord::new("Distributed", n, workers, time, baseline));
                }
                Ok(_) => {}
                Err(e) => eprintln!("error: distributed solve ({workers} workers): {e}"),
            }
        }
    }

    if records.is_empty() {
        eprintln!("error: no successful runs");
        process::exit(1);
    }

    print!("{}", render_table(&records));

    if let Some(path) = &cli.csv {
        if let Err(e) = std::fs::write(path, render_csv(&records)) {
            eprintln!("error: cannot write {}: {e}", path.display());
            process::exit(1);
        }
        println!("results written to {}", path.display());
    }
}
