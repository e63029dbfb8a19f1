use std::fmt::Write as _;
use std::time::Instant;

use openqkd_core::{AngleSet, generate, run_rng};

pub fn run(rounds: usize, seed: Option<&str>, oracle_name: &str, noise: f64, output_path: Option<&str>) {
    let oracle = match super::make_oracle(oracle_name, noise) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let alice = AngleSet::canonical_alice();
    let bob = AngleSet::canonical_bob();
    let mut rng = run_rng(seed.map(str::as_bytes));

    println!("🔬 Running verification battery: {rounds} round(s) on '{oracle_name}'...\n");

    let t0 = Instant::now();
    let trials = match generate(rounds, &alice, &bob, oracle.as_ref(), &mut rng) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Generation failed: {e}");
            std::process::exit(1);
        }
    };
    let elapsed = t0.elapsed().as_secs_f64();

    let results = openqkd_tests::run_all_tests(&trials, &alice, &bob);
    let score = openqkd_tests::calculate_quality_score(&results);
    let passed = results.iter().filter(|r| r.passed).count();

    println!("{}", "=".repeat(72));
    println!(
        "{:<22} {:>10} {:>10} {:>6} {:>6}",
        "Test", "Statistic", "p-value", "Grade", "Pass"
    );
    println!("{}", "-".repeat(72));
    for r in &results {
        let p_str = match r.p_value {
            Some(p) => format!("{p:.4}"),
            None => "—".into(),
        };
        println!(
            "{:<22} {:>10.3} {:>10} {:>6} {:>6}",
            r.name,
            r.statistic,
            p_str,
            r.grade,
            if r.passed { "✓" } else { "✗" }
        );
        println!("    {}", r.details);
    }
    println!("{}", "=".repeat(72));
    println!(
        "Score: {score:.0}/100 ({passed}/{} passed) [{elapsed:.1}s]",
        results.len()
    );

    if let Some(path) = output_path {
        let report = render_report(rounds, oracle_name, noise, &results, score);
        if let Err(e) = std::fs::write(path, report) {
            eprintln!("Failed to write report to {path}: {e}");
        } else {
            println!("\n📄 Report saved to: {path}");
        }
    }

    if passed < results.len() {
        std::process::exit(1);
    }
}

fn render_report(
    rounds: usize,
    oracle_name: &str,
    noise: f64,
    results: &[openqkd_tests::TestResult],
    score: f64,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "openqkd verification battery");
    let _ = writeln!(out, "oracle: {oracle_name}, noise: {noise}, rounds: {rounds}");
    let _ = writeln!(out, "score: {score:.0}/100");
    let _ = writeln!(out);
    for r in results {
        let _ = writeln!(
            out,
            "[{}] {} — statistic {:.4}, p-value {}, grade {}",
            if r.passed { "PASS" } else { "FAIL" },
            r.name,
            r.statistic,
            r.p_value.map_or("n/a".into(), |p| format!("{p:.6}")),
            r.grade
        );
        let _ = writeln!(out, "       {}", r.details);
    }
    out
}
