use std::time::Instant;

use openqkd_core::{AngleSet, MetricsResult, generate_parallel, run_rng};

pub struct RunCommandConfig<'a> {
    pub rounds: usize,
    pub seed: Option<&'a str>,
    pub oracle: &'a str,
    pub noise: f64,
    pub sifting: &'a str,
    pub threads: usize,
    pub output_path: Option<&'a str>,
    pub chart: bool,
    pub show_key: bool,
}

pub fn run(cfg: RunCommandConfig) {
    let oracle = match super::make_oracle(cfg.oracle, cfg.noise) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    let rule = super::parse_sifting(cfg.sifting);
    let alice = AngleSet::canonical_alice();
    let bob = AngleSet::canonical_bob();
    let mut rng = run_rng(cfg.seed.map(str::as_bytes));

    let noise_note = if cfg.noise > 0.0 {
        format!(" with {:.1}% bit-flip noise", cfg.noise * 100.0)
    } else {
        String::new()
    };
    println!(
        "🔬 Running {} E91 round(s) on '{}'{noise_note}...",
        cfg.rounds, cfg.oracle
    );
    println!("  Alice bases: {alice}");
    println!("  Bob bases:   {bob}");

    let t0 = Instant::now();
    let trials = match generate_parallel(
        cfg.rounds,
        &alice,
        &bob,
        oracle.as_ref(),
        &mut rng,
        cfg.threads,
    ) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Generation failed: {e}");
            std::process::exit(1);
        }
    };
    let elapsed = t0.elapsed().as_secs_f64();

    let metrics = MetricsResult::compute(&trials, &alice, &bob, rule);

    println!(
        "\n✅ CHSH Value: {:.3} (classical bound 2.0, quantum max 2.828)",
        metrics.chsh_s
    );
    println!("✅ QBER: {:.2}%", metrics.qber * 100.0);
    println!("✅ Final Key Rate: {:.3}", metrics.key_rate);
    println!(
        "   {} of {} trials sifted ({} rule) [{elapsed:.2}s]",
        metrics.matched, metrics.rounds, metrics.sifting
    );
    if metrics.chsh_s <= 2.0 {
        println!("⚠️  No Bell violation — this channel is classically explainable.");
    }
    if metrics.qber > 0.5 {
        println!("⚠️  QBER above 50% — channel compromised, key rate is negative.");
    }

    if cfg.show_key {
        println!("\n🔐 Sifted key ({} bits): {}", metrics.matched, metrics.sifted_key);
    }

    if let Some(path) = cfg.output_path {
        match serde_json::to_string_pretty(&metrics) {
            Ok(json) => {
                if let Err(e) = std::fs::write(path, json) {
                    eprintln!("Failed to write report to {path}: {e}");
                } else {
                    println!("\n📄 Report saved to: {path}");
                }
            }
            Err(e) => eprintln!("Failed to serialize report: {e}"),
        }
    }

    if cfg.chart {
        if let Err(e) = crate::tui::dashboard::show(&metrics) {
            println!("❌ Chart skipped: {e}");
        }
    }
}
