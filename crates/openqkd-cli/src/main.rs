//! CLI for openqkd — simulate E91 quantum key distribution on your laptop.

mod commands;
mod tui;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "openqkd")]
#[command(about = "openqkd — simulate the E91 QKD protocol and verify its statistics")]
#[command(version = openqkd_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the protocol: CHSH value, QBER, key rate, and the sifted key
    Run {
        /// Number of protocol rounds
        #[arg(long, default_value = "1000")]
        rounds: usize,

        /// Seed string for a reproducible run (unseeded runs draw OS entropy)
        #[arg(long)]
        seed: Option<String>,

        /// Measurement oracle backend
        #[arg(long, default_value = "state_vector", value_parser = ["state_vector", "born_rule", "local_hidden_variable"])]
        oracle: String,

        /// Symmetric bit-flip probability applied to every measured bit
        #[arg(long, default_value = "0.0")]
        noise: f64,

        /// Sifting rule: index (same basis index) or correlation (perfectly correlated angles)
        #[arg(long, default_value = "index", value_parser = ["index", "correlation"])]
        sifting: String,

        /// Worker threads for trial generation
        #[arg(long, default_value = "1")]
        threads: usize,

        /// Write the computed metrics as JSON
        #[arg(long)]
        output: Option<String>,

        /// Render the metrics dashboard after the textual report
        #[arg(long)]
        chart: bool,

        /// Skip printing the key strings
        #[arg(long)]
        no_key: bool,
    },

    /// Step through a few rounds, printing every measurement and key decision
    Demo {
        /// Number of rounds to walk through
        #[arg(long, default_value = "10")]
        rounds: usize,

        /// Seed string for a reproducible walkthrough
        #[arg(long)]
        seed: Option<String>,
    },

    /// Run the statistical verification battery against a backend
    Verify {
        /// Number of protocol rounds to collect before testing
        #[arg(long, default_value = "50000")]
        rounds: usize,

        /// Seed string for a reproducible battery run
        #[arg(long)]
        seed: Option<String>,

        /// Measurement oracle backend
        #[arg(long, default_value = "state_vector", value_parser = ["state_vector", "born_rule", "local_hidden_variable"])]
        oracle: String,

        /// Symmetric bit-flip probability applied to every measured bit
        #[arg(long, default_value = "0.0")]
        noise: f64,

        /// Write the battery report to a file
        #[arg(long)]
        output: Option<String>,
    },

    /// List the available oracle backends
    Oracles,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            rounds,
            seed,
            oracle,
            noise,
            sifting,
            threads,
            output,
            chart,
            no_key,
        } => commands::run::run(commands::run::RunCommandConfig {
            rounds,
            seed: seed.as_deref(),
            oracle: &oracle,
            noise,
            sifting: &sifting,
            threads,
            output_path: output.as_deref(),
            chart,
            show_key: !no_key,
        }),
        Commands::Demo { rounds, seed } => commands::demo::run(rounds, seed.as_deref()),
        Commands::Verify {
            rounds,
            seed,
            oracle,
            noise,
            output,
        } => commands::verify::run(rounds, seed.as_deref(), &oracle, noise, output.as_deref()),
        Commands::Oracles => commands::oracles::run(),
    }
}
