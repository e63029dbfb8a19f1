use openqkd_core::oracles::available_oracles;

pub fn run() {
    let oracles = available_oracles();

    let quantum: Vec<_> = oracles.iter().filter(|o| o.info().quantum).collect();
    let classical: Vec<_> = oracles.iter().filter(|o| !o.info().quantum).collect();

    println!("Found {} oracle backend(s):\n", oracles.len());
    for oracle in &quantum {
        let info = oracle.info();
        println!("  ✅ {:<24} {}", info.name, info.description);
    }

    if !classical.is_empty() {
        println!("\nClassical reference models (bounded at S ≤ 2):\n");
        for oracle in &classical {
            let info = oracle.info();
            println!("  🎲 {:<24} {}", info.name, info.description);
        }
    }

    println!(
        "\nWrap any backend with --noise p to add a symmetric bit-flip channel."
    );
}
