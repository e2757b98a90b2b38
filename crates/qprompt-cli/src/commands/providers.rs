use std::path::Path;
use std::time::Instant;

/// Range used for the probe draw.
const PROBE_MAX: i64 = 255;

pub fn run(config_path: Option<&Path>) {
    let config = super::load_config(config_path);
    config.validate().unwrap_or_else(|e| super::fail(&e));

    let mut entries: Vec<_> = config.providers.iter().collect();
    entries.sort_by_key(|p| p.priority);

    println!("{} provider(s), tried in this order:\n", entries.len());
    println!(
        "  {:<16} {:>8} {:<16} {:>10}  Status",
        "Name", "Priority", "Type", "Latency"
    );
    println!("  {}", "-".repeat(68));

    let mut reachable = 0;
    for entry in entries {
        let provider = entry
            .build(config.timeout())
            .unwrap_or_else(|e| super::fail(&e));
        let info = provider.info();

        let t0 = Instant::now();
        let outcome = provider.fetch_random_integer(0, PROBE_MAX);
        let elapsed = t0.elapsed();

        let status = match &outcome {
            Ok(r) => {
                reachable += 1;
                format!("ok (drew {})", r.value)
            }
            Err(e) => format!("unavailable: {e}"),
        };
        println!(
            "  {:<16} {:>8} {:<16} {:>8.0}ms  {}",
            info.name,
            entry.priority,
            super::badge(info.quantum),
            elapsed.as_secs_f64() * 1000.0,
            status
        );
    }

    println!();
    if reachable == 0 {
        println!("No provider is reachable; generation would fail.");
    } else {
        println!("{reachable} provider(s) reachable.");
    }
}
