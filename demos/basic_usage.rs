// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Basic scored-eviction usage example.
//!
//! Demonstrates:
//! 1. Generating a deterministic skewed workload
//! 2. Running every preset policy through the simulator
//! 3. Comparing miss ratios against the FIFO baseline
//! 4. Describing a custom policy in JSON
//! 5. Displaying the collected metrics
//!
//! # Run
//!
//! ```bash
//! cargo run --example basic_usage
//! ```

use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use scored_eviction::{
    to_jsonl, CacheObject, Preset, ScoredPolicy, ScoredPolicyConfig, Simulator, SimulatorConfig,
};

/// Zipf-like workload from a fixed LCG so every run sees the same trace.
fn skewed_workload(len: usize, keys: u64) -> Vec<CacheObject> {
    let mut state: u64 = 0x2545_F491_4F6C_DD1D;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let u = (state >> 11) as f64 / (1u64 << 53) as f64;
            // Square the uniform draw to skew toward low key ids
            let key = ((u * u) * keys as f64) as u64;
            let size = 1 + key % 8;
            CacheObject::new(format!("obj-{key}"), size, true)
        })
        .collect::<Result<_, _>>()
        .expect("generated keys and sizes are valid")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder.install().expect("failed to install metrics recorder");

    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    println!("\n╔═══════════════════════════════════════════════════════════════╗");
    println!("║           scored-eviction: Basic Usage Example                ║");
    println!("╚═══════════════════════════════════════════════════════════════╝\n");

    // ─────────────────────────────────────────────────────────────────────────
    // 1. Workload
    // ─────────────────────────────────────────────────────────────────────────
    let objects = skewed_workload(20_000, 2_000);
    println!("📦 Generated {} accesses", objects.len());

    let mut simulator = Simulator::new(SimulatorConfig {
        capacity: 1_024,
        consider_obj_size: true,
        ..Default::default()
    })?;

    // ─────────────────────────────────────────────────────────────────────────
    // 2. Presets
    // ─────────────────────────────────────────────────────────────────────────
    let configs: Vec<ScoredPolicyConfig> = Preset::ALL.iter().map(Preset::config).collect();
    let reports = simulator.compare(&configs, &objects)?;

    // ─────────────────────────────────────────────────────────────────────────
    // 3. Compare against FIFO
    // ─────────────────────────────────────────────────────────────────────────
    let fifo = reports
        .iter()
        .find(|r| r.policy == Preset::Fifo.as_str())
        .ok_or("fifo report missing")?;

    println!("\n{:<28} {:>10} {:>12}", "policy", "miss ratio", "vs fifo");
    for report in &reports {
        let reduction = report.reduction_against(fifo)?;
        println!("{:<28} {:>10.4} {:>+11.2}%", report.policy, report.miss_ratio, reduction * 100.0);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 4. Custom policy from JSON
    // ─────────────────────────────────────────────────────────────────────────
    let custom: ScoredPolicyConfig = serde_json::from_str(
        r#"{
            "name": "size_aware_lfu",
            "formula": {"kind": "weighted_product", "frequency": 1.0, "size": -1.0}
        }"#,
    )?;
    let report = simulator.run(ScoredPolicy::new(custom)?, &objects)?;
    println!("\n🧪 Custom policy:\n{}", to_jsonl(&[report])?);

    // ─────────────────────────────────────────────────────────────────────────
    // 5. Metrics
    // ─────────────────────────────────────────────────────────────────────────
    println!("📊 Metrics:");
    let mut counters: Vec<(String, u64)> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(key, _, _, value)| match value {
            DebugValue::Counter(n) => {
                let labels: Vec<String> = key
                    .key()
                    .labels()
                    .map(|l| format!("{}={}", l.key(), l.value()))
                    .collect();
                Some((format!("{}{{{}}}", key.key().name(), labels.join(",")), n))
            }
            _ => None,
        })
        .collect();
    counters.sort();
    for (name, value) in counters {
        println!("   {name} = {value}");
    }

    println!("\n⏱️  Total simulation time: {:?}", simulator.total_elapsed());
    Ok(())
}
