//! Basic example screening lavender oil batches.
//!
//! This example shows how to:
//! 1. Build reference, adulterant and sample tables in memory
//! 2. Run the screening pipeline
//! 3. Examine verdicts and render a PCA plot

use oil_purity::prelude::*;

fn compounds() -> Vec<String> {
    ["linalool", "linalyl_acetate", "camphor", "eucalyptol", "terpinen_4_ol"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn main() -> Result<()> {
    println!("=== Lavender Purity Screen ===\n");

    let reference = ProfileTable::new(
        "reference",
        compounds(),
        vec!["angustifolia_a".into(), "angustifolia_b".into()],
        vec![
            vec![35.0, 40.0, 0.5, 1.0, 4.0],
            vec![32.0, 43.0, 0.4, 1.2, 3.5],
        ],
    )?;
    let adulterants = ProfileTable::new(
        "adulterants",
        compounds(),
        vec!["lavandin".into(), "synthetic_linalool".into()],
        vec![
            vec![30.0, 25.0, 8.0, 7.0, 1.0],
            vec![95.0, 1.0, 0.0, 0.0, 0.0],
        ],
    )?;
    let samples = ProfileTable::new(
        "samples",
        compounds(),
        vec!["batch_101".into(), "batch_102".into(), "batch_103".into()],
        vec![
            vec![34.0, 41.0, 0.5, 1.1, 3.9],
            vec![31.0, 30.0, 6.0, 5.5, 1.5],
            vec![60.0, 20.0, 0.3, 0.5, 2.0],
        ],
    )?;

    println!("Data dimensions:");
    println!("  Compounds:   {}", samples.n_compounds());
    println!("  Samples:     {}", samples.n_rows());
    println!("  References:  {}", reference.n_rows());
    println!("  Adulterants: {}", adulterants.n_rows());
    println!();

    // Strict detection only flags compounds where a sample exceeds the adulterant
    let report = Pipeline::new()
        .name("lavender-example")
        .similarity_threshold(0.95)
        .detection_rule(DetectionRule::Exceeds)
        .run(&samples, &reference, &adulterants)?;

    println!("=== Verdicts ===\n");
    for verdict in report.iter() {
        println!("{}", verdict);
        println!("   best match: {}", verdict.best_reference);
    }
    println!();
    print!("{}", report.summary());

    let plot = std::env::temp_dir().join("lavender_pca.svg");
    match report.render(&ScatterPlot::new(&plot)) {
        Ok(()) => println!("\nPCA plot written to {}", plot.display()),
        Err(e) => println!("\nPlot skipped: {}", e),
    }

    Ok(())
}
