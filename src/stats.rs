//! Repository statistics.
//!
//! A quick summary of what was loaded: strict per-type counts, the
//! business actor partition, and a histogram of every classified type.
//! Used by `ainstein stats`.

use anyhow::Result;

use ainstein_core::repository::ModelRepository;

use crate::loader::LoadReport;

/// Run the stats command: print a summary of the loaded repository.
pub fn run_stats(repo: &ModelRepository, report: &LoadReport) -> Result<()> {
    let counts = repo.element_counts();
    let analysis = repo.business_actor_analysis();
    let relationships = repo.relationships().count();
    let dangling: usize = repo
        .models()
        .iter()
        .map(|m| m.dangling_relationships().len())
        .sum();

    println!("AInstein — Model Stats");
    println!("======================");
    println!();
    println!("  Models:          {}", repo.models().len());
    println!("  Skipped files:   {}", report.skipped.len());
    println!("  Elements:        {}", counts.total);
    println!("  Relationships:   {} ({} dangling)", relationships, dangling);
    println!();
    println!("  Business actors:        {}", counts.business_actors);
    println!("    internal:             {}", analysis.internal_actors.len());
    println!("    departments:          {}", analysis.departments.len());
    println!("    external:             {}", analysis.external_actors.len());
    println!("  Business processes:     {}", counts.business_processes);
    println!("  Business functions:     {}", counts.business_functions);
    println!("  Application components: {}", counts.application_components);

    let histogram = repo.type_histogram();
    if !histogram.is_empty() {
        println!();
        println!("  By type (distinct names):");
        println!("  {:<32} {:>6}", "TYPE", "COUNT");
        println!("  {}", "-".repeat(39));
        for (kind, count) in histogram {
            println!("  {:<32} {:>6}", kind.label(), count);
        }
    }

    let unclassified = repo.unclassified_elements();
    if !unclassified.is_empty() {
        println!();
        println!("  Unclassified elements: {}", unclassified.len());
    }

    println!();
    println!("  Loaded at: {}", report.loaded_at.format("%Y-%m-%d %H:%M:%S UTC"));

    Ok(())
}
