use anyhow::Result;

use ainstein_core::repository::ModelRepository;

use crate::loader::LoadReport;

/// Print every loaded model and every file that failed to parse.
pub fn list_sources(repo: &ModelRepository, report: &LoadReport) -> Result<()> {
    println!(
        "{:<28} {:>8} {:>8} {:>6}  FILE",
        "MODEL", "ELEMENTS", "RELS", "VIEWS"
    );
    for model in repo.models() {
        println!(
            "{:<28} {:>8} {:>8} {:>6}  {}",
            model.name,
            model.elements().len(),
            model.relationships().len(),
            model.views().len(),
            model.source_path.display()
        );
    }

    if !report.skipped.is_empty() {
        println!();
        println!("SKIPPED");
        for (path, reason) in &report.skipped {
            println!("  {}: {}", path.display(), reason);
        }
    }

    Ok(())
}
