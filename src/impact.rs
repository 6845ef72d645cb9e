//! Impact analysis from the command line.
//!
//! `ainstein impact <element>` runs a bounded traversal from an element
//! and prints every reached element with its depth and the relationship it
//! was reached through. `--chains` prints outgoing dependency paths
//! instead.

use anyhow::{bail, Result};

use ainstein_core::repository::ModelRepository;
use ainstein_core::taxonomy::RelationshipKind;
use ainstein_core::traversal::{Direction, TraversalOptions};

use crate::get::find_elements;

pub struct ImpactArgs<'a> {
    pub key: &'a str,
    pub max_depth: usize,
    pub direction: Direction,
    /// Relationship kinds to follow, by name (`serving`, `Triggering`, ...).
    pub kinds: &'a [String],
    pub chains: bool,
}

/// Parse `--direction` values.
pub fn parse_direction(value: &str) -> Result<Direction> {
    match value.to_ascii_lowercase().as_str() {
        "out" | "outgoing" => Ok(Direction::Outgoing),
        "in" | "incoming" => Ok(Direction::Incoming),
        "both" => Ok(Direction::Both),
        other => bail!("unknown direction '{}': expected outgoing, incoming or both", other),
    }
}

fn parse_kinds(names: &[String]) -> Result<Vec<RelationshipKind>> {
    names
        .iter()
        .map(|name| {
            RelationshipKind::from_raw(name)
                .ok_or_else(|| anyhow::anyhow!("unknown relationship kind: {}", name))
        })
        .collect()
}

pub fn run_impact(repo: &ModelRepository, args: &ImpactArgs<'_>) -> Result<()> {
    let seeds = find_elements(repo, args.key)?;
    let seed = seeds[0];
    if seeds.len() > 1 {
        tracing::warn!(
            name = %args.key,
            matches = seeds.len(),
            "several elements share this name, using the first"
        );
    }

    println!(
        "{} ({}, {} layer, model {})",
        seed.display_name(),
        seed.type_label(),
        seed.layer.label(),
        seed.model
    );
    println!();

    if args.chains {
        let chains = repo.dependency_chains(&seed.id, args.max_depth);
        if chains.is_empty() {
            println!("No outgoing dependency paths.");
        }
        for chain in chains {
            let names: Vec<&str> = std::iter::once(seed.display_name())
                .chain(chain.iter().map(|e| e.display_name()))
                .collect();
            println!("  {}", names.join(" → "));
        }
        return Ok(());
    }

    let mut options = TraversalOptions::new(args.max_depth).direction(args.direction);
    if !args.kinds.is_empty() {
        options = options.kinds(parse_kinds(args.kinds)?);
    }

    let reached = repo.traverse(&seed.id, &options);
    if reached.is_empty() {
        println!("No connected elements within {} hops.", args.max_depth);
        return Ok(());
    }

    println!(
        "  {:<5} {:<32} {:<26} {:<14} VIA",
        "DEPTH", "ELEMENT", "TYPE", "LAYER"
    );
    println!("  {}", "-".repeat(90));
    for r in &reached {
        println!(
            "  {:<5} {:<32} {:<26} {:<14} {}",
            r.depth,
            r.element.display_name(),
            r.element.type_label(),
            r.element.layer.label(),
            r.via.type_label()
        );
    }
    println!();
    println!("{} elements reached.", reached.len());
    Ok(())
}
