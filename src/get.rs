//! Element retrieval by id or name.
//!
//! Used by the `ainstein element` command.

use anyhow::{bail, Result};

use ainstein_core::models::Element;
use ainstein_core::repository::ModelRepository;

use crate::response::ResponseBuilder;

/// Resolve `key` as an element id first, then as an exact
/// (case-insensitive) name. Every element sharing the name is returned.
pub fn find_elements<'a>(repo: &'a ModelRepository, key: &str) -> Result<Vec<&'a Element>> {
    if let Some(element) = repo.element(key) {
        return Ok(vec![element]);
    }
    let matches = repo.find_by_name(key);
    if matches.is_empty() {
        bail!("element not found: {}", key);
    }
    Ok(matches)
}

/// Print details and relationships for the element(s) matching `key`.
pub fn run_get(repo: &ModelRepository, key: &str) -> Result<()> {
    let builder = ResponseBuilder::new(repo, 1);
    let elements = find_elements(repo, key)?;
    for (i, element) in elements.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", builder.render_details(element));
        println!("- Id: {}", element.id);
    }
    Ok(())
}
