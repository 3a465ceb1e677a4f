use anyhow::Result;

use crate::catalog::{Catalog, Organization};

/// Print every catalog entry and whether a seed run for `org` would load it.
pub fn list_sources(catalog: &Catalog, org: Organization, url_base: Option<&str>) -> Result<()> {
    println!(
        "{:<24} {:<8} {:<20} FILES",
        "SOURCE", "SEEDED", "ORGANIZATIONS"
    );

    for (name, entry) in catalog.entries() {
        let files = entry.file_refs(url_base);
        let orgs = entry.organizations.join(",");
        println!(
            "{:<24} {:<8} {:<20} {}",
            name,
            entry.should_seed(org),
            orgs,
            files.first().map(String::as_str).unwrap_or("-")
        );
        // Remaining files on their own lines, aligned under FILES
        for file in files.iter().skip(1) {
            println!("{:<24} {:<8} {:<20} {}", "", "", "", file);
        }
    }

    println!();
    println!(
        "{} of {} sources seeded for organization '{}'",
        catalog.entries().filter(|(_, e)| e.should_seed(org)).count(),
        catalog.len(),
        org
    );

    Ok(())
}
