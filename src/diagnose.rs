//! `solr-bridge diagnose`: environment and configuration report.

use anyhow::Result;
use solr_bridge_core::backend::IndexBackend;

use crate::commands::Bridge;
use crate::extract::locate_utility;

const NOT_FOUND: &str = "not found";

/// Print backend reachability, optional utilities, the extractor chain, the
/// document count, and every class's field configuration.
pub fn run_diagnose(bridge: &Bridge) -> Result<()> {
    println!("solr-bridge diagnostics");
    println!("=======================");
    println!();

    let reachable = bridge.client.ping();
    println!("  Solr server: {}", bridge.client.server());
    println!(
        "  Ping:        {}",
        if reachable { "ok" } else { "UNREACHABLE" }
    );
    println!();

    println!("  Utilities:");
    let utilities = [
        ("pdftotext", bridge.config.extractors.pdftotext.as_deref()),
        ("catdoc", bridge.config.extractors.catdoc.as_deref()),
    ];
    for (name, configured) in utilities {
        let location = locate_utility(name, configured)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| NOT_FOUND.to_string());
        println!("    {:<12} {}", name, location);
    }
    println!();

    println!("  Extractors (in priority order):");
    for extractor in bridge.extractors.extractors() {
        println!(
            "    {:<4} {:<14} {}",
            extractor.priority(),
            extractor.name(),
            extractor.extensions().join(", ")
        );
    }
    println!();

    if reachable {
        println!("  Indexed documents: {}", bridge.client.count());
        println!();
    }

    println!("  Classes:");
    for class_name in bridge.registry.classes() {
        println!("    {}", class_name);
        for config in bridge.registry.configs(class_name) {
            let mut flags = Vec::new();
            if config.is_stored() {
                flags.push("stored");
            }
            if config.is_indexed() {
                flags.push("indexed");
            }
            if config.is_multiple() {
                flags.push("multiple");
            }
            println!(
                "      {:<20} <- {:<24} type={:<18} {}{}",
                config.name,
                config.source,
                config
                    .field_type
                    .map(|t| t.as_str())
                    .unwrap_or("(inferred)"),
                flags.join(","),
                config
                    .filter
                    .map(|f| format!(" filter={}", f.name))
                    .unwrap_or_default()
            );
        }
    }

    Ok(())
}
