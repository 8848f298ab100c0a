//! Output formatting - plaintext and JSON.

use serde_json::json;

use crate::discover::{Discovery, ResolvedEntry};

fn print_entries(title: &str, discovery: &Discovery, entries: &[ResolvedEntry]) {
    println!("{} ({}):", title, entries.len());
    for entry in entries {
        let provider = discovery.provider(entry);
        println!(
            "- {} => {} [priority {}] ({}:{})",
            entry.target,
            provider.path,
            entry.priority,
            provider.file.display(),
            provider.line
        );
    }
}

/// Prints the resolved tables and diagnostics as plain text.
pub fn print_plain(discovery: &Discovery) {
    if discovery.exact.is_empty() && discovery.assignable.is_empty() {
        println!("No providers found.");
    } else {
        print_entries("EXACT", discovery, &discovery.exact);
        print_entries("ASSIGNABLE", discovery, &discovery.assignable);
    }
    if !discovery.diagnostics.is_empty() {
        println!("DIAGNOSTICS ({}):", discovery.diagnostics.len());
        for diagnostic in &discovery.diagnostics {
            println!("- {}", diagnostic);
        }
    }
}

/// Prints the discovery result as JSON.
pub fn print_json(discovery: &Discovery) {
    let value = json!({
        "files": discovery.files.len(),
        "providers": discovery.providers,
        "exact": discovery.exact,
        "assignable": discovery.assignable,
        "diagnostics": discovery.diagnostics,
    });
    match serde_json::to_string_pretty(&value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!("{{\"diagnostics\": {}}}", discovery.diagnostics.len());
        }
    }
}
