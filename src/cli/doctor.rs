//! CLI `doctor` command: run database diagnostics and print a health report.

use anyhow::{Context, Result};

use strata::config::StrataConfig;
use strata::db;
use strata::memory::types::Category;
use strata::tier::provisioner_from_config;

/// Run database diagnostics and print a health report.
pub fn doctor(config: &StrataConfig) -> Result<()> {
    let db_path = config.resolved_db_path();

    if !db_path.exists() {
        println!("Database: not found at {}", db_path.display());
        println!("Run `strata serve` or `strata remember` to initialize.");
        return Ok(());
    }

    let file_size = std::fs::metadata(&db_path)
        .map(|m| m.len())
        .unwrap_or(0);

    let conn = db::open_database(&db_path)
        .context("failed to open database (may be corrupt)")?;

    let report = db::check_database_health(&conn)
        .context("failed to run health check")?;

    println!("Strata Health Report");
    println!("====================");
    println!();
    println!("Database:          {}", db_path.display());
    println!("File size:         {}", format_bytes(file_size));
    println!("Schema version:    {}", report.schema_version);
    println!(
        "Snapshot imported: {}",
        report.last_import_at.as_deref().unwrap_or("(never)")
    );
    println!(
        "Fast storage:      {}",
        provisioner_from_config(config).describe()
    );
    println!();
    println!("Row counts:");
    for layer in Category::ALL {
        let count = report.layer_counts.get(&layer).copied().unwrap_or(0);
        println!("  {:<16} {}", layer, count);
    }
    println!();
    if report.integrity_ok {
        println!("Integrity check:   PASSED");
    } else {
        println!("Integrity check:   FAILED ({})", report.integrity_details);
    }

    if !report.integrity_ok {
        println!();
        println!("Recovery steps:");
        println!("  1. Restore from a backup: cp backup.db ~/.strata/memory.db");
        println!("  2. Or export from a good copy and reimport:");
        println!("     strata export --out backup.json");
        println!("     strata import backup.json");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
