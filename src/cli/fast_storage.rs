use anyhow::Result;

use strata::config::StrataConfig;
use strata::tier::provisioner_from_config;

/// Show which fast storage `strata serve` would mirror into. Nothing is
/// created; `serve` checks the directory is writable when it starts.
pub fn fast_storage(config: &StrataConfig) -> Result<()> {
    let provisioner = provisioner_from_config(config);
    println!("Provisioner:   {}", provisioner.describe());

    match provisioner.locate() {
        Some(dir) => {
            println!("Fast store:    {}", dir.join(&config.storage.db_file).display());
            if !dir.is_dir() {
                println!("               (directory will be created by `strata serve`)");
            }
            println!("Mode:          mirrored");
            println!(
                "Sync interval: every {}s, shutdown wait {}s",
                config.sync.interval_secs, config.sync.shutdown_timeout_secs
            );
        }
        None => {
            println!("Fast store:    (none)");
            println!("Mode:          disk_only");
            if !config.fast_storage.enabled {
                println!("Fast storage is disabled in [fast_storage].");
            } else if config.fast_storage.path.is_none() && !config.fast_storage.auto_detect {
                println!("Set [fast_storage].path, STRATA_FAST_PATH, or auto_detect = true to enable.");
            }
        }
    }
    println!("Durable store: {}", config.resolved_db_path().display());

    Ok(())
}
