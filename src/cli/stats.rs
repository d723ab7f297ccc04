use anyhow::{Context, Result};

use crate::cache::CacheStats;
use crate::config::StocktalkConfig;

/// Display cache statistics from a running server.
pub async fn stats(config: &StocktalkConfig) -> Result<()> {
    let url = format!(
        "http://{}:{}/cache/stats",
        config.server.host, config.server.port
    );

    let stats: CacheStats = reqwest::get(&url)
        .await
        .with_context(|| format!("no server reachable at {url}"))?
        .json()
        .await
        .context("malformed stats response")?;

    println!("Cache Statistics");
    println!("{}", "=".repeat(40));
    println!("  Entries:   {}", stats.entries);
    println!("  Hits:      {}", stats.hits);
    println!("  Misses:    {}", stats.misses);
    println!("  Hit rate:  {:.1}%", stats.hit_rate * 100.0);

    Ok(())
}
