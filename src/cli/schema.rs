use anyhow::Result;

use crate::backend::{self, SearchBackend};
use crate::config::StocktalkConfig;

/// Fetch and display the backend's search-index schema and tool list.
pub async fn schema(config: StocktalkConfig) -> Result<()> {
    let backend = backend::create_backends(&config.backend)?;

    match backend.fetch_schema().await? {
        Some(schema) => {
            println!("Index: {}", schema.index_name);
            println!("{}", "=".repeat(40));
            for field in &schema.fields {
                let mut flags = Vec::new();
                if field.key == Some(true) {
                    flags.push("key");
                }
                if field.searchable == Some(true) {
                    flags.push("searchable");
                }
                if field.filterable == Some(true) {
                    flags.push("filterable");
                }
                if field.sortable == Some(true) {
                    flags.push("sortable");
                }
                println!(
                    "  {:<24} {:<16} {}",
                    field.name,
                    field.field_type,
                    flags.join(", ")
                );
            }
        }
        None => println!("No schema endpoint available on this backend."),
    }

    let tools = backend.search("*").await?;
    let active: Vec<_> = tools.iter().filter(|t| t.is_active).collect();
    if !active.is_empty() {
        println!();
        println!("{} tool(s):", active.len());
        for tool in active {
            println!("  {:<24} {}", tool.function_name, tool.description);
        }
    }

    Ok(())
}
