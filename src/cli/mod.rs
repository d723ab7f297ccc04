pub mod ask;
pub mod chat;
pub mod schema;
pub mod stats;

use crate::format::viz::ChartType;
use crate::pipeline::Reply;
use crate::types::FormattedResponse;
use serde_json::Value;

/// Render one pipeline reply for the terminal.
pub fn print_reply(reply: &Reply) {
    if let Some(ref message) = reply.ai_message {
        if !message.is_empty() {
            println!("{message}");
            println!();
        }
    }

    match &reply.response {
        FormattedResponse::Text { text } => println!("{text}"),
        FormattedResponse::Table {
            summary,
            table_data,
            tool_name,
        } => {
            println!("{summary}");
            if let Some(records) = table_data {
                println!();
                print_table(records);
            }
            println!();
            println!("(source: {tool_name})");
        }
        FormattedResponse::Document {
            summary,
            json_data,
            tool_name,
        } => {
            println!("{summary}");
            println!();
            match serde_json::to_string_pretty(json_data) {
                Ok(pretty) => println!("{pretty}"),
                Err(_) => println!("{json_data}"),
            }
            println!();
            println!("(source: {tool_name})");
        }
    }

    if reply.chart.show_chart && reply.chart.chart_type != ChartType::None {
        println!();
        println!(
            "[{} chart suggested: {}]",
            reply.chart.chart_type.as_str(),
            reply.chart.title
        );
    }
}

/// Fixed-width column layout from the first record's keys.
fn print_table(records: &[Value]) {
    let Some(first) = records.first().and_then(Value::as_object) else {
        for record in records {
            println!("  {record}");
        }
        return;
    };

    let columns: Vec<&String> = first.keys().collect();
    let header: Vec<String> = columns.iter().map(|c| format!("{c:<18}")).collect();
    println!("  {}", header.join(" "));
    println!("  {}", "-".repeat(19 * columns.len()));

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|c| {
                let cell = match record.get(c.as_str()) {
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Null) | None => String::new(),
                    Some(other) => other.to_string(),
                };
                format!("{cell:<18}")
            })
            .collect();
        println!("  {}", row.join(" "));
    }
}
