use std::io::{self, BufRead, Write};

use anyhow::Result;
use uuid::Uuid;

use crate::config::StocktalkConfig;
use crate::server;
use crate::types::{ChatMessage, FormattedResponse};

/// Interactive chat loop. History lives in memory for the duration of the
/// session; `exit` or EOF ends it.
pub async fn chat(config: StocktalkConfig) -> Result<()> {
    let pipeline = server::build_pipeline(config)?;
    let session_id = Uuid::new_v4().to_string();
    let mut history: Vec<ChatMessage> = Vec::new();

    println!("stocktalk chat — ask about inventory, sales, and suppliers.");
    println!("Type 'exit' to quit.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        let reply = pipeline.answer(question, &history, &session_id).await;
        super::print_reply(&reply);
        println!();

        history.push(ChatMessage::user(question));
        let assistant_text = match &reply.response {
            FormattedResponse::Text { text } => text.clone(),
            FormattedResponse::Table { summary, .. }
            | FormattedResponse::Document { summary, .. } => summary.clone(),
        };
        history.push(ChatMessage::assistant(assistant_text));
    }

    println!("bye");
    Ok(())
}
