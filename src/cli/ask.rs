use anyhow::Result;
use uuid::Uuid;

use crate::config::StocktalkConfig;
use crate::server;

/// Run a single question through the pipeline and print the answer.
pub async fn ask(config: StocktalkConfig, question: &str) -> Result<()> {
    let pipeline = server::build_pipeline(config)?;
    let session_id = Uuid::new_v4().to_string();

    let reply = pipeline.answer(question, &[], &session_id).await;
    super::print_reply(&reply);

    Ok(())
}
