use std::{env, error::Error};

use ollama_chat::{init_default_tracing, ChatBuilder};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_default_tracing();

    let model = env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
    let prompt = {
        let args: Vec<String> = env::args().skip(1).collect();
        if args.is_empty() {
            "What is (17 * 23) + 4? Use the calculator.".to_string()
        } else {
            args.join(" ")
        }
    };

    let mut chat = ChatBuilder::default()
        .set_model(model)
        .set_system_prompt("You are a helpful assistant. Use the provided tools when they help.")
        .with_common_tools()
        .build()?;

    let response = chat.send_with_tools(prompt).await?;

    println!("{}", response.content());
    if let Some(tps) = response.tokens_per_second() {
        eprintln!("[{} | {:.1} tokens/s]", response.model, tps);
    }

    let stats = chat.conversation_stats();
    eprintln!(
        "[{} messages, ~{} tokens]",
        stats.total_messages, stats.estimated_tokens
    );
    Ok(())
}
