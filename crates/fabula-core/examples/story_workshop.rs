//! Collaborative story workshop over Gemini.
//!
//! Five roles take turns: a human proxy, a planning agent directing the
//! workflow, a writer, a reviewer, and a moral extractor. Reads the topic
//! from stdin and the API key from `GEMINI_API_KEY`.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use fabula_core::prelude::*;
use fabula_llm::GeminiAdapter;
use tokio::sync::mpsc;

const PLANNER_PROMPT: &str = "You are the planning agent for a story workshop. \
Coordinate the team: ask the writer for a draft, the reviewer for feedback, \
and the moral extractor for the lesson. End every message with a line \
'NEXT: <participant>' naming who should speak next. When the workshop is \
finished, say 'The process is complete.' instead.";

const WRITER_PROMPT: &str = "You are a creative story writer. When asked, \
write a short, vivid story on the given topic. Revise it when the reviewer \
gives feedback.";

const REVIEWER_PROMPT: &str = "You are a story reviewer. Give concise, \
constructive feedback on the latest draft, with concrete examples.";

const EXTRACTOR_PROMPT: &str = "You are a moral extractor. When asked, state \
the moral of the finished story in one or two sentences, starting with \
'Moral:'.";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fabula_core=info".into()),
        )
        .init();

    println!("=================================");
    println!("   Fabula Story Workshop");
    println!("=================================\n");

    let api_key = std::env::var("GEMINI_API_KEY")
        .map_err(|_| "set GEMINI_API_KEY to run this example")?;
    let llm = Arc::new(
        GeminiAdapter::new(api_key, "gemini-1.5-flash")
            .with_temperature(0.7)
            .with_timeout(Duration::from_secs(120)),
    );

    print!("Story topic: ");
    io::stdout().flush()?;
    let mut topic = String::new();
    io::stdin().lock().read_line(&mut topic)?;
    let topic = topic.trim().to_string();
    if topic.is_empty() {
        return Err("a topic is required".into());
    }

    // Human input feeds the proxy; a short timeout keeps the workshop moving
    // when the operator stays silent.
    let (input_tx, input_rx) = mpsc::channel::<String>(8);
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if input_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    let config = SessionConfig::new()
        .with_max_rounds(30)
        .with_selection_policy(SelectionPolicy::DirectorSelected)
        .with_director("planning_agent")
        .with_terminator("planning_agent")
        .with_extractor("moral_extractor")
        .with_seed_sender("user_proxy")
        .with_call_timeout(Duration::from_secs(120));

    let session = Session::new(config)
        .with_participant(Arc::new(
            HumanParticipant::new("user_proxy", input_rx).with_timeout(Duration::from_secs(30)),
        ))
        .with_participant(Arc::new(
            LlmParticipant::new("planning_agent", llm.clone()).with_role_prompt(PLANNER_PROMPT),
        ))
        .with_participant(Arc::new(
            LlmParticipant::new("story_writer", llm.clone()).with_role_prompt(WRITER_PROMPT),
        ))
        .with_participant(Arc::new(
            LlmParticipant::new("story_reviewer", llm.clone()).with_role_prompt(REVIEWER_PROMPT),
        ))
        .with_participant(Arc::new(
            LlmParticipant::new("moral_extractor", llm).with_role_prompt(EXTRACTOR_PROMPT),
        ));

    session
        .preseed_memory([
            (
                ParticipantId::new("story_writer"),
                "Always write vivid and imaginative stories.".to_string(),
            ),
            (
                ParticipantId::new("story_reviewer"),
                "Focus on constructive criticism with specific examples.".to_string(),
            ),
            (
                ParticipantId::new("moral_extractor"),
                "Extract morals that connect to real-world values.".to_string(),
            ),
        ])
        .await;

    println!("\n--- workshop start ---\n");
    match session.run_session(&topic).await {
        Ok(outcome) => {
            for message in &outcome.transcript {
                println!("[{}] {}:\n{}\n", message.seq, message.sender, message.content);
            }
            println!("--- finished after {} rounds ({}) ---", outcome.rounds, outcome.reason);
            if let Some(moral) = outcome.moral {
                println!("\n{moral}");
            }
        }
        Err(e) => {
            eprintln!("session aborted: {e}");
            for message in e.partial_transcript() {
                eprintln!("[{}] {}: {}", message.seq, message.sender, message.content);
            }
        }
    }

    Ok(())
}
