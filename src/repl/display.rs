//! Terminal output for the chat loop and `ask`

use colored::*;

use crate::retrieval::ScoredChunk;
use crate::tutor::TurnOutcome;

pub fn show_banner(version: &str, chunks: usize) {
    let width = 64;
    let rule = "=".repeat(width);

    println!("\n{}", rule.cyan());
    println!("{}", format!("  studybuddy {} - AI Study Teacher", version).bold().cyan());
    println!("{}", format!("  Lessons indexed: {} chunks", chunks).dimmed());
    println!("{}\n", rule.cyan());
    println!(
        "Ask a question, say {} to re-explain, {} for practice, or {} for a summary.",
        "'I don't understand'".green(),
        "'quiz me'".green(),
        "'summarize'".green()
    );
    println!("Type {} to quit.\n", "exit".green());
}

/// One ` - source:.. idx:.. score:..` line per chunk
pub fn format_used_chunks(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .map(|c| {
            format!(
                " - source:{} idx:{} score:{:.3}",
                c.chunk.source, c.chunk.chunk_index, c.score
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn show_outcome(outcome: &TurnOutcome) {
    match outcome {
        TurnOutcome::Answer(payload) => {
            println!("\n{}\n", "Assistant:".bold().cyan());
            println!("{}", payload.text);
            println!("\n{}", "Used chunks:".bold());
            if !payload.used_chunks.is_empty() {
                println!("{}", format_used_chunks(&payload.used_chunks).dimmed());
            }
            println!("\n---\n");
        }
        TurnOutcome::Rejected(rejection) => {
            println!("{} {}", "Assistant:".bold().cyan(), rejection.message().yellow());
        }
        TurnOutcome::Failed(failure) => {
            println!("{} {}", "Assistant:".bold().cyan(), failure.message.red());
        }
    }
}

pub fn show_goodbye() {
    println!("Goodbye.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::ChunkMetadata;

    #[test]
    fn test_used_chunk_lines() {
        let chunks = vec![
            ScoredChunk {
                chunk: ChunkMetadata {
                    id: 0,
                    source: "bio.txt".to_string(),
                    chunk_index: 2,
                    text: String::new(),
                },
                score: 0.91234,
            },
            ScoredChunk {
                chunk: ChunkMetadata {
                    id: 1,
                    source: "chem.md".to_string(),
                    chunk_index: 0,
                    text: String::new(),
                },
                score: 0.05,
            },
        ];

        assert_eq!(
            format_used_chunks(&chunks),
            " - source:bio.txt idx:2 score:0.912\n - source:chem.md idx:0 score:0.050"
        );
    }
}
