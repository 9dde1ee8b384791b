//! Prompt rendering for answers, quizzes and summaries
//!
//! All three renders share the context block. Rendering is pure: the same
//! chunks, question and flags always give the same text.

use crate::retrieval::ScoredChunk;

/// Shown in place of the context block when nothing was retrieved
pub const EMPTY_CONTEXT_MARKER: &str = "/* no lesson context provided */";

/// Closing question every answer ends with
pub const CLOSING_QUESTION: &str = "Would you like another explanation, an example, or a short quiz?";

const TEACHER_BEHAVIOR: &str = "You are a helpful AI teacher. Primary material is the CONTEXT from lesson files. \
If the CONTEXT fully answers the question, answer only from CONTEXT and cite chunk(s) like [Chunk 1]. \
If the CONTEXT does not fully answer, you may add a short labeled block 'Outside lessons — additional context:' \
using your general knowledge to help the student (max 2 short sentences). Never invent facts and never present outside info as lesson content.\n\n\
When the answer exists in CONTEXT, produce labeled sections in order:\n\
Answer: 1–3 concise sentences (cite chunk(s)).\n\
Simplified: one plain-language sentence rephrasing the answer.\n\
Analogy/Example: one short analogy or real-life example.\n\
Try this: two quick actionable practice steps the student can do now.\n\
Quick check: one short question to test understanding.\n\
When the student submits the quick check answer, correct mistakes, explain the correction, and cite chunk(s).\n\
If student asks 'I don't understand', re-explain in simpler language with a new example and one quick step.\n";

const OUTSIDE_LESSONS_NOTE: &str = "\nNOTE: The CONTEXT above does not fully answer the question. \
Provide a short labeled block 'Outside lessons — additional context:' with up to 2 short sentences \
using your general knowledge to help explain. Keep it distinct from lesson material.\n\n";

const REEXPLAIN_NOTE: &str = "The student requested a simpler re-explanation. \
Focus on simpler wording, one short example, and one quick practice step.\n\n";

const ANSWER_FOOTER: &str =
    "Respond now using the labeled sections requested. Do not invent facts. Keep answers student-friendly and concise.\n";

const QUIZ_INSTRUCTIONS: &str = "INSTRUCTIONS: Generate 3 short quiz questions (with correct answers) based only on the CONTEXT. \
Provide simple correct answers after each question. Label Q1/Q2/Q3. \
Do not ask about anything the CONTEXT does not cover.\n";

const SUMMARY_INSTRUCTIONS: &str = "INSTRUCTIONS: Write one concise paragraph summarizing the CONTEXT, \
labelled 'Summary (based on lessons):'. Use only facts stated in the CONTEXT.\n";

/// Stateless prompt renderer
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Numbered context block, or the empty-context marker
    pub fn context_block(&self, chunks: &[ScoredChunk]) -> String {
        if chunks.is_empty() {
            return EMPTY_CONTEXT_MARKER.to_string();
        }

        chunks
            .iter()
            .enumerate()
            .map(|(i, c)| {
                format!(
                    "Chunk {} (score:{:.4}, source:{}, idx:{}):\n{}",
                    i + 1,
                    c.score,
                    c.chunk.source,
                    c.chunk.chunk_index,
                    c.chunk.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Answer prompt with the five labeled sections
    pub fn build(
        &self,
        chunks: &[ScoredChunk],
        question: &str,
        grounded: bool,
        reexplain: bool,
    ) -> String {
        let mut extra = String::new();
        if !grounded {
            extra.push_str(OUTSIDE_LESSONS_NOTE);
        }
        if reexplain {
            extra.push_str(REEXPLAIN_NOTE);
        }

        format!(
            "CONTEXT:\n{}\n\nQUESTION:\n{}\n\n{}End with: '{}'\n\n{}{}",
            self.context_block(chunks),
            question,
            TEACHER_BEHAVIOR,
            CLOSING_QUESTION,
            extra,
            ANSWER_FOOTER
        )
    }

    /// Three Q/A pairs drawn from the context
    pub fn build_quiz(&self, chunks: &[ScoredChunk]) -> String {
        format!(
            "CONTEXT:\n{}\n\n{}",
            self.context_block(chunks),
            QUIZ_INSTRUCTIONS
        )
    }

    /// One labeled summary paragraph of the context
    pub fn build_summary(&self, chunks: &[ScoredChunk], request: &str) -> String {
        format!(
            "CONTEXT:\n{}\n\nREQUEST:\n{}\n\n{}",
            self.context_block(chunks),
            request,
            SUMMARY_INSTRUCTIONS
        )
    }
}
