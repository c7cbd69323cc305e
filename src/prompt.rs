//! Prompt assembly: system instruction, per-mode format block, user input,
//! attached file blocks, and read-error notes, in a fixed layout.

use crate::backend::OutputMode;

const SYSTEM_PROMPT: &str = "You are a reasoning assistant providing a second opinion.

Analyze the input provided and give your perspective. If file contents are attached, analyze them as given.

Be direct and helpful. Skip meta-commentary about what you can or can't do - just answer the question.";

const MEMO_FORMAT: &str = "
OUTPUT FORMAT - Structure your response as a memo:

## Summary
[2-3 sentence overview of the core insight]

## Key Assumptions
[Bullet list of assumptions you're making]

## Analysis
[Deep reasoning about the topic - this is the main section]

## Options
[If applicable: different approaches or perspectives]

## Risks
[Potential downsides, blind spots, or concerns]

## Recommendation
[Your synthesized recommendation or conclusion]

## Next Questions
[Questions that would help refine the thinking further]

Keep it concise but deep. Prioritize insight over length.";

const BULLETS_FORMAT: &str = "
OUTPUT FORMAT - Bullet points only:
- Provide your analysis as clear, concise bullet points
- Each bullet should be a distinct insight or observation
- Group related points together
- No headers or sections, just bullets
- Aim for 5-15 bullets depending on complexity";

const QUESTIONS_FORMAT: &str = "
OUTPUT FORMAT - Questions only:
- Generate probing questions that would help think through this topic
- Include questions that challenge assumptions
- Include questions that explore implications
- Include questions that identify unknowns
- Aim for 5-10 high-quality questions
- Just list the questions, no other commentary";

const QUICK_FORMAT: &str = "
OUTPUT FORMAT - Quick response:
- Give a direct, concise answer
- No sections or formatting
- 2-5 sentences max";

/// Format instruction block for an output mode.
pub fn format_block(mode: OutputMode) -> &'static str {
    match mode {
        OutputMode::Memo => MEMO_FORMAT,
        OutputMode::Bullets => BULLETS_FORMAT,
        OutputMode::Questions => QUESTIONS_FORMAT,
        OutputMode::Quick => QUICK_FORMAT,
    }
}

/// Assemble the full prompt blob the backends receive.
///
/// `attachments` are pre-rendered file blocks; `read_errors` are the paths
/// that could not be read, noted inline so the model knows what's missing.
pub fn build_prompt(
    input: &str,
    mode: OutputMode,
    attachments: &[String],
    read_errors: &[String],
) -> String {
    let mut prompt = format!(
        "{SYSTEM_PROMPT}\n{}\n\n---\n\nUSER INPUT:\n{input}",
        format_block(mode)
    );

    if !attachments.is_empty() {
        prompt.push_str("\n\n--- ATTACHED FILES ---\n");
        prompt.push_str(&attachments.join("\n\n"));
        prompt.push_str("\n--- END ATTACHED FILES ---");
    }

    if !read_errors.is_empty() {
        prompt.push_str(&format!(
            "\n\n(Note: Some files could not be read: {})",
            read_errors.join("; ")
        ));
    }

    prompt
}
