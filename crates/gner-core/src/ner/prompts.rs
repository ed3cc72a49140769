//! One-shot prompt used for query entity extraction.

use crate::types::Message;

/// System instruction.
pub const NER_SYSTEM_PROMPT: &str = "You're a very effective entity extraction system.";

/// Instruction plus the worked example question.
pub const NER_ONE_SHOT_INPUT: &str = "Please extract all named entities that are important for solving the questions below.
Place the named entities in json format.

Question: Which magazine was started first Arthur's Magazine or First for Women?

";

/// Expected answer for the worked example.
pub const NER_ONE_SHOT_OUTPUT: &str =
    r#"{"named_entities": ["First for Women", "Arthur's Magazine"]}"#;

/// Format the target question.
pub fn format_question(text: &str) -> String {
    format!("Question: {}\n\n", text)
}

/// Build the message sequence for one question.
pub fn build_ner_messages(text: &str) -> Vec<Message> {
    vec![
        Message::system(NER_SYSTEM_PROMPT),
        Message::user(NER_ONE_SHOT_INPUT),
        Message::assistant(NER_ONE_SHOT_OUTPUT),
        Message::user(format_question(text)),
    ]
}
