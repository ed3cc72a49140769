//! Query named-entity extraction.
//!
//! Leaves first: [`normalize`](normalize_entity) and the one-shot prompt,
//! the JSON locator/repair pass, the per-text [`EntityExtractor`], the
//! sequential [`run_ner_on_texts`] runner, and the chunked
//! [`ParallelDispatcher`].

mod batch;
mod dispatch;
mod extractor;
mod json_parser;
mod model;
mod normalize;
mod prompts;
mod result;

pub use batch::run_ner_on_texts;
pub use dispatch::{make_chunks, split_chunks, Chunk, ParallelDispatcher};
pub use extractor::{EntityExtractor, ResponseMode};
pub use json_parser::{
    extract_json_object, named_entities_from_value, parse_json_lenient, parse_named_entities,
    NAMED_ENTITIES_KEY,
};
pub use model::{LlmNerModel, NerModel};
pub use normalize::{normalize_entities, normalize_entity};
pub use prompts::{
    build_ner_messages, format_question, NER_ONE_SHOT_INPUT, NER_ONE_SHOT_OUTPUT,
    NER_SYSTEM_PROMPT,
};
pub use result::{BatchResult, ExtractionFailure, ExtractionResult, NamedEntities};
