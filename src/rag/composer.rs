//! Grounded answer composition.
//!
//! A `Pipeline` binds one topic index to the language model, the retriever
//! and the prompt template. Answering retrieves the top chunks, renders them
//! under `Content`, and makes one completion call.

use std::sync::Arc;

use serde::Serialize;

use super::index::TopicIndex;
use super::retriever::{RetrievedChunk, Retriever};
use super::topic::TopicKey;
use crate::core::errors::RagError;
use crate::llm::LanguageModel;

const DEFAULT_TEMPLATE: &str = "You are a helpful assistant answering questions based on the Wikipedia content below.

Content:
{context}

Question: {question}

Instructions:
- Answer based ONLY on the provided content
- If the information isn't in the content, say so clearly
- Be conversational and comprehensive
- Include relevant details from the content

Answer:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptTemplate {
    /// Template must contain both `{context}` and `{question}`.
    pub fn new(template: impl Into<String>) -> Result<Self, RagError> {
        let template = template.into();
        for placeholder in ["{context}", "{question}"] {
            if !template.contains(placeholder) {
                return Err(RagError::Configuration(format!(
                    "prompt template is missing the {} placeholder",
                    placeholder
                )));
            }
        }
        Ok(Self { template })
    }

    pub fn render(&self, chunks: &[RetrievedChunk], question: &str) -> String {
        let context = chunks
            .iter()
            .map(|hit| hit.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let question = question.trim();
        let values = [("{context}", context.as_str()), ("{question}", question)];

        // single left-to-right pass; substituted text is never rescanned
        let mut rendered = String::with_capacity(self.template.len() + context.len());
        let mut rest = self.template.as_str();
        while let Some((at, placeholder, value)) = values
            .iter()
            .filter_map(|(placeholder, value)| {
                rest.find(placeholder).map(|at| (at, *placeholder, *value))
            })
            .min_by_key(|(at, _, _)| *at)
        {
            rendered.push_str(&rest[..at]);
            rendered.push_str(value);
            rest = &rest[at + placeholder.len()..];
        }
        rendered.push_str(rest);
        rendered
    }
}

/// Provenance of one retrieved chunk used in an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceRef {
    pub sequence_id: usize,
    pub score: f32,
}

/// Outcome of answering one question. A failed model or embedding call is
/// a `Failed` value, never an error, so one bad upstream call cannot take
/// the request down and callers cannot mistake it for a real answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Answer {
    Grounded { text: String, sources: Vec<SourceRef> },
    Failed { cause: String },
}

impl Answer {
    pub fn is_grounded(&self) -> bool {
        matches!(self, Answer::Grounded { .. })
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Answer::Grounded { text, .. } => Some(text),
            Answer::Failed { .. } => None,
        }
    }

    /// Flatten to a display string, describing failures in-line.
    pub fn into_message(self) -> String {
        match self {
            Answer::Grounded { text, .. } => text,
            Answer::Failed { cause } => format!("Error getting response: {}", cause),
        }
    }
}

/// One topic's ready-to-run retrieval + generation chain.
pub struct Pipeline {
    topic_key: TopicKey,
    index: Arc<TopicIndex>,
    retriever: Retriever,
    model: Arc<dyn LanguageModel>,
    template: PromptTemplate,
}

impl Pipeline {
    pub fn index(&self) -> &Arc<TopicIndex> {
        &self.index
    }
}

#[derive(Clone)]
pub struct AnswerComposer {
    model: Arc<dyn LanguageModel>,
    retriever: Retriever,
    template: PromptTemplate,
}

impl AnswerComposer {
    pub fn new(model: Arc<dyn LanguageModel>, retriever: Retriever, template: PromptTemplate) -> Self {
        Self {
            model,
            retriever,
            template,
        }
    }

    pub fn build_pipeline(&self, topic_key: TopicKey, index: Arc<TopicIndex>) -> Pipeline {
        Pipeline {
            topic_key,
            index,
            retriever: self.retriever.clone(),
            model: self.model.clone(),
            template: self.template.clone(),
        }
    }

    pub async fn answer(&self, pipeline: &Pipeline, question: &str) -> Answer {
        match Self::run(pipeline, question).await {
            Ok(answer) => answer,
            Err(err) => {
                tracing::warn!(
                    topic_key = %pipeline.topic_key,
                    error = %err,
                    "Answer generation failed"
                );
                Answer::Failed {
                    cause: err.to_string(),
                }
            }
        }
    }

    async fn run(pipeline: &Pipeline, question: &str) -> Result<Answer, RagError> {
        let hits = pipeline.retriever.retrieve(&pipeline.index, question).await?;
        let prompt = pipeline.template.render(&hits, question);

        tracing::debug!(
            topic_key = %pipeline.topic_key,
            chunks = hits.len(),
            prompt_chars = prompt.len(),
            "Invoking language model"
        );
        let text = pipeline.model.complete(&prompt).await?;

        Ok(Answer::Grounded {
            text,
            sources: hits
                .iter()
                .map(|hit| SourceRef {
                    sequence_id: hit.chunk.sequence_id,
                    score: hit.score,
                })
                .collect(),
        })
    }
}
