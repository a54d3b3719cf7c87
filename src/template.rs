//! # Prompt template
//!
//! Every question is sent as a single user message built from three parts:
//!
//! ```text
//! <preamble>
//!
//! PDF content:
//! <selected fragment>
//!
//! Question: <question, verbatim>
//!
//! <instructions, with {language} and {max_sentences} filled in>
//! ```
//!
//! The preamble and instruction text live in the `prompt` section of the config file so
//! they can be reworded without a rebuild. The default instructions ask for a concise
//! answer in the configured language, limited to 2-3 sentences.
//!
//! ```rust
//! use pdf_chat::template::PromptTemplate;
//!
//! let prompt = PromptTemplate::default().compose("The sky is blue.", "What colour is the sky?");
//! assert!(prompt.contains("The sky is blue."));
//! assert!(prompt.contains("Question: What colour is the sky?"));
//! assert!(prompt.contains("English"));
//! ```

use serde::{Deserialize, Serialize};

const DEFAULT_PREAMBLE: &str = "The following text was taken from a PDF file. \
Please answer the question based on this text.";

const DEFAULT_INSTRUCTIONS: &str = "Please answer in {language} and keep it as short and \
to the point as possible. Focus only on the answer to the question and avoid unnecessary \
detail. Answer in at most {max_sentences} sentences.";

/// Prompt wording.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PromptTemplate {
    /// Opening line telling the model where the text comes from.
    pub preamble: String,

    /// Closing instructions. `{language}` and `{max_sentences}` are substituted.
    pub instructions: String,

    /// Language the answer must be written in.
    pub language: String,

    /// Sentence cap quoted to the model, e.g. `2-3`.
    pub max_sentences: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            preamble: DEFAULT_PREAMBLE.to_string(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            language: "English".to_string(),
            max_sentences: "2-3".to_string(),
        }
    }
}

impl PromptTemplate {
    /// The instruction suffix with placeholders filled in.
    pub fn rendered_instructions(&self) -> String {
        self.instructions
            .replace("{language}", &self.language)
            .replace("{max_sentences}", &self.max_sentences)
    }

    /// Builds the message sent for `question`, grounded on `fragment`.
    pub fn compose(&self, fragment: &str, question: &str) -> String {
        format!(
            "{}\n\nPDF content:\n{}\n\nQuestion: {}\n\n{}",
            self.preamble,
            fragment,
            question,
            self.rendered_instructions()
        )
    }
}
