/// Prompt used when no other template is configured
pub const DEFAULT_TEMPLATE: &str = "\
You are a helpful AI assistant specialized in medical device support for Beluga Health.
Use the following pieces of context to answer the question at the end.
If the answer is not in the context, say that you don't know, do not try to make up an answer.
Keep the answer concise and professional.

Context:
{context}

Question: {question}

Helpful Answer:";

const CONTEXT_SEPARATOR: &str = "\n\n";

/// Template with `{context}` and `{question}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl Default for PromptTemplate {
    #[inline]
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl PromptTemplate {
    #[inline]
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Substitute the retrieved texts, separated by blank lines, and the question
    ///
    /// Placeholder text inside the documents or the question is left as is.
    #[inline]
    pub fn render<S: AsRef<str>>(&self, context: &[S], question: &str) -> String {
        let context = context
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        self.template
            .split("{question}")
            .map(|part| part.replace("{context}", &context))
            .collect::<Vec<_>>()
            .join(question)
    }
}
