//! Prompt templates for the three model calls of a run.

/// Instructions for every reasoning call, naming the bound knowledge source.
pub fn system_prompt(source_description: &str) -> String {
    format!(
        "You are an Agentic RAG assistant.\n\n\
         Knowledge Source:\n{source_description}\n\n\
         Rules:\n\
         - Prefer local retrieval\n\
         - Use web search only if needed\n\
         - Cite sources as [1], [2], etc."
    )
}

/// Asks the evaluator for a bare number in [0, 1].
pub fn evaluation_prompt(question: &str, answer: &str) -> String {
    format!(
        "Score the following answer from 0 to 1.\n\
         Only return a number.\n\n\
         Question:\n{question}\n\n\
         Answer:\n{answer}"
    )
}

const REFINEMENT: &str = "The previous answer was insufficient.\n\n\
                          Improve it by:\n\
                          - Fixing mistakes\n\
                          - Adding missing information\n\
                          - Using sources better";

/// The refinement request.
///
/// Without context it carries only the generic instruction, so the model
/// sees neither the question nor the answer it is asked to improve.
pub fn refinement_prompt(question: &str, answer: &str, with_context: bool) -> String {
    if with_context {
        format!("{REFINEMENT}\n\nQuestion:\n{question}\n\nPrevious answer:\n{answer}")
    } else {
        REFINEMENT.to_string()
    }
}
