use std::collections::BTreeSet;
use std::sync::OnceLock;

use ragent_core::{Message, RagError, RagResult, ToolCall, ToolKind, ToolOutput};
use ragent_tools::Toolbox;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::LoopPolicy;
use crate::evaluate::parse_score;
use crate::llm::LlmClient;
use crate::prompt::{evaluation_prompt, refinement_prompt, system_prompt};
use crate::state::{AgentState, Phase};

/// One executed tool call, as kept in the run trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolTraceEntry {
    pub call_id: String,
    pub tool: ToolKind,
    pub query: String,
    pub output: String,
    pub truncated: bool,
    /// Labels a retrieval call offered to the model.
    #[serde(default)]
    pub citations: Vec<usize>,
}

impl ToolTraceEntry {
    fn new(call: &ToolCall, output: &ToolOutput) -> Self {
        Self {
            call_id: call.id.clone(),
            tool: call.tool,
            query: call.query.clone(),
            output: output.content.clone(),
            truncated: output.truncated,
            citations: output.citations.clone(),
        }
    }
}

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub answer: String,
    pub tool_trace: Vec<ToolTraceEntry>,
    pub retries: u32,
    /// Score of the returned answer.
    pub score: f32,
}

impl AgentOutcome {
    /// `[n]` labels in the answer that no retrieval call of this run returned.
    pub fn dangling_citations(&self) -> Vec<usize> {
        static LABEL: OnceLock<Option<Regex>> = OnceLock::new();
        let Some(label) = LABEL.get_or_init(|| Regex::new(r"\[(\d+)\]").ok()) else {
            return Vec::new();
        };

        let offered: BTreeSet<usize> = self
            .tool_trace
            .iter()
            .filter(|entry| entry.tool == ToolKind::Retrieval)
            .flat_map(|entry| entry.citations.iter().copied())
            .collect();

        label
            .captures_iter(&self.answer)
            .filter_map(|caps| caps.get(1)?.as_str().parse::<usize>().ok())
            .filter(|n| !offered.contains(n))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// The reason / act / evaluate loop for one question.
///
/// ```text
/// REASON ──tool calls──▶ ACT ──▶ REASON
///    │
///    └─answer─▶ EVALUATE ──score ≥ threshold or retries at cap──▶ END
///                  ▲  │
///                  └──┘ refine, retries += 1
/// ```
pub struct AgentRunner {
    reasoner: LlmClient,
    evaluator: LlmClient,
    toolbox: Toolbox,
    source_description: String,
    policy: LoopPolicy,
}

impl AgentRunner {
    pub fn new(
        reasoner: LlmClient,
        evaluator: LlmClient,
        toolbox: Toolbox,
        source_description: impl Into<String>,
        policy: LoopPolicy,
    ) -> Self {
        Self {
            reasoner,
            evaluator,
            toolbox,
            source_description: source_description.into(),
            policy,
        }
    }

    pub fn policy(&self) -> &LoopPolicy {
        &self.policy
    }

    pub fn toolbox(&self) -> &Toolbox {
        &self.toolbox
    }

    /// Answer `question` given the recent conversation.
    ///
    /// Capability failures end the run with the originating error; a low
    /// score never does.
    pub async fn run(&self, question: &str, history: &[Message]) -> RagResult<AgentOutcome> {
        let system = system_prompt(&self.source_description);
        let descriptors = self.toolbox.descriptors();
        let mut state = AgentState::new(question, history);
        let mut trace = Vec::new();
        let mut reason_turns = 0u32;
        let mut score = 0.0f32;

        info!(history = history.len(), "Starting agent loop");

        let mut phase = Phase::Reason;
        loop {
            phase = match phase {
                Phase::Reason => {
                    reason_turns += 1;
                    if reason_turns > self.policy.max_reason_turns {
                        warn!(
                            max_reason_turns = self.policy.max_reason_turns,
                            "Agent loop reached max reasoning turns"
                        );
                        return Err(RagError::Agent(format!(
                            "Agent loop exceeded maximum of {} reasoning turns",
                            self.policy.max_reason_turns
                        )));
                    }
                    debug!(turn = reason_turns, messages = state.messages.len(), "REASON");
                    let response = self
                        .reasoner
                        .chat(Some(&system), &state.messages, &descriptors)
                        .await?;
                    state.apply_reasoning(response)
                }

                Phase::Act(calls) => {
                    debug!(calls = calls.len(), "ACT");
                    for call in &calls {
                        let output = self.toolbox.dispatch(call).await?;
                        trace.push(ToolTraceEntry::new(call, &output));
                        state.apply_tool_result(call, output.content);
                    }
                    Phase::Reason
                }

                Phase::Evaluate => {
                    let raw = self
                        .evaluator
                        .complete(&evaluation_prompt(&state.question, &state.answer))
                        .await?;
                    score = parse_score(&raw);
                    info!(score, retries = state.retries, "EVALUATE");

                    if self.policy.accepts(score, state.retries) {
                        Phase::End
                    } else {
                        let prompt = refinement_prompt(
                            &state.question,
                            &state.answer,
                            self.policy.refine_with_context,
                        );
                        let improved = self.reasoner.complete(&prompt).await?;
                        state.apply_refinement(improved);
                        debug!(retries = state.retries, "Refined answer");
                        Phase::Evaluate
                    }
                }

                Phase::End => break,
            };
        }

        info!(
            turns = reason_turns,
            tool_calls = trace.len(),
            retries = state.retries,
            score,
            "Agent loop completed"
        );

        Ok(AgentOutcome {
            answer: state.answer,
            tool_trace: trace,
            retries: state.retries,
            score,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn entry(tool: ToolKind, citations: Vec<usize>) -> ToolTraceEntry {
        ToolTraceEntry {
            call_id: "c".to_string(),
            tool,
            query: "q".to_string(),
            output: String::new(),
            truncated: false,
            citations,
        }
    }

    fn outcome(answer: &str, tool_trace: Vec<ToolTraceEntry>) -> AgentOutcome {
        AgentOutcome {
            answer: answer.to_string(),
            tool_trace,
            retries: 0,
            score: 1.0,
        }
    }

    #[test]
    fn test_no_dangling_when_labels_offered() {
        let o = outcome(
            "Paris [1] is large [2].",
            vec![entry(ToolKind::Retrieval, vec![1, 2, 3])],
        );
        assert!(o.dangling_citations().is_empty());
    }

    #[test]
    fn test_dangling_labels_reported_once_sorted() {
        let o = outcome(
            "See [4], [2] and again [4].",
            vec![
                entry(ToolKind::Retrieval, vec![1, 2]),
                entry(ToolKind::WebSearch, vec![]),
            ],
        );
        assert_eq!(o.dangling_citations(), vec![4]);
    }

    #[test]
    fn test_without_retrieval_every_label_dangles() {
        let o = outcome("Claim [1].", vec![entry(ToolKind::WebSearch, vec![])]);
        assert_eq!(o.dangling_citations(), vec![1]);
    }

    #[test]
    fn test_outcome_serializes_trace() {
        let o = outcome("a", vec![entry(ToolKind::Retrieval, vec![1])]);
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["tool_trace"][0]["tool"], "retrieval");
        assert_eq!(json["tool_trace"][0]["citations"], serde_json::json!([1]));
    }
}
