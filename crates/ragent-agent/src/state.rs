use ragent_core::{Message, ToolCall};
use serde::Serialize;

use crate::llm::LlmResponse;

/// Where the loop goes next.
#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    /// Call the reasoning model with the current history.
    Reason,
    /// Run these tool calls in order, then reason again.
    Act(Vec<ToolCall>),
    /// Score the candidate answer; refine it or finish.
    Evaluate,
    End,
}

/// State of one run. Changed only through the transition methods below.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentState {
    pub messages: Vec<Message>,
    pub question: String,
    pub answer: String,
    pub retries: u32,
}

impl AgentState {
    /// Seed from prior history, appending the question unless history
    /// already ends with it as a user turn.
    pub fn new(question: impl Into<String>, history: &[Message]) -> Self {
        let question = question.into();
        let mut messages = history.to_vec();
        let ends_with_question = matches!(
            messages.last(),
            Some(Message::User { content }) if *content == question
        );
        if !ends_with_question {
            messages.push(Message::user(question.clone()));
        }
        Self {
            messages,
            question,
            answer: String::new(),
            retries: 0,
        }
    }

    /// REASON → ACT when the model asked for tools, otherwise REASON → EVALUATE
    /// with the response text as the candidate answer.
    pub fn apply_reasoning(&mut self, response: LlmResponse) -> Phase {
        match response {
            LlmResponse::ToolUse {
                content,
                tool_calls,
            } if !tool_calls.is_empty() => {
                self.messages
                    .push(Message::assistant_with_calls(content, tool_calls.clone()));
                Phase::Act(tool_calls)
            }
            other => {
                let content = other.into_content();
                self.messages.push(Message::assistant(content.clone()));
                self.answer = content;
                Phase::Evaluate
            }
        }
    }

    /// Fold one tool result into the history.
    pub fn apply_tool_result(&mut self, call: &ToolCall, content: impl Into<String>) {
        self.messages.push(Message::tool_result(call, content));
    }

    /// Replace the candidate with a refined answer and count the retry.
    pub fn apply_refinement(&mut self, improved: String) {
        self.answer = improved;
        self.retries += 1;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use ragent_core::ToolKind;

    #[test]
    fn test_question_appended_once() {
        let state = AgentState::new("q", &[]);
        assert_eq!(state.messages, vec![Message::user("q")]);

        let history = vec![Message::assistant("earlier"), Message::user("q")];
        let state = AgentState::new("q", &history);
        assert_eq!(state.messages.len(), 2);
    }

    #[test]
    fn test_tool_use_goes_to_act() {
        let mut state = AgentState::new("q", &[]);
        let call = ToolCall::new("c1", ToolKind::Retrieval, "q");
        let phase = state.apply_reasoning(LlmResponse::ToolUse {
            content: String::new(),
            tool_calls: vec![call.clone()],
        });
        assert_eq!(phase, Phase::Act(vec![call.clone()]));
        assert_eq!(state.messages.last().unwrap().pending_tool_calls(), &[call]);
        assert!(state.answer.is_empty());
    }

    #[test]
    fn test_tool_use_without_calls_is_an_answer() {
        let mut state = AgentState::new("q", &[]);
        let phase = state.apply_reasoning(LlmResponse::ToolUse {
            content: "just text".to_string(),
            tool_calls: Vec::new(),
        });
        assert_eq!(phase, Phase::Evaluate);
        assert_eq!(state.answer, "just text");
    }

    #[test]
    fn test_refinement_counts_retries() {
        let mut state = AgentState::new("q", &[]);
        state.apply_reasoning(LlmResponse::Done("draft".to_string()));
        state.apply_refinement("better".to_string());
        state.apply_refinement("best".to_string());
        assert_eq!(state.answer, "best");
        assert_eq!(state.retries, 2);
    }
}
