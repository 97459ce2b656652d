use ragent_core::ToolOutput;

/// Character cap applied to every tool result.
pub const MAX_TOOL_OUTPUT_CHARS: usize = 4000;

/// Keep at most `limit` characters of `text`, flagging whether anything was cut.
pub fn truncate_chars(text: &str, limit: usize) -> ToolOutput {
    match text.char_indices().nth(limit) {
        Some((byte_end, _)) => ToolOutput {
            content: text[..byte_end].to_string(),
            truncated: true,
            citations: Vec::new(),
        },
        None => ToolOutput::complete(text),
    }
}
