//! Wire types for OpenAI-compatible chat completion requests and stream
//! chunks.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(super) struct ChatRequestDto<'a> {
    pub model: &'a str,
    pub stream: bool,
    pub messages: [ChatMessageDto<'a>; 2],
}

#[derive(Debug, Serialize)]
pub(super) struct ChatMessageDto<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// One `data:` payload of a streamed completion.
#[derive(Debug, Deserialize)]
pub(super) struct ChatChunkDto {
    #[serde(default)]
    choices: Vec<ChoiceDto>,
    #[serde(default)]
    error: Option<ProviderErrorDto>,
}

#[derive(Debug, Deserialize)]
struct ChoiceDto {
    #[serde(default)]
    delta: DeltaDto,
}

#[derive(Debug, Default, Deserialize)]
struct DeltaDto {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDto {
    message: String,
}

impl ChatChunkDto {
    /// Concatenated text of every choice delta in the chunk.
    pub fn into_text(self) -> Result<String, String> {
        if let Some(error) = self.error {
            return Err(error.message);
        }
        Ok(self
            .choices
            .into_iter()
            .filter_map(|choice| choice.delta.content)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"choices":[{"delta":{"content":"<div>"}}]}"#, "<div>")]
    #[case(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#, "")]
    #[case(r#"{"choices":[]}"#, "")]
    fn chunks_yield_their_delta_text(#[case] raw: &str, #[case] expected: &str) {
        let chunk: ChatChunkDto = serde_json::from_str(raw).expect("valid chunk");
        assert_eq!(chunk.into_text().as_deref(), Ok(expected));
    }

    #[rstest]
    fn inline_errors_are_surfaced() {
        let chunk: ChatChunkDto =
            serde_json::from_str(r#"{"error":{"message":"overloaded"}}"#).expect("valid chunk");
        assert_eq!(chunk.into_text(), Err("overloaded".to_owned()));
    }

    #[rstest]
    fn requests_serialise_system_then_user() {
        let request = ChatRequestDto {
            model: "gpt-4o-mini",
            stream: true,
            messages: [
                ChatMessageDto {
                    role: "system",
                    content: "be terse",
                },
                ChatMessageDto {
                    role: "user",
                    content: "a clock",
                },
            ],
        };
        let value = serde_json::to_value(&request).expect("serialise");
        assert_eq!(value["stream"], true);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "a clock");
    }
}
