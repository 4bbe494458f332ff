//! Code generation primitives: templates, model selection, prompt building,
//! event framing and extraction of the generated code block.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use uuid::Uuid;

/// Maximum prompt length after trimming.
pub const PROMPT_MAX: usize = 4000;
/// Maximum length of the extracted description.
pub const DESCRIPTION_MAX: usize = 200;
/// Default number of chunks between progress frames.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 10;
/// Template used when the request names none.
pub const DEFAULT_TEMPLATE: &str = "html";
/// Provider assumed when a preference entry carries no `provider:` prefix.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Static generation template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub language: &'static str,
    pub file_name: &'static str,
    pub instructions: &'static str,
}

/// Templates offered to clients, default first.
pub static TEMPLATES: [Template; 6] = [
    Template {
        id: "html",
        name: "HTML page",
        language: "html",
        file_name: "index.html",
        instructions: "Produce a single self-contained HTML document with inline CSS and JavaScript. \
                       Do not reference external assets except well-known CDNs.",
    },
    Template {
        id: "react",
        name: "React component",
        language: "jsx",
        file_name: "App.jsx",
        instructions: "Produce one React function component exported as default. \
                       Use hooks and inline styles; no imports besides React.",
    },
    Template {
        id: "vue",
        name: "Vue component",
        language: "vue",
        file_name: "App.vue",
        instructions: "Produce one Vue 3 single-file component using <script setup>.",
    },
    Template {
        id: "python",
        name: "Python script",
        language: "python",
        file_name: "main.py",
        instructions: "Produce a runnable Python 3 script using only the standard library.",
    },
    Template {
        id: "javascript",
        name: "JavaScript module",
        language: "javascript",
        file_name: "index.js",
        instructions: "Produce a runnable JavaScript program without external dependencies.",
    },
    Template {
        id: "nextjs",
        name: "Next.js page",
        language: "tsx",
        file_name: "page.tsx",
        instructions: "Produce one Next.js App Router page component written in TypeScript.",
    },
];

/// Look up a template by identifier.
pub fn template_by_id(id: &str) -> Option<&'static Template> {
    TEMPLATES.iter().find(|template| template.id == id)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationValidationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("prompt must be at most {max} characters")]
    PromptTooLong { max: usize },
    #[error("unknown template '{id}'")]
    UnknownTemplate { id: String },
}

/// Validated generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    template: &'static Template,
    save: bool,
}

impl GenerationRequest {
    pub fn try_new(
        prompt: &str,
        template_id: Option<&str>,
        save: bool,
    ) -> Result<Self, GenerationValidationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationValidationError::EmptyPrompt);
        }
        if prompt.chars().count() > PROMPT_MAX {
            return Err(GenerationValidationError::PromptTooLong { max: PROMPT_MAX });
        }
        let id = template_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(DEFAULT_TEMPLATE);
        let template = template_by_id(id).ok_or_else(|| GenerationValidationError::UnknownTemplate {
            id: id.to_owned(),
        })?;
        Ok(Self {
            prompt: prompt.to_owned(),
            template,
            save,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn template(&self) -> &'static Template {
        self.template
    }

    pub fn save(&self) -> bool {
        self.save
    }
}

/// Provider/model pair taken from the preference list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelSpec {
    pub provider: String,
    pub model: String,
}

impl ModelSpec {
    /// Parse `provider:model` or a bare `model`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let (provider, model) = match raw.split_once(':') {
            Some((provider, model)) => (provider.trim(), model.trim()),
            None => (DEFAULT_PROVIDER, raw),
        };
        (!provider.is_empty() && !model.is_empty()).then(|| Self {
            provider: provider.to_ascii_lowercase(),
            model: model.to_owned(),
        })
    }

    /// Parse a comma-separated preference list, skipping blank entries.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.split(',').filter_map(Self::parse).collect()
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

/// First preference whose provider passes `is_configured`.
pub fn select_model<'a>(
    preferences: &'a [ModelSpec],
    is_configured: impl Fn(&str) -> bool,
) -> Option<&'a ModelSpec> {
    preferences
        .iter()
        .find(|spec| is_configured(spec.provider.as_str()))
}

/// System prompt asking for a description line and one fenced code block.
pub fn system_prompt(template: &Template) -> String {
    format!(
        "You are an expert {language} developer generating small runnable demos.\n\
         {instructions}\n\
         Reply with exactly two parts:\n\
         1. A single line starting with \"Description:\" summarising the result.\n\
         2. Exactly one fenced code block tagged `{language}` containing the complete \
         contents of `{file_name}`.\n\
         Do not add any other text.",
        language = template.language,
        instructions = template.instructions,
        file_name = template.file_name,
    )
}

static FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_+#.-]*)[ \t]*\r?\n(.*?)```").expect("valid regex")
});

/// Code and description extracted from a completed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedCode {
    pub language: String,
    pub code: String,
    pub description: String,
}

/// Extract the first fenced code block and a short description.
///
/// Without a fence the whole trimmed text is treated as code. The
/// description is the first non-empty line outside the fence with any
/// `Description:` prefix removed, truncated to [`DESCRIPTION_MAX`] characters.
///
/// # Examples
/// ```
/// use codetok::domain::{extract_code, template_by_id};
///
/// let template = template_by_id("python").unwrap();
/// let out = extract_code("Description: Hi\n```python\nprint('hi')\n```", template);
/// assert_eq!(out.code, "print('hi')");
/// assert_eq!(out.description, "Hi");
/// ```
pub fn extract_code(text: &str, template: &Template) -> ExtractedCode {
    let (code, language, outside) = match FENCE.captures(text) {
        Some(captures) => {
            let whole = captures.get(0).map_or(0..0, |m| m.range());
            let tag = captures.get(1).map_or("", |m| m.as_str());
            let body = captures.get(2).map_or("", |m| m.as_str());
            let mut outside = String::with_capacity(text.len());
            outside.push_str(&text[..whole.start]);
            outside.push('\n');
            outside.push_str(&text[whole.end..]);
            let language = if tag.is_empty() {
                template.language.to_owned()
            } else {
                tag.to_ascii_lowercase()
            };
            (body.trim_end().to_owned(), language, outside)
        }
        None => (
            text.trim().to_owned(),
            template.language.to_owned(),
            String::new(),
        ),
    };

    ExtractedCode {
        language,
        code,
        description: describe(&outside),
    }
}

fn describe(text: &str) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default();
    let line = strip_label(line);
    line.chars().take(DESCRIPTION_MAX).collect::<String>().trim().to_owned()
}

fn strip_label(line: &str) -> &str {
    const LABEL: &str = "description:";
    let line = line.trim_start_matches(['*', '#', ' ']);
    match line.get(..LABEL.len()) {
        Some(head) if head.eq_ignore_ascii_case(LABEL) => line[LABEL.len()..].trim_start_matches(['*', ' ']),
        _ => line,
    }
}

/// Generated fragment delivered in the `complete` frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeFragment {
    pub id: Uuid,
    pub template_id: String,
    pub language: String,
    pub file_name: String,
    pub code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_path: Option<String>,
}

/// One frame of the generation event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GenerationEvent {
    #[serde(rename_all = "camelCase")]
    Start { model: String, template_id: String },
    Chunk { content: String },
    Progress { chunks: usize, characters: usize },
    Complete { fragment: CodeFragment },
    Error { message: String },
}

impl GenerationEvent {
    /// True for frames after which nothing else is sent.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn html() -> &'static Template {
        template_by_id("html").expect("html template")
    }

    #[rstest]
    #[case("", None, GenerationValidationError::EmptyPrompt)]
    #[case("   ", None, GenerationValidationError::EmptyPrompt)]
    #[case("hi", Some("cobol"), GenerationValidationError::UnknownTemplate { id: "cobol".to_owned() })]
    fn invalid_requests(
        #[case] prompt: &str,
        #[case] template: Option<&str>,
        #[case] expected: GenerationValidationError,
    ) {
        assert_eq!(GenerationRequest::try_new(prompt, template, false), Err(expected));
    }

    #[rstest]
    fn prompt_length_is_bounded() {
        let prompt = "p".repeat(PROMPT_MAX + 1);
        assert_eq!(
            GenerationRequest::try_new(&prompt, None, false),
            Err(GenerationValidationError::PromptTooLong { max: PROMPT_MAX })
        );
        let prompt = "p".repeat(PROMPT_MAX);
        assert!(GenerationRequest::try_new(&prompt, None, false).is_ok());
    }

    #[rstest]
    fn template_defaults_to_html() {
        let request = GenerationRequest::try_new(" a clock ", Some(" "), true).expect("valid");
        assert_eq!(request.template().id, "html");
        assert_eq!(request.prompt(), "a clock");
        assert!(request.save());
    }

    #[rstest]
    #[case("gpt-4o", "openai", "gpt-4o")]
    #[case("deepseek:deepseek-chat", "deepseek", "deepseek-chat")]
    #[case(" OpenRouter : meta/llama ", "openrouter", "meta/llama")]
    fn model_specs_parse(#[case] raw: &str, #[case] provider: &str, #[case] model: &str) {
        let spec = ModelSpec::parse(raw).expect("valid spec");
        assert_eq!(spec.provider, provider);
        assert_eq!(spec.model, model);
    }

    #[rstest]
    fn selects_first_configured_model() {
        let prefs = ModelSpec::parse_list("anthropic:claude, ,openai:gpt-4o,openai:gpt-4o-mini");
        assert_eq!(prefs.len(), 3);
        let chosen = select_model(&prefs, |provider| provider == "openai").expect("a model");
        assert_eq!(chosen.model, "gpt-4o");
        assert!(select_model(&prefs, |_| false).is_none());
    }

    #[rstest]
    #[case("```html\n<p>hi</p>\n```", "html", "<p>hi</p>")]
    #[case("```\nplain\n```", "html", "plain")]
    #[case("```JavaScript  \nlet a = 1;\n```", "javascript", "let a = 1;")]
    #[case("  <b>no fence</b>  ", "html", "<b>no fence</b>")]
    fn extracts_code_blocks(#[case] text: &str, #[case] language: &str, #[case] code: &str) {
        let out = extract_code(text, html());
        assert_eq!(out.language, language);
        assert_eq!(out.code, code);
    }

    #[rstest]
    #[case("Description: A clock\n```html\nx\n```", "A clock")]
    #[case("**Description:** Bold\n```html\nx\n```", "Bold")]
    #[case("\n\nJust a line\n```html\nx\n```\ntrailing", "Just a line")]
    #[case("```html\nx\n```\nAfter the fence", "After the fence")]
    #[case("```html\nx\n```", "")]
    fn extracts_descriptions(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(extract_code(text, html()).description, expected);
    }

    #[rstest]
    fn truncates_long_descriptions() {
        let text = format!("Description: {}\n```html\nx\n```", "d".repeat(300));
        let out = extract_code(&text, html());
        assert_eq!(out.description.chars().count(), DESCRIPTION_MAX);
    }

    #[rstest]
    fn only_the_first_fence_is_used() {
        let out = extract_code("```js\nfirst\n```\n```js\nsecond\n```", html());
        assert_eq!(out.code, "first");
    }

    #[rstest]
    fn events_serialise_with_type_tags() {
        let start = GenerationEvent::Start {
            model: "openai:gpt-4o".to_owned(),
            template_id: "html".to_owned(),
        };
        assert_eq!(
            serde_json::to_value(&start).expect("serialises"),
            json!({ "type": "start", "model": "openai:gpt-4o", "templateId": "html" })
        );
        let progress = GenerationEvent::Progress { chunks: 10, characters: 42 };
        assert_eq!(
            serde_json::to_value(&progress).expect("serialises"),
            json!({ "type": "progress", "chunks": 10, "characters": 42 })
        );
    }

    #[rstest]
    fn fragment_omits_missing_saved_path() {
        let fragment = CodeFragment {
            id: Uuid::nil(),
            template_id: "html".to_owned(),
            language: "html".to_owned(),
            file_name: "index.html".to_owned(),
            code: "x".to_owned(),
            description: String::new(),
            saved_path: None,
        };
        let value = serde_json::to_value(GenerationEvent::Complete { fragment }).expect("serialises");
        assert_eq!(value["type"], "complete");
        assert_eq!(value["fragment"]["fileName"], "index.html");
        assert!(value["fragment"].get("savedPath").is_none());
    }
}
