use crate::logging::{LogLevel, LogRecord, LogSink};
use crate::outcome::{Absence, Outcome};
use crate::prompts::PromptRegistry;
use crate::remote::LanguageModel;

mod request;

pub use request::{parse_keywords, Genre, StoryLength, StoryRequest, StoryRequestError, StoryResult};

pub const UNTITLED_STORY: &str = "Untitled Story";
pub const DEFAULT_STORY_PROMPT: &str = "story";
const TITLE_PROMPT: &str = "title";
const TITLE_MAX_TOKENS: u32 = 15;
const TITLE_EXCERPT_CHARS: usize = 500;

/// Token allowance for a story body: one and a half tokens per requested word.
pub fn story_token_budget(target_word_count: u32) -> u32 {
    let budget = u64::from(target_word_count) * 3 / 2;
    u32::try_from(budget).unwrap_or(u32::MAX)
}

fn title_excerpt(body: &str) -> String {
    let mut excerpt: String = body.chars().take(TITLE_EXCERPT_CHARS).collect();
    excerpt.push_str("...");
    excerpt
}

fn is_double_quote(c: char) -> bool {
    matches!(
        c,
        '"' | '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}'
    )
}

fn is_single_quote(c: char) -> bool {
    matches!(
        c,
        '\'' | '`' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2039}' | '\u{203A}'
    )
}

/// Drops double quotes anywhere and single quotes wrapping the title;
/// apostrophes inside words stay.
fn clean_title(raw: &str) -> String {
    let unquoted: String = raw.chars().filter(|c| !is_double_quote(*c)).collect();
    unquoted
        .trim()
        .trim_matches(is_single_quote)
        .trim()
        .to_string()
}

/// Produces a story body and a separate short title from a language model.
pub struct StoryService<'a> {
    prompts: &'a PromptRegistry,
    sink: &'a dyn LogSink,
    story_prompt: String,
}

impl<'a> StoryService<'a> {
    pub fn new(prompts: &'a PromptRegistry, sink: &'a dyn LogSink) -> Self {
        Self {
            prompts,
            sink,
            story_prompt: DEFAULT_STORY_PROMPT.to_string(),
        }
    }

    pub fn with_story_prompt(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !key.trim().is_empty() {
            self.story_prompt = key.trim().to_string();
        }
        self
    }

    pub fn generate<M: LanguageModel + ?Sized>(
        &self,
        model: &M,
        request: &StoryRequest,
    ) -> Outcome<StoryResult> {
        let body = self.generate_body(model, request)?;
        let title = self.generate_title(model, request, &body);
        Ok(StoryResult { title, body })
    }

    fn generate_body<M: LanguageModel + ?Sized>(
        &self,
        model: &M,
        request: &StoryRequest,
    ) -> Outcome<String> {
        let prompt = self
            .prompts
            .format_with(
                &self.story_prompt,
                [
                    ("genre", request.genre().label().to_string()),
                    ("word_count", request.target_word_count().to_string()),
                    ("topic", request.topic().to_string()),
                    ("character_name", request.character_name().to_string()),
                    ("keywords", request.joined_keywords()),
                ],
            )
            .map_err(|err| {
                self.log(LogLevel::Error, format!("failed to render story prompt: {err}"));
                Absence::failed(err.to_string())
            })?;

        let budget = story_token_budget(request.target_word_count());
        self.log(
            LogLevel::Info,
            format!(
                "generating {} story of ~{} words (max_tokens={budget})",
                request.genre(),
                request.target_word_count()
            ),
        );

        match model.invoke(&prompt, budget) {
            Ok(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            Ok(_) => {
                self.log(LogLevel::Error, "story generation returned empty content");
                Err(Absence::failed("language model returned empty content"))
            }
            Err(err) => {
                let absence = Absence::from(err);
                self.log(
                    LogLevel::Error,
                    format!("story generation unavailable, {absence}"),
                );
                Err(absence)
            }
        }
    }

    fn generate_title<M: LanguageModel + ?Sized>(
        &self,
        model: &M,
        request: &StoryRequest,
        body: &str,
    ) -> String {
        let prompt = match self.prompts.format_with(
            TITLE_PROMPT,
            [
                ("genre", request.genre().label().to_string()),
                ("excerpt", title_excerpt(body)),
            ],
        ) {
            Ok(prompt) => prompt,
            Err(err) => {
                self.log(LogLevel::Warn, format!("failed to render title prompt: {err}"));
                return UNTITLED_STORY.to_string();
            }
        };

        match model.invoke(&prompt, TITLE_MAX_TOKENS) {
            Ok(raw) => {
                let title = clean_title(&raw);
                if title.is_empty() {
                    self.log(LogLevel::Warn, "title generation returned empty content");
                    UNTITLED_STORY.to_string()
                } else {
                    title
                }
            }
            Err(err) => {
                self.log(LogLevel::Warn, format!("title generation failed: {err}"));
                UNTITLED_STORY.to_string()
            }
        }
    }

    fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.sink.log(LogRecord::new(level, message));
    }
}
