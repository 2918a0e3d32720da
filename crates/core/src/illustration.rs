use crate::logging::{LogLevel, LogRecord, LogSink};
use crate::outcome::{Absence, Outcome};
use crate::prompts::{PromptError, PromptRegistry};
use crate::remote::ImageGenerator;
use crate::story::StoryRequest;

const IMAGE_SCENE_PROMPT: &str = "image_scene";

pub struct IllustrationService<'a> {
    prompts: &'a PromptRegistry,
    sink: &'a dyn LogSink,
}

impl<'a> IllustrationService<'a> {
    pub fn new(prompts: &'a PromptRegistry, sink: &'a dyn LogSink) -> Self {
        Self { prompts, sink }
    }

    pub fn scene_prompt(&self, request: &StoryRequest) -> Result<String, PromptError> {
        self.prompts.format_with(
            IMAGE_SCENE_PROMPT,
            [
                ("genre", request.genre().label().to_lowercase()),
                ("topic", request.topic().to_string()),
                ("keywords", request.joined_keywords()),
            ],
        )
    }

    /// Returns the URL of an illustration for the request.
    pub fn illustrate<G: ImageGenerator + ?Sized>(
        &self,
        generator: &G,
        request: &StoryRequest,
    ) -> Outcome<String> {
        let prompt = self.scene_prompt(request).map_err(|err| {
            self.log(LogLevel::Warn, format!("failed to render image prompt: {err}"));
            Absence::failed(err.to_string())
        })?;

        match generator.generate_image(&prompt) {
            Ok(url) if !url.trim().is_empty() => {
                self.log(LogLevel::Info, "illustration generated");
                Ok(url.trim().to_string())
            }
            Ok(_) => {
                self.log(LogLevel::Warn, "image service returned an empty URL");
                Err(Absence::failed("image service returned an empty URL"))
            }
            Err(err) => {
                let absence = Absence::from(err);
                self.log(LogLevel::Warn, format!("no illustration, {absence}"));
                Err(absence)
            }
        }
    }

    fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.sink.log(LogRecord::new(level, message));
    }
}
