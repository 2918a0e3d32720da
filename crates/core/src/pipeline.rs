use std::path::PathBuf;

use thiserror::Error;

use crate::config::{Config, OutputConfig};
use crate::export::{DocumentExporter, ExportError};
use crate::illustration::IllustrationService;
use crate::logging::{LogLevel, LogRecord, LogSink};
use crate::narration::NarrationService;
use crate::outcome::{Absence, Outcome};
use crate::prompts::PromptRegistry;
use crate::remote::{ImageFetcher, ImageGenerator, LanguageModel, SpeechSynthesizer};
use crate::story::{StoryRequest, StoryRequestError, StoryResult, StoryService, DEFAULT_STORY_PROMPT};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    pub generate_image: bool,
    pub generate_speech: bool,
}

impl PipelineOptions {
    pub fn text_only() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            generate_image: true,
            generate_speech: true,
        }
    }
}

/// Best-effort media produced alongside the story text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaAssets {
    pub image_url: Outcome<String>,
    pub audio_file: Outcome<PathBuf>,
}

impl MediaAssets {
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref().ok()
    }

    pub fn audio_file(&self) -> Option<&PathBuf> {
        self.audio_file.as_ref().ok()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportArtifacts {
    pub text_file: PathBuf,
    pub pdf_file: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineResult {
    pub story: StoryResult,
    pub media: MediaAssets,
    pub exports: ExportArtifacts,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid story request: {0}")]
    InvalidRequest(#[from] StoryRequestError),
    #[error("story text unavailable ({0})")]
    StoryUnavailable(Absence),
    #[error(transparent)]
    Export(#[from] ExportError),
}

/// Runs one story request through text, media and export stages in order.
pub struct StoryPipeline<'a> {
    prompts: &'a PromptRegistry,
    sink: &'a dyn LogSink,
    model: &'a dyn LanguageModel,
    image_generator: Option<&'a dyn ImageGenerator>,
    speech_synthesizer: Option<&'a dyn SpeechSynthesizer>,
    image_fetcher: Option<&'a dyn ImageFetcher>,
    output: OutputConfig,
    story_prompt: String,
    audio_extension: Option<String>,
}

impl<'a> StoryPipeline<'a> {
    pub fn new(
        prompts: &'a PromptRegistry,
        model: &'a dyn LanguageModel,
        sink: &'a dyn LogSink,
    ) -> Self {
        Self {
            prompts,
            sink,
            model,
            image_generator: None,
            speech_synthesizer: None,
            image_fetcher: None,
            output: OutputConfig::default(),
            story_prompt: DEFAULT_STORY_PROMPT.to_string(),
            audio_extension: None,
        }
    }

    /// Applies output directories, the story prompt variant and the audio format.
    pub fn with_config(self, config: &Config) -> Self {
        self.with_output(config.output.clone())
            .with_story_prompt(config.prompts.story_template.clone())
            .with_audio_extension(config.speech.response_format.clone())
    }

    pub fn with_output(mut self, output: OutputConfig) -> Self {
        self.output = output;
        self
    }

    pub fn with_story_prompt(mut self, key: impl Into<String>) -> Self {
        self.story_prompt = key.into();
        self
    }

    pub fn with_audio_extension(mut self, extension: impl Into<String>) -> Self {
        self.audio_extension = Some(extension.into());
        self
    }

    pub fn with_image_generator(mut self, generator: &'a dyn ImageGenerator) -> Self {
        self.image_generator = Some(generator);
        self
    }

    pub fn with_speech_synthesizer(mut self, synthesizer: &'a dyn SpeechSynthesizer) -> Self {
        self.speech_synthesizer = Some(synthesizer);
        self
    }

    pub fn with_image_fetcher(mut self, fetcher: &'a dyn ImageFetcher) -> Self {
        self.image_fetcher = Some(fetcher);
        self
    }

    pub fn output(&self) -> &OutputConfig {
        &self.output
    }

    pub fn run(
        &self,
        request: &StoryRequest,
        options: PipelineOptions,
    ) -> Result<PipelineResult, PipelineError> {
        request.validate()?;

        let story = StoryService::new(self.prompts, self.sink)
            .with_story_prompt(self.story_prompt.as_str())
            .generate(self.model, request)
            .map_err(PipelineError::StoryUnavailable)?;
        self.log(LogLevel::Info, format!("story ready: {}", story.title));

        let image_url = self.image_stage(request, options.generate_image);
        let audio_file = self.speech_stage(&story.body, options.generate_speech);

        let mut exporter = DocumentExporter::new(&self.output.stories_dir, self.sink);
        if let Some(fetcher) = self.image_fetcher {
            exporter = exporter.with_image_fetcher(fetcher);
        }
        let text_file = exporter.export_text(&story.title, &story.body)?;
        let pdf_file =
            exporter.export_pdf(&story.title, &story.body, image_url.as_deref().ok())?;

        Ok(PipelineResult {
            story,
            media: MediaAssets {
                image_url,
                audio_file,
            },
            exports: ExportArtifacts {
                text_file,
                pdf_file,
            },
        })
    }

    fn image_stage(&self, request: &StoryRequest, requested: bool) -> Outcome<String> {
        if !requested {
            return Err(Absence::Skipped);
        }
        let generator = self.image_generator.ok_or_else(|| {
            self.log(LogLevel::Warn, "image requested but no generator is available");
            Absence::disabled("no image generator available")
        })?;
        IllustrationService::new(self.prompts, self.sink).illustrate(generator, request)
    }

    fn speech_stage(&self, text: &str, requested: bool) -> Outcome<PathBuf> {
        if !requested {
            return Err(Absence::Skipped);
        }
        let synthesizer = self.speech_synthesizer.ok_or_else(|| {
            self.log(LogLevel::Warn, "speech requested but no synthesizer is available");
            Absence::disabled("no speech synthesizer available")
        })?;
        let mut narration = NarrationService::new(&self.output.audio_dir, self.sink);
        if let Some(extension) = &self.audio_extension {
            narration = narration.with_extension(extension.as_str());
        }
        narration.narrate(synthesizer, text)
    }

    fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.sink.log(LogRecord::new(level, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::VecLogSink;
    use crate::remote::RemoteError;
    use crate::story::Genre;

    struct EchoModel;

    impl LanguageModel for EchoModel {
        fn invoke(&self, _prompt: &str, max_tokens: u32) -> Result<String, RemoteError> {
            Ok(if max_tokens == 15 {
                "Echo".to_string()
            } else {
                "Body".to_string()
            })
        }
    }

    #[test]
    fn invalid_request_stops_before_any_call() {
        let prompts = PromptRegistry::new().unwrap();
        let sink = VecLogSink::new();
        let pipeline = StoryPipeline::new(&prompts, &EchoModel, &sink);

        let request = StoryRequest::new(Genre::Mystery, 200u32, " ", "Sam", ["clue"]);
        let err = pipeline
            .run(&request, PipelineOptions::text_only())
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidRequest(StoryRequestError::MissingTopic)
        ));
        assert!(sink.records().is_empty());
    }

    #[test]
    fn config_selects_directories_and_prompt() {
        let prompts = PromptRegistry::new().unwrap();
        let sink = VecLogSink::new();
        let mut config = Config::default();
        config.output.stories_dir = PathBuf::from("stories");
        config.prompts.story_template = "story_exact".into();

        let pipeline = StoryPipeline::new(&prompts, &EchoModel, &sink).with_config(&config);
        assert_eq!(pipeline.output().stories_dir, PathBuf::from("stories"));
        assert_eq!(pipeline.story_prompt, "story_exact");
        assert_eq!(pipeline.audio_extension.as_deref(), Some("mp3"));
    }

    #[test]
    fn media_accessors_hide_absences() {
        let media = MediaAssets {
            image_url: Ok("https://img.example.com/a.png".into()),
            audio_file: Err(Absence::Skipped),
        };
        assert_eq!(media.image_url(), Some("https://img.example.com/a.png"));
        assert!(media.audio_file().is_none());
    }
}
