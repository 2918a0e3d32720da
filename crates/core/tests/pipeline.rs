use std::collections::VecDeque;
use std::fs;
use std::io;
use std::sync::Mutex;

use story_core::{
    parse_keywords, Absence, Genre, ImageFetcher, ImageGenerator, LanguageModel, LogLevel,
    OutputConfig, PipelineError, PipelineOptions, PromptRegistry, RemoteError, SpeechSynthesizer,
    StoryLength, StoryPipeline, StoryRequest, VecLogSink,
};
use tempfile::tempdir;

struct MockLanguageModel {
    responses: Mutex<VecDeque<Result<String, RemoteError>>>,
    budgets: Mutex<Vec<u32>>,
}

impl MockLanguageModel {
    fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::scripted(responses.into_iter().map(|r| Ok(r.into())))
    }

    fn scripted<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Result<String, RemoteError>>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            budgets: Mutex::new(Vec::new()),
        }
    }

    fn budgets(&self) -> Vec<u32> {
        self.budgets.lock().expect("mock mutex poisoned").clone()
    }
}

impl LanguageModel for MockLanguageModel {
    fn invoke(&self, _prompt: &str, max_tokens: u32) -> Result<String, RemoteError> {
        self.budgets
            .lock()
            .expect("mock mutex poisoned")
            .push(max_tokens);
        let mut guard = self.responses.lock().expect("mock mutex poisoned");
        guard.pop_front().unwrap_or_else(|| {
            Err(RemoteError::new(io::Error::new(
                io::ErrorKind::Other,
                "mock language model has no remaining responses",
            )))
        })
    }
}

struct FixedImage(&'static str);

impl ImageGenerator for FixedImage {
    fn generate_image(&self, _prompt: &str) -> Result<String, RemoteError> {
        Ok(self.0.to_string())
    }
}

struct UnconfiguredImage;

impl ImageGenerator for UnconfiguredImage {
    fn generate_image(&self, _prompt: &str) -> Result<String, RemoteError> {
        Err(RemoteError::not_configured(io::Error::new(
            io::ErrorKind::NotFound,
            "image endpoint not configured",
        )))
    }
}

struct FixedAudio;

impl SpeechSynthesizer for FixedAudio {
    fn synthesize(&self, text: &str) -> Result<Vec<u8>, RemoteError> {
        Ok(text.as_bytes().to_vec())
    }
}

struct FailingFetcher;

impl ImageFetcher for FailingFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, RemoteError> {
        Err(RemoteError::new(io::Error::new(
            io::ErrorKind::Other,
            format!("GET {url} returned 403"),
        )))
    }
}

fn knight_request() -> StoryRequest {
    StoryRequest::new(
        Genre::Fantasy,
        StoryLength::Small,
        "knight's journey",
        "Alex",
        parse_keywords("castle, dragon, treasure"),
    )
}

const STORY_BODY: &str = "Alex rode toward the castle at dawn.\n\n\
The dragon slept upon a hill of treasure, and the knight drew a breath.";

#[test]
fn text_only_run_exports_text_and_pdf() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let output = OutputConfig {
        stories_dir: temp.path().join("output_stories"),
        audio_dir: temp.path().join("output_audio"),
    };
    let prompts = PromptRegistry::new()?;
    let sink = VecLogSink::new();
    let model = MockLanguageModel::new([STORY_BODY, "\"The Knight's Journey\""]);

    let pipeline = StoryPipeline::new(&prompts, &model, &sink).with_output(output.clone());
    let result = pipeline.run(&knight_request(), PipelineOptions::text_only())?;

    assert_eq!(result.story.title, "The Knight's Journey");
    assert_eq!(result.story.body, STORY_BODY);
    assert_eq!(model.budgets(), vec![300, 15]);

    assert_eq!(result.media.image_url, Err(Absence::Skipped));
    assert_eq!(result.media.audio_file, Err(Absence::Skipped));
    assert!(!output.audio_dir.exists());

    let text_file = &result.exports.text_file;
    assert_eq!(text_file, &output.stories_dir.join("The_Knights_Journey.txt"));
    let exported = fs::read_to_string(text_file)?;
    assert_eq!(exported, format!("The Knight's Journey\n\n{STORY_BODY}"));

    let pdf_file = &result.exports.pdf_file;
    assert_eq!(pdf_file, &output.stories_dir.join("The_Knights_Journey.pdf"));
    let document = lopdf::Document::load(pdf_file)?;
    assert_eq!(document.get_pages().len(), 1);
    Ok(())
}

#[test]
fn all_media_stages_run_when_wired() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let output = OutputConfig {
        stories_dir: temp.path().join("stories"),
        audio_dir: temp.path().join("audio"),
    };
    let prompts = PromptRegistry::new()?;
    let sink = VecLogSink::new();
    let model = MockLanguageModel::new([STORY_BODY, "Dragonfall"]);
    let image = FixedImage("https://img.example.com/dragon.png");
    let fetcher = FailingFetcher;

    let pipeline = StoryPipeline::new(&prompts, &model, &sink)
        .with_output(output.clone())
        .with_image_generator(&image)
        .with_speech_synthesizer(&FixedAudio)
        .with_image_fetcher(&fetcher);
    let result = pipeline.run(&knight_request(), PipelineOptions::all())?;

    assert_eq!(
        result.media.image_url(),
        Some("https://img.example.com/dragon.png")
    );
    let audio = result.media.audio_file().expect("audio file");
    assert!(audio.starts_with(&output.audio_dir));
    assert_eq!(fs::read_to_string(audio)?, STORY_BODY);

    // the image download failed, so the PDF is text-only
    assert!(result.exports.pdf_file.exists());
    assert!(!output.stories_dir.join("Dragonfall.jpg").exists());
    assert!(sink.count_at(LogLevel::Warn) >= 1);
    Ok(())
}

#[test]
fn requested_media_without_collaborators_is_disabled() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let prompts = PromptRegistry::new()?;
    let sink = VecLogSink::new();
    let model = MockLanguageModel::new([STORY_BODY, "Quiet Hills"]);

    let pipeline = StoryPipeline::new(&prompts, &model, &sink).with_output(OutputConfig {
        stories_dir: temp.path().join("stories"),
        audio_dir: temp.path().join("audio"),
    });
    let result = pipeline.run(&knight_request(), PipelineOptions::all())?;

    assert!(result.media.image_url.as_ref().unwrap_err().is_disabled());
    assert!(result.media.audio_file.as_ref().unwrap_err().is_disabled());
    assert!(result.exports.text_file.exists());
    Ok(())
}

#[test]
fn unconfigured_image_service_is_reported_as_disabled() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let prompts = PromptRegistry::new()?;
    let sink = VecLogSink::new();
    let model = MockLanguageModel::new([STORY_BODY, "Quiet Hills"]);

    let pipeline = StoryPipeline::new(&prompts, &model, &sink)
        .with_output(OutputConfig {
            stories_dir: temp.path().join("stories"),
            audio_dir: temp.path().join("audio"),
        })
        .with_image_generator(&UnconfiguredImage);
    let options = PipelineOptions {
        generate_image: true,
        generate_speech: false,
    };
    let result = pipeline.run(&knight_request(), options)?;

    let absence = result.media.image_url.unwrap_err();
    assert!(absence.is_disabled());
    assert_eq!(absence.reason(), "image endpoint not configured");
    assert_eq!(result.media.audio_file, Err(Absence::Skipped));
    Ok(())
}

#[test]
fn missing_story_text_exports_nothing() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let stories_dir = temp.path().join("stories");
    let prompts = PromptRegistry::new()?;
    let sink = VecLogSink::new();
    let model = MockLanguageModel::scripted([Err(RemoteError::new(io::Error::new(
        io::ErrorKind::TimedOut,
        "request timed out",
    )))]);

    let pipeline = StoryPipeline::new(&prompts, &model, &sink).with_output(OutputConfig {
        stories_dir: stories_dir.clone(),
        audio_dir: temp.path().join("audio"),
    });
    let err = pipeline
        .run(&knight_request(), PipelineOptions::all())
        .unwrap_err();

    match err {
        PipelineError::StoryUnavailable(absence) => assert!(absence.is_failed()),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!stories_dir.exists());
    assert_eq!(model.budgets().len(), 1);
    Ok(())
}

#[test]
fn untitled_story_still_exports() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempdir()?;
    let prompts = PromptRegistry::new()?;
    let sink = VecLogSink::new();
    let model = MockLanguageModel::new([STORY_BODY]);

    let pipeline = StoryPipeline::new(&prompts, &model, &sink).with_output(OutputConfig {
        stories_dir: temp.path().to_path_buf(),
        audio_dir: temp.path().join("audio"),
    });
    let result = pipeline.run(&knight_request(), PipelineOptions::text_only())?;

    assert_eq!(result.story.title, story_core::UNTITLED_STORY);
    assert!(temp.path().join("Untitled_Story.txt").exists());
    assert!(temp.path().join("Untitled_Story.pdf").exists());
    Ok(())
}
