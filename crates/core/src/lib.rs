pub mod config;
pub mod export;
pub mod illustration;
pub mod logging;
pub mod narration;
pub mod outcome;
pub mod pipeline;
pub mod prompts;
pub mod remote;
pub mod story;

pub use config::{
    Config, ConfigError, ConfigStore, ImageConfig, LlmConfig, OutputConfig, PromptConfig,
    SpeechConfig,
};
pub use export::{sanitize_title, DocumentExporter, ExportError};
pub use illustration::IllustrationService;
pub use logging::{
    FacadeLogSink, LogLevel, LogRecord, LogSink, NullLogSink, StdoutLogSink,
    VecLogSink,
};
pub use narration::NarrationService;
pub use outcome::{Absence, Outcome};
pub use pipeline::{
    ExportArtifacts, MediaAssets, PipelineError, PipelineOptions, PipelineResult, StoryPipeline,
};
pub use prompts::{
    PromptArguments, PromptError, PromptMetadata, PromptRegistry, PromptSource, PromptTemplate,
};
pub use remote::{
    ImageFetcher, ImageGenerator, LanguageModel, RemoteError, RemoteErrorKind, SpeechSynthesizer,
};
pub use story::{
    parse_keywords, Genre, StoryLength, StoryRequest, StoryRequestError, StoryResult,
    StoryService, UNTITLED_STORY,
};
