use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::logging::{LogLevel, LogRecord, LogSink};
use crate::outcome::{Absence, Outcome};
use crate::remote::SpeechSynthesizer;

const DEFAULT_AUDIO_EXTENSION: &str = "mp3";

/// Turns finished story text into an audio file on disk.
pub struct NarrationService<'a> {
    audio_dir: PathBuf,
    extension: String,
    sink: &'a dyn LogSink,
}

impl<'a> NarrationService<'a> {
    pub fn new(audio_dir: impl Into<PathBuf>, sink: &'a dyn LogSink) -> Self {
        Self {
            audio_dir: audio_dir.into(),
            extension: DEFAULT_AUDIO_EXTENSION.to_string(),
            sink,
        }
    }

    /// Extension of written files; should match the synthesizer's response format.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        let extension = extension.trim().trim_start_matches('.');
        if !extension.is_empty() {
            self.extension = extension.to_ascii_lowercase();
        }
        self
    }

    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    pub fn narrate<S: SpeechSynthesizer + ?Sized>(
        &self,
        synthesizer: &S,
        text: &str,
    ) -> Outcome<PathBuf> {
        if text.trim().is_empty() {
            return Err(Absence::failed("no text to narrate"));
        }

        let audio = match synthesizer.synthesize(text) {
            Ok(audio) if !audio.is_empty() => audio,
            Ok(_) => {
                self.log(LogLevel::Warn, "speech service returned no audio");
                return Err(Absence::failed("speech service returned no audio"));
            }
            Err(err) => {
                let absence = Absence::from(err);
                self.log(LogLevel::Warn, format!("no narration, {absence}"));
                return Err(absence);
            }
        };

        let path = self.audio_path(Utc::now().timestamp());
        self.write_audio(&path, &audio).map_err(|reason| {
            self.log(LogLevel::Warn, reason.clone());
            Absence::failed(reason)
        })?;

        self.log(
            LogLevel::Info,
            format!("narration written to {}", path.display()),
        );
        Ok(path)
    }

    fn audio_path(&self, timestamp: i64) -> PathBuf {
        self.audio_dir
            .join(format!("story_{timestamp}.{}", self.extension))
    }

    fn write_audio(&self, path: &Path, audio: &[u8]) -> Result<(), String> {
        fs::create_dir_all(&self.audio_dir).map_err(|err| {
            format!(
                "failed to create audio directory `{}`: {err}",
                self.audio_dir.display()
            )
        })?;
        fs::write(path, audio)
            .map_err(|err| format!("failed to write audio `{}`: {err}", path.display()))
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
    use std::io;
    use tempfile::tempdir;

    struct Synth(fn() -> Result<Vec<u8>, RemoteError>);

    impl SpeechSynthesizer for Synth {
        fn synthesize(&self, _text: &str) -> Result<Vec<u8>, RemoteError> {
            (self.0)()
        }
    }

    #[test]
    fn writes_timestamped_file_in_fresh_directory() {
        let temp = tempdir().unwrap();
        let audio_dir = temp.path().join("output_audio");
        let sink = VecLogSink::new();
        let service = NarrationService::new(&audio_dir, &sink);

        let path = service
            .narrate(&Synth(|| Ok(vec![0x49, 0x44, 0x33])), "Once upon a time.")
            .unwrap();

        assert_eq!(path.parent(), Some(audio_dir.as_path()));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("story_"));
        assert!(name.ends_with(".mp3"));
        assert_eq!(fs::read(&path).unwrap(), vec![0x49, 0x44, 0x33]);
    }

    #[test]
    fn extension_follows_configured_format() {
        let sink = VecLogSink::new();
        let service = NarrationService::new("audio", &sink).with_extension(".WAV");
        assert_eq!(service.audio_path(42), PathBuf::from("audio/story_42.wav"));
        assert_eq!(service.audio_dir(), Path::new("audio"));
    }

    #[test]
    fn missing_credentials_are_disabled() {
        let temp = tempdir().unwrap();
        let sink = VecLogSink::new();
        let service = NarrationService::new(temp.path(), &sink);

        let absence = service
            .narrate(
                &Synth(|| {
                    Err(RemoteError::not_configured(io::Error::new(
                        io::ErrorKind::NotFound,
                        "no key",
                    )))
                }),
                "text",
            )
            .unwrap_err();
        assert!(absence.is_disabled());
    }

    #[test]
    fn empty_audio_and_errors_are_failures() {
        let temp = tempdir().unwrap();
        let sink = VecLogSink::new();
        let service = NarrationService::new(temp.path(), &sink);

        assert!(service
            .narrate(&Synth(|| Ok(Vec::new())), "text")
            .unwrap_err()
            .is_failed());
        assert!(service
            .narrate(
                &Synth(|| Err(RemoteError::new(io::Error::new(io::ErrorKind::Other, "429")))),
                "text",
            )
            .unwrap_err()
            .is_failed());
        assert_eq!(sink.count_at(LogLevel::Warn), 2);
    }

    #[test]
    fn unwritable_directory_is_failure() {
        let temp = tempdir().unwrap();
        let blocker = temp.path().join("file");
        fs::write(&blocker, b"x").unwrap();
        let sink = VecLogSink::new();
        let service = NarrationService::new(blocker.join("audio"), &sink);

        let absence = service
            .narrate(&Synth(|| Ok(vec![1, 2, 3])), "text")
            .unwrap_err();
        assert!(absence.is_failed());
    }
}
