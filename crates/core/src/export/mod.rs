use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::ImageFormat;
use thiserror::Error;

use crate::logging::{LogLevel, LogRecord, LogSink};
use crate::remote::{ImageFetcher, RemoteError};

pub mod layout;
mod pdf;

use pdf::{build_document, JpegImage};

const UNTITLED_FILE_STEM: &str = "Untitled_Story";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create export directory `{path}`: {source}")]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("failed to write `{path}`: {source}")]
    WriteFile { path: PathBuf, source: io::Error },
    #[error("failed to render PDF `{path}`: {message}")]
    Pdf { path: PathBuf, message: String },
}

#[derive(Debug, Error)]
enum EmbedError {
    #[error("no image fetcher configured")]
    NoFetcher,
    #[error("download failed: {0}")]
    Fetch(#[from] RemoteError),
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("could not save `{path}`: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("could not read back `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn is_quote(c: char) -> bool {
    matches!(
        c,
        '"' | '\''
            | '`'
            | '\u{2018}'
            | '\u{2019}'
            | '\u{201A}'
            | '\u{201B}'
            | '\u{201C}'
            | '\u{201D}'
            | '\u{201E}'
            | '\u{201F}'
            | '\u{00AB}'
            | '\u{00BB}'
            | '\u{2039}'
            | '\u{203A}'
    )
}

/// Filesystem-safe stem derived from a story title: whitespace becomes `_`,
/// quotes are removed and path separators are neutralised.
pub fn sanitize_title(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .filter(|c| !is_quote(*c))
        .map(|c| {
            if c.is_whitespace() || matches!(c, '/' | '\\') {
                '_'
            } else {
                c
            }
        })
        .collect();

    if stem.trim_matches('_').is_empty() {
        UNTITLED_FILE_STEM.to_string()
    } else {
        stem
    }
}

/// Writes finished stories to text and PDF files under one directory.
pub struct DocumentExporter<'a> {
    export_dir: PathBuf,
    fetcher: Option<&'a dyn ImageFetcher>,
    sink: &'a dyn LogSink,
}

impl<'a> DocumentExporter<'a> {
    pub fn new(export_dir: impl Into<PathBuf>, sink: &'a dyn LogSink) -> Self {
        Self {
            export_dir: export_dir.into(),
            fetcher: None,
            sink,
        }
    }

    pub fn with_image_fetcher(mut self, fetcher: &'a dyn ImageFetcher) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    pub fn export_text(&self, title: &str, body: &str) -> Result<PathBuf, ExportError> {
        self.ensure_dir()?;
        let path = self.artifact_path(title, "txt");
        fs::write(&path, format!("{title}\n\n{body}")).map_err(|source| {
            ExportError::WriteFile {
                path: path.clone(),
                source,
            }
        })?;
        self.log(LogLevel::Info, format!("story text written to {}", path.display()));
        Ok(path)
    }

    pub fn export_pdf(
        &self,
        title: &str,
        body: &str,
        image_url: Option<&str>,
    ) -> Result<PathBuf, ExportError> {
        self.ensure_dir()?;
        let path = self.artifact_path(title, "pdf");

        let image = image_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .and_then(|url| match self.prepare_image(title, url) {
                Ok(image) => Some(image),
                Err(err) => {
                    self.log(
                        LogLevel::Warn,
                        format!("image could not be added to PDF: {err}"),
                    );
                    None
                }
            });

        let mut document =
            build_document(title, body, image.as_ref()).map_err(|err| ExportError::Pdf {
                path: path.clone(),
                message: err.to_string(),
            })?;
        document.save(&path).map_err(|err| ExportError::Pdf {
            path: path.clone(),
            message: err.to_string(),
        })?;

        self.log(LogLevel::Info, format!("story PDF written to {}", path.display()));
        Ok(path)
    }

    fn prepare_image(&self, title: &str, url: &str) -> Result<JpegImage, EmbedError> {
        let fetcher = self.fetcher.ok_or(EmbedError::NoFetcher)?;
        let bytes = fetcher.fetch(url)?;
        let decoded = image::load_from_memory(&bytes).map_err(EmbedError::Decode)?;
        let rgb = decoded.to_rgb8();

        let jpeg_path = self.artifact_path(title, "jpg");
        rgb.save_with_format(&jpeg_path, ImageFormat::Jpeg)
            .map_err(|source| EmbedError::Save {
                path: jpeg_path.clone(),
                source,
            })?;
        let data = fs::read(&jpeg_path).map_err(|source| EmbedError::Read {
            path: jpeg_path.clone(),
            source,
        })?;

        let (width, height) = rgb.dimensions();
        Ok(JpegImage {
            width,
            height,
            data,
        })
    }

    fn artifact_path(&self, title: &str, extension: &str) -> PathBuf {
        self.export_dir
            .join(format!("{}.{extension}", sanitize_title(title)))
    }

    fn ensure_dir(&self) -> Result<(), ExportError> {
        fs::create_dir_all(&self.export_dir).map_err(|source| ExportError::CreateDir {
            path: self.export_dir.clone(),
            source,
        })
    }

    fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.sink.log(LogRecord::new(level, message));
    }
}
