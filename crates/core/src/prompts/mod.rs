use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::PromptConfig;

const BUILT_IN_PROMPTS: &str = include_str!("../../prompts/default.toml");

pub type PromptArguments = HashMap<String, String>;

/// Where a prompt definition was loaded from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptSource {
    BuiltIn,
    File(PathBuf),
}

impl PromptSource {
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::BuiltIn)
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::BuiltIn => None,
            Self::File(path) => Some(path.as_path()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PromptMetadata {
    description: Option<String>,
    source: PromptSource,
}

impl PromptMetadata {
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn source(&self) -> &PromptSource {
        &self.source
    }
}

/// A parsed prompt: literal text interleaved with `{name}` slots.
#[derive(Clone, Debug)]
pub struct PromptTemplate {
    name: String,
    pieces: Vec<Piece>,
    required: BTreeSet<String>,
    metadata: PromptMetadata,
}

impl PromptTemplate {
    /// Arguments that must be supplied to `render`, sorted by name.
    pub fn required_arguments(&self) -> impl Iterator<Item = &str> {
        self.required.iter().map(String::as_str)
    }

    pub fn metadata(&self) -> &PromptMetadata {
        &self.metadata
    }

    /// Slots without a matching argument render as empty text unless they
    /// are required.
    pub fn render(&self, arguments: &PromptArguments) -> Result<String, PromptError> {
        if let Some(missing) = self.required.iter().find(|arg| !arguments.contains_key(*arg)) {
            return Err(PromptError::MissingArgument {
                prompt: self.name.clone(),
                argument: missing.clone(),
            });
        }

        Ok(self
            .pieces
            .iter()
            .map(|piece| match piece {
                Piece::Text(text) => text.as_str(),
                Piece::Slot(name) => arguments.get(name).map_or("", String::as_str),
            })
            .collect())
    }

    pub fn render_with<I, K, V>(&self, arguments: I) -> Result<String, PromptError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let arguments: PromptArguments = arguments
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.render(&arguments)
    }

    fn compile(name: String, raw: RawPrompt, source: PromptSource) -> Result<Self, PromptError> {
        let pieces = split_template(&raw.template);
        let slots: BTreeSet<String> = pieces
            .iter()
            .filter_map(|piece| match piece {
                Piece::Slot(slot) => Some(slot.clone()),
                Piece::Text(_) => None,
            })
            .collect();

        let required = if raw.required.is_empty() {
            slots
        } else {
            raw.required
                .iter()
                .map(|argument| {
                    let argument = argument.trim();
                    if slots.contains(argument) {
                        Ok(argument.to_string())
                    } else {
                        Err(PromptError::InvalidRequired {
                            prompt: name.clone(),
                            argument: argument.to_string(),
                        })
                    }
                })
                .collect::<Result<_, _>>()?
        };

        Ok(Self {
            name,
            pieces,
            required,
            metadata: PromptMetadata {
                description: raw.description,
                source,
            },
        })
    }
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt `{0}` not found")]
    NotFound(String),
    #[error("prompt `{prompt}` needs argument `{argument}`")]
    MissingArgument { prompt: String, argument: String },
    #[error("failed to read prompt file `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("built-in prompt definitions are malformed: {0}")]
    ParseBuiltIn(toml::de::Error),
    #[error("failed to parse prompt file `{path}` as TOML: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to parse prompt file `{path}` as YAML: {source}")]
    ParseYaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("prompt `{prompt}` declares required argument `{argument}` that never appears in its text")]
    InvalidRequired { prompt: String, argument: String },
}

/// Story, title and illustration prompts keyed by name. Built-in definitions
/// load first; files in custom directories override them by key.
#[derive(Debug)]
pub struct PromptRegistry {
    prompts: BTreeMap<String, PromptTemplate>,
    directories: Vec<PathBuf>,
}

impl PromptRegistry {
    pub fn new() -> Result<Self, PromptError> {
        Self::from_prompt_config(&PromptConfig::default())
    }

    pub fn from_prompt_config(config: &PromptConfig) -> Result<Self, PromptError> {
        Self::load(config.custom_directories.clone())
    }

    pub fn with_custom_directories<P: AsRef<Path>>(directories: &[P]) -> Result<Self, PromptError> {
        Self::load(
            directories
                .iter()
                .map(|dir| dir.as_ref().to_path_buf())
                .collect(),
        )
    }

    pub fn custom_directories(&self) -> &[PathBuf] {
        &self.directories
    }

    /// Re-reads the built-in set and every custom directory.
    pub fn reload(&mut self) -> Result<(), PromptError> {
        let mut prompts = BTreeMap::new();
        let built_in: PromptDocument =
            toml::from_str(BUILT_IN_PROMPTS).map_err(PromptError::ParseBuiltIn)?;
        compile_into(&mut prompts, built_in, &PromptSource::BuiltIn)?;
        for dir in &self.directories {
            load_directory(dir, &mut prompts)?;
        }
        self.prompts = prompts;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.prompts.get(name)
    }

    pub fn format(&self, name: &str, arguments: &PromptArguments) -> Result<String, PromptError> {
        self.require(name)?.render(arguments)
    }

    pub fn format_with<I, K, V>(&self, name: &str, arguments: I) -> Result<String, PromptError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.require(name)?.render_with(arguments)
    }

    fn require(&self, name: &str) -> Result<&PromptTemplate, PromptError> {
        self.get(name)
            .ok_or_else(|| PromptError::NotFound(name.to_string()))
    }

    fn load(directories: Vec<PathBuf>) -> Result<Self, PromptError> {
        let mut registry = Self {
            prompts: BTreeMap::new(),
            directories,
        };
        registry.reload()?;
        Ok(registry)
    }
}

fn compile_into(
    prompts: &mut BTreeMap<String, PromptTemplate>,
    document: PromptDocument,
    source: &PromptSource,
) -> Result<(), PromptError> {
    for (name, raw) in document.prompts {
        let template = PromptTemplate::compile(name.clone(), raw, source.clone())?;
        prompts.insert(name, template);
    }
    Ok(())
}

/// Loads `.toml`, `.yaml` and `.yml` files in name order. A missing
/// directory contributes nothing.
fn load_directory(
    dir: &Path,
    prompts: &mut BTreeMap<String, PromptTemplate>,
) -> Result<(), PromptError> {
    if !dir.is_dir() {
        return Ok(());
    }

    let io_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| PromptError::Io { path, source }
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        if entry.file_type().map_err(io_error(&path))?.is_file() {
            files.push(path);
        }
    }
    files.sort();

    for path in files {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let document: PromptDocument = match extension.as_deref() {
            Some("toml") => {
                let contents = fs::read_to_string(&path).map_err(io_error(&path))?;
                toml::from_str(&contents).map_err(|source| PromptError::ParseToml {
                    path: path.clone(),
                    source,
                })?
            }
            Some("yaml" | "yml") => {
                let contents = fs::read_to_string(&path).map_err(io_error(&path))?;
                serde_yaml::from_str(&contents).map_err(|source| PromptError::ParseYaml {
                    path: path.clone(),
                    source,
                })?
            }
            _ => continue,
        };
        compile_into(prompts, document, &PromptSource::File(path))?;
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct PromptDocument {
    #[serde(default)]
    prompts: BTreeMap<String, RawPrompt>,
}

#[derive(Debug, Deserialize)]
struct RawPrompt {
    #[serde(alias = "text")]
    template: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    required: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Piece {
    Text(String),
    Slot(String),
}

/// `{{` and `}}` are literal braces, `{}` stays as written and an unclosed
/// `{` is kept as text.
fn split_template(template: &str) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut text = String::new();
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        text.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            text.push_str(&tail[..1]);
            rest = &tail[2..];
        } else if tail.starts_with('}') {
            text.push('}');
            rest = &tail[1..];
        } else if let Some(close) = tail.find('}') {
            let name = tail[1..close].trim();
            if name.is_empty() {
                text.push_str("{}");
            } else {
                if !text.is_empty() {
                    pieces.push(Piece::Text(std::mem::take(&mut text)));
                }
                pieces.push(Piece::Slot(name.to_string()));
            }
            rest = &tail[close + 1..];
        } else {
            text.push_str(tail);
            rest = "";
        }
    }

    text.push_str(rest);
    if !text.is_empty() {
        pieces.push(Piece::Text(text));
    }
    pieces
}
