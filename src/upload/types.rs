use crate::error::{Result, UploadError};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Where the bytes of a selected image live until they are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Memory(Vec<u8>),
}

/// A file picked for upload. Size and MIME type are known up front so the
/// validator never has to read the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedImage {
    pub name: String,
    pub mime_type: Option<&'static str>,
    pub size: u64,
    pub source: ImageSource,
}

impl SelectedImage {
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        Ok(Self {
            mime_type: mime_from_name(&name),
            name,
            size: metadata.len(),
            source: ImageSource::Path(path.to_path_buf()),
        })
    }

    pub fn from_bytes(name: impl Into<String>, content: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            mime_type: mime_from_name(&name),
            size: content.len() as u64,
            name,
            source: ImageSource::Memory(content),
        }
    }

    pub async fn read_content(&self) -> Result<Vec<u8>> {
        match &self.source {
            ImageSource::Memory(bytes) => Ok(bytes.clone()),
            ImageSource::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| UploadError::Read {
                        path: path.clone(),
                        source,
                    })
            }
        }
    }
}

/// MIME type a browser would report for this file name.
pub fn mime_from_name(name: &str) -> Option<&'static str> {
    let (_, ext) = name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Complete,
    Processing,
    #[serde(other)]
    Unknown,
}

/// One step of the transformation pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Original,
    Transition1,
    Transition2,
    Final,
    FullDog,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Original,
        Stage::Transition1,
        Stage::Transition2,
        Stage::Final,
        Stage::FullDog,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Stage::Original => "Original",
            Stage::Transition1 => "Transition",
            Stage::Transition2 => "Transition 2",
            Stage::Final => "Final",
            Stage::FullDog => "Full Dog",
        }
    }
}

/// Which stages an entry needs before it counts as complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageLayout {
    Sequential,
    #[default]
    FullBody,
}

impl StageLayout {
    pub fn stages(&self) -> &'static [Stage] {
        match self {
            StageLayout::Sequential => &[
                Stage::Original,
                Stage::Transition1,
                Stage::Transition2,
                Stage::Final,
            ],
            StageLayout::FullBody => &[
                Stage::Original,
                Stage::Transition1,
                Stage::Final,
                Stage::FullDog,
            ],
        }
    }
}

/// Stage URLs as returned by the server. Missing, `null` and empty values
/// all mean "not generated yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImageSet {
    #[serde(default)]
    pub original: Option<String>,
    #[serde(default)]
    pub transition1: Option<String>,
    #[serde(default)]
    pub transition2: Option<String>,
    #[serde(default, rename = "final")]
    pub final_image: Option<String>,
    #[serde(default)]
    pub full_dog: Option<String>,
}

impl ImageSet {
    pub fn get(&self, stage: Stage) -> Option<&str> {
        let url = match stage {
            Stage::Original => &self.original,
            Stage::Transition1 => &self.transition1,
            Stage::Transition2 => &self.transition2,
            Stage::Final => &self.final_image,
            Stage::FullDog => &self.full_dog,
        };
        url.as_deref().filter(|u| !u.is_empty())
    }

    fn slot_mut(&mut self, stage: Stage) -> &mut Option<String> {
        match stage {
            Stage::Original => &mut self.original,
            Stage::Transition1 => &mut self.transition1,
            Stage::Transition2 => &mut self.transition2,
            Stage::Final => &mut self.final_image,
            Stage::FullDog => &mut self.full_dog,
        }
    }

    pub fn has_all(&self, stages: &[Stage]) -> bool {
        stages.iter().all(|stage| self.get(*stage).is_some())
    }

    pub fn is_empty(&self) -> bool {
        Stage::ALL.iter().all(|stage| self.get(*stage).is_none())
    }

    /// Takes every stage `newer` has; keeps ours where it has none.
    pub fn merge(&mut self, newer: &ImageSet) {
        for stage in Stage::ALL {
            if let Some(url) = newer.get(stage) {
                *self.slot_mut(stage) = Some(url.to_string());
            }
        }
    }
}

/// Body of `POST /upload`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status: Option<ProcessingStatus>,
    #[serde(default)]
    pub breed: Option<String>,
    #[serde(default, deserialize_with = "id_as_string")]
    pub image_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: ImageSet,
    #[serde(default)]
    pub error: Option<String>,
}

impl UploadResult {
    /// Synchronous servers omit `status`; their results are final.
    pub fn is_processing(&self) -> bool {
        self.status == Some(ProcessingStatus::Processing)
    }

    pub fn breed_or_unknown(&self) -> &str {
        self.breed
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or("Unknown")
    }
}

/// Body of `GET /check-status/{image_id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status: Option<ProcessingStatus>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: ImageSet,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn is_complete(&self) -> bool {
        self.status == Some(ProcessingStatus::Complete)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

fn id_as_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(|id| match id {
        RawId::Text(text) => text,
        RawId::Number(n) => n.to_string(),
    }))
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
