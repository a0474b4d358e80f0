use crate::upload::{ImageSet, Stage, StageLayout, UploadResult};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// How entries that are still missing stages are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Show the entry with a "Processing…" slot per missing stage.
    #[default]
    Placeholder,
    /// Hide the entry until every stage is present.
    CompleteOnly,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryStatus {
    Processing,
    Complete,
    /// The server finished but some required stages never arrived.
    Incomplete,
    TimedOut { attempts: u32 },
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StageSlot<'a> {
    pub number: usize,
    pub stage: Stage,
    pub url: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct GalleryEntry {
    pub key: u64,
    pub image_id: Option<String>,
    pub breed: String,
    pub images: ImageSet,
    pub status: EntryStatus,
    pub uploaded_at: DateTime<Local>,
}

impl GalleryEntry {
    /// The layout's stages plus any other stage the server sent, in
    /// pipeline order. Only layout stages can be empty.
    pub fn slots(&self, layout: StageLayout) -> Vec<StageSlot<'_>> {
        let required = layout.stages();
        Stage::ALL
            .iter()
            .filter(|stage| required.contains(*stage) || self.images.get(**stage).is_some())
            .enumerate()
            .map(|(i, stage)| StageSlot {
                number: i + 1,
                stage: *stage,
                url: self.images.get(*stage),
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.status == EntryStatus::Complete
    }
}

/// Uploaded entries, newest first.
#[derive(Debug, Default)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
    layout: StageLayout,
    next_key: u64,
}

impl Gallery {
    pub fn new(layout: StageLayout) -> Self {
        Self {
            entries: Vec::new(),
            layout,
            next_key: 0,
        }
    }

    pub fn layout(&self) -> StageLayout {
        self.layout
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn add_upload(&mut self, result: &UploadResult) -> u64 {
        let key = self.next_key;
        self.next_key += 1;

        let mut entry = GalleryEntry {
            key,
            image_id: result.image_id.clone(),
            breed: result.breed_or_unknown().to_string(),
            images: result.images.clone(),
            status: EntryStatus::Processing,
            uploaded_at: Local::now(),
        };
        if !result.is_processing() {
            Self::settle(&mut entry, self.layout);
        }

        self.entries.insert(0, entry);
        key
    }

    pub fn apply_progress(&mut self, image_id: &str, images: &ImageSet) {
        if let Some(entry) = self.find_pending(image_id) {
            entry.images.merge(images);
        }
    }

    pub fn mark_complete(&mut self, image_id: &str, images: &ImageSet) {
        let layout = self.layout;
        if let Some(entry) = self.find_pending(image_id) {
            entry.images.merge(images);
            Self::settle(entry, layout);
        }
    }

    pub fn mark_timed_out(&mut self, image_id: &str, attempts: u32) {
        if let Some(entry) = self.find_pending(image_id) {
            entry.status = EntryStatus::TimedOut { attempts };
        }
    }

    pub fn mark_failed(&mut self, image_id: &str, message: &str) {
        if let Some(entry) = self.find_pending(image_id) {
            entry.status = EntryStatus::Failed(message.to_string());
        }
    }

    pub fn visible(&self, mode: RenderMode) -> impl Iterator<Item = &GalleryEntry> {
        self.entries
            .iter()
            .filter(move |entry| mode == RenderMode::Placeholder || entry.is_complete())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn find_pending(&mut self, image_id: &str) -> Option<&mut GalleryEntry> {
        let entry = self.entries.iter_mut().find(|entry| {
            entry.status == EntryStatus::Processing && entry.image_id.as_deref() == Some(image_id)
        });
        if entry.is_none() {
            log::debug!("No processing gallery entry for '{}'", image_id);
        }
        entry
    }

    fn settle(entry: &mut GalleryEntry, layout: StageLayout) {
        entry.status = if entry.images.has_all(layout.stages()) {
            EntryStatus::Complete
        } else {
            log::warn!(
                "Entry for '{}' finished without all {:?} stages",
                entry.breed,
                layout
            );
            EntryStatus::Incomplete
        };
    }
}
