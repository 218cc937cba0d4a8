//! Image and style-model bookkeeping on top of the oracles and a repository.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::foundation::error::{ReelError, ReelResult};
use crate::job::repository::{ImageRecord, Repository, StyleModelRecord};
use crate::job::request::ReelImage;
use crate::oracle::{
    AestheticOracle, EmotionOracle, ImageSynthesisOracle, TaggingOracle, analyze_or_neutral,
};

/// Number of tags stored per image.
pub const TAGS_PER_IMAGE: usize = 5;

/// Oracles used to annotate an ingested image.
#[derive(Clone)]
pub struct Annotators {
    /// Emotion classifier; failures fall back to neutral.
    pub emotion: Arc<dyn EmotionOracle>,
    /// Aesthetic scorer; failures leave the score empty.
    pub aesthetic: Arc<dyn AestheticOracle>,
    /// Semantic tagger; failures leave the tags empty.
    pub tagging: Arc<dyn TaggingOracle>,
}

/// Photo and style-model catalogue.
pub struct Catalog {
    annotators: Annotators,
    images: Arc<dyn Repository<ImageRecord>>,
    styles: Arc<dyn Repository<StyleModelRecord>>,
}

impl Catalog {
    /// Catalogue backed by the given repositories.
    pub fn new(
        annotators: Annotators,
        images: Arc<dyn Repository<ImageRecord>>,
        styles: Arc<dyn Repository<StyleModelRecord>>,
    ) -> Self {
        Self {
            annotators,
            images,
            styles,
        }
    }

    /// Decode `path`, annotate it and store an [`ImageRecord`].
    ///
    /// Only an undecodable image is an error; oracle failures degrade the annotations.
    #[tracing::instrument(skip_all, fields(path = %path.display()))]
    pub fn ingest_image(&self, path: &Path) -> ReelResult<Arc<ImageRecord>> {
        let image = image::open(path)
            .map_err(|e| ReelError::input(format!("cannot decode '{}': {e}", path.display())))?;

        let emotion = analyze_or_neutral(self.annotators.emotion.as_ref(), &image);
        let aesthetic_score = match self.annotators.aesthetic.score(&image) {
            Ok(score) => Some(score.clamp(0.0, 1.0)),
            Err(e) => {
                warn!(error = %e, "aesthetic scoring failed");
                None
            }
        };
        let tags = match self.annotators.tagging.tags(&image, TAGS_PER_IMAGE) {
            Ok(mut tags) => {
                tags.sort_by(|a, b| b.relevance.total_cmp(&a.relevance));
                tags.truncate(TAGS_PER_IMAGE);
                tags
            }
            Err(e) => {
                warn!(error = %e, "tagging failed");
                Vec::new()
            }
        };

        let record = self.images.create(ImageRecord {
            id: 0,
            path: path.to_path_buf(),
            emotion,
            aesthetic_score,
            tags,
            created_at: Utc::now(),
        })?;
        info!(id = record.id, emotion = %record.emotion.emotion, "image catalogued");
        Ok(record)
    }

    /// Train a style model on `samples` and store its handle.
    #[tracing::instrument(skip_all, fields(name = name))]
    pub fn register_style_model(
        &self,
        synthesis: &dyn ImageSynthesisOracle,
        name: &str,
        samples: &[&Path],
        prompt: &str,
        epochs: u32,
    ) -> ReelResult<Arc<StyleModelRecord>> {
        if samples.is_empty() {
            return Err(ReelError::input("style model needs at least one sample"));
        }
        if epochs == 0 {
            return Err(ReelError::input("epochs must be > 0"));
        }
        let images = samples
            .iter()
            .map(|p| {
                image::open(p)
                    .map_err(|e| ReelError::input(format!("cannot decode '{}': {e}", p.display())))
            })
            .collect::<ReelResult<Vec<_>>>()?;

        let handle = synthesis.train(&images, prompt, epochs)?;
        let record = self.styles.create(StyleModelRecord {
            id: 0,
            name: name.to_owned(),
            prompt: prompt.to_owned(),
            epochs,
            sample_count: images.len(),
            handle,
            created_at: Utc::now(),
        })?;
        info!(id = record.id, "style model registered");
        Ok(record)
    }

    /// Catalogued images as reel inputs, in ingestion order.
    pub fn reel_images(&self) -> ReelResult<Vec<ReelImage>> {
        Ok(self
            .images
            .list()?
            .iter()
            .map(|r| {
                ReelImage::new(&r.path).with_emotion(r.emotion.emotion, Some(r.emotion.intensity))
            })
            .collect())
    }
}

#[cfg(test)]
#[path = "../tests/unit/catalog.rs"]
mod tests;
