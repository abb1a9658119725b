//! Entity image attach and fetch.

use super::{Document, DocumentError, DocumentResult};
use crate::config::{THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};
use crate::imaging::process_image;
use crate::model::entity::EntityId;
use crate::repo::image_repo::ImageRepository;
use log::info;

impl Document {
    /// Decodes `raw`, stores the QOI re-encoding and its thumbnail, and marks
    /// the entity as imaged.
    ///
    /// First attach inserts the image row and sets the flag in one store
    /// transaction; later attaches overwrite both blobs in place. The store
    /// row decides which, since the cached flag can lag another writer.
    pub fn attach_image(&mut self, entity: EntityId, raw: &[u8]) -> DocumentResult<()> {
        self.require_entity(entity)?;
        let processed = process_image(raw, THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT)?;

        let repo = self.image_repo();
        let replaced = repo.image_exists(entity)?;
        if replaced {
            repo.update_image(entity, &processed.image, &processed.thumbnail)?;
        } else {
            repo.insert_image(entity, &processed.image, &processed.thumbnail)?;
        }

        if let Some(record) = self.entities.get_mut(&entity) {
            record.has_image = true;
        }
        info!(
            "event=image_attach module=document status=ok entity={entity} replaced={replaced} width={} height={} bytes={}",
            processed.width,
            processed.height,
            processed.image.len()
        );
        Ok(())
    }

    /// Full-resolution stored image (QOI).
    pub fn fetch_image(&self, entity: EntityId) -> DocumentResult<Vec<u8>> {
        self.require_imaged(entity)?;
        Ok(self.image_repo().fetch_image(entity)?)
    }

    /// Stored thumbnail (QOI). `entity` doubles as the cache key for callers
    /// that turn thumbnails into textures.
    pub fn fetch_thumbnail(&self, entity: EntityId) -> DocumentResult<Vec<u8>> {
        self.require_imaged(entity)?;
        Ok(self.image_repo().fetch_thumbnail(entity)?)
    }

    fn require_imaged(&self, entity: EntityId) -> DocumentResult<()> {
        if self.require_entity(entity)?.has_image {
            Ok(())
        } else {
            Err(DocumentError::NoImage(entity))
        }
    }
}
