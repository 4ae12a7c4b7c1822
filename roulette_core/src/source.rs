use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use roulette_shared::Image;
use tracing::{debug, warn};

use crate::{
    elimination::EliminationTracker,
    error::{CatalogError, CoreError},
    item::{Item, ItemSet},
};

pub const DEMO_ITEM_COUNT: u32 = 40;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceId {
    Demo,
    Folder(String),
}

impl FromStr for SourceId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "" | "demo" => SourceId::Demo,
            id => SourceId::Folder(id.to_string()),
        })
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceId::Demo => f.write_str("demo"),
            SourceId::Folder(id) => f.write_str(id),
        }
    }
}

/// Read side of the image/folder store.
#[allow(async_fn_in_trait)]
pub trait ImageCatalog {
    async fn list_images(&self, folder_id: &str) -> Result<Vec<Image>, CatalogError>;
}

/// Catalog for demo-only sessions; every folder lookup fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCatalog;

impl ImageCatalog for NoCatalog {
    async fn list_images(&self, folder_id: &str) -> Result<Vec<Image>, CatalogError> {
        Err(CatalogError::Fetch(format!("no catalog for folder {folder_id}")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fallback {
    EmptyFolder,
    /// Every image of the folder has been eliminated.
    Exhausted,
    FetchFailed(String),
}

/// Result of one asset load.
#[derive(Debug, Clone)]
pub struct Loaded {
    /// Source the items actually came from.
    pub source: SourceId,
    pub items: ItemSet,
    pub fallback: Option<Fallback>,
    /// Folder and demo items were all eliminated, so the elimination set
    /// was cleared.
    pub round_reset: bool,
}

pub struct AssetSource<C> {
    catalog: C,
    demo_count: u32,
}

impl<C: ImageCatalog> AssetSource<C> {
    pub fn new(catalog: C) -> Self {
        Self {
            catalog,
            demo_count: DEMO_ITEM_COUNT,
        }
    }

    pub fn with_demo_count(mut self, demo_count: u32) -> Self {
        self.demo_count = demo_count;
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Loads the items of `source` still in play.
    ///
    /// Folder failures, empty folders and fully eliminated folders fall back
    /// to the demo set. When the demo set is exhausted too, the round is over:
    /// the tracker is cleared and the full demo set is returned.
    pub async fn load(
        &self,
        source: &SourceId,
        eliminated: &mut EliminationTracker,
    ) -> Result<Loaded, CoreError> {
        let (mut effective, mut fallback, candidates) = self.candidates(source).await?;
        let mut active = eliminated.retain_active(candidates);
        if active.is_empty() && effective != SourceId::Demo {
            warn!(folder = %effective, "every folder item eliminated, switching to demo");
            fallback = Some(Fallback::Exhausted);
            effective = SourceId::Demo;
            active = eliminated.retain_active(self.demo_items()?);
        }

        let round_reset = active.is_empty();
        if round_reset {
            warn!("every item eliminated, starting a new round");
            eliminated.clear();
            active = self.demo_items()?;
        }
        let items = ItemSet::new(active)?;
        debug!(source = %effective, items = items.len(), "assets loaded");

        Ok(Loaded {
            source: effective,
            items,
            fallback,
            round_reset,
        })
    }

    /// Unfiltered, non-empty candidates plus the source they came from.
    async fn candidates(
        &self,
        source: &SourceId,
    ) -> Result<(SourceId, Option<Fallback>, Vec<Item>), CoreError> {
        let folder_id = match source {
            SourceId::Demo => return Ok((SourceId::Demo, None, self.demo_items()?)),
            SourceId::Folder(id) => id,
        };
        let fallback = match self.catalog.list_images(folder_id).await {
            Ok(images) if images.is_empty() => {
                warn!(folder = %folder_id, "folder is empty, switching to demo");
                Fallback::EmptyFolder
            }
            Ok(images) => {
                let items = images
                    .into_iter()
                    .map(|img| Item::image(img.id, img.url))
                    .collect();
                return Ok((source.clone(), None, items));
            }
            Err(err) => {
                warn!(folder = %folder_id, error = %err, "asset fetch failed, switching to demo");
                Fallback::FetchFailed(err.to_string())
            }
        };
        Ok((SourceId::Demo, Some(fallback), self.demo_items()?))
    }

    fn demo_items(&self) -> Result<Vec<Item>, CoreError> {
        if self.demo_count == 0 {
            return Err(CoreError::EmptyDemoSource);
        }
        Ok((1..=self.demo_count).map(Item::demo).collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::item::ItemKey;
    use std::collections::HashMap;

    /// In-memory catalog keyed by folder id.
    #[derive(Default)]
    pub(crate) struct MemoryCatalog {
        pub folders: HashMap<String, Vec<Image>>,
    }

    impl MemoryCatalog {
        pub(crate) fn with_folder(folder: &str, count: usize) -> Self {
            let images = (0..count)
                .map(|i| Image {
                    id: format!("{folder}-img{i}"),
                    folder_id: folder.to_string(),
                    filename: format!("{folder}-img{i}.jpg"),
                    url: format!("/uploads/{folder}/{folder}-img{i}.jpg"),
                    created_at: i as i64,
                })
                .collect();
            let mut folders = HashMap::new();
            folders.insert(folder.to_string(), images);
            Self { folders }
        }
    }

    impl ImageCatalog for MemoryCatalog {
        async fn list_images(&self, folder_id: &str) -> Result<Vec<Image>, CatalogError> {
            self.folders
                .get(folder_id)
                .cloned()
                .ok_or_else(|| CatalogError::Fetch(format!("404 for {folder_id}")))
        }
    }

    #[test]
    fn parses_source_ids() {
        assert_eq!("demo".parse::<SourceId>().unwrap(), SourceId::Demo);
        assert_eq!(
            "abc".parse::<SourceId>().unwrap(),
            SourceId::Folder("abc".into())
        );
        assert_eq!(SourceId::Folder("abc".into()).to_string(), "abc");
    }

    #[tokio::test]
    async fn demo_source_has_forty_items() {
        let source = AssetSource::new(NoCatalog);
        let loaded = source
            .load(&SourceId::Demo, &mut EliminationTracker::new())
            .await
            .unwrap();
        assert_eq!(loaded.items.len(), 40);
        assert_eq!(loaded.source, SourceId::Demo);
        assert!(loaded.fallback.is_none());
    }

    #[tokio::test]
    async fn folder_items_keyed_by_image_id() {
        let source = AssetSource::new(MemoryCatalog::with_folder("f1", 3));
        let loaded = source
            .load(&SourceId::Folder("f1".into()), &mut EliminationTracker::new())
            .await
            .unwrap();
        let keys: Vec<&str> = loaded.items.keys().map(ItemKey::as_str).collect();
        assert_eq!(keys, vec!["f1-img0", "f1-img1", "f1-img2"]);
    }

    #[tokio::test]
    async fn empty_folder_falls_back_to_demo() {
        let source = AssetSource::new(MemoryCatalog::with_folder("f1", 0));
        let loaded = source
            .load(&SourceId::Folder("f1".into()), &mut EliminationTracker::new())
            .await
            .unwrap();
        assert_eq!(loaded.source, SourceId::Demo);
        assert_eq!(loaded.fallback, Some(Fallback::EmptyFolder));
        assert_eq!(loaded.items.len(), 40);
    }

    #[tokio::test]
    async fn fetch_failure_falls_back_to_demo() {
        let source = AssetSource::new(MemoryCatalog::default()).with_demo_count(6);
        let loaded = source
            .load(&SourceId::Folder("missing".into()), &mut EliminationTracker::new())
            .await
            .unwrap();
        assert_eq!(loaded.source, SourceId::Demo);
        assert!(matches!(loaded.fallback, Some(Fallback::FetchFailed(_))));
        assert_eq!(loaded.items.len(), 6);
    }

    #[tokio::test]
    async fn eliminated_items_are_filtered() {
        let source = AssetSource::new(MemoryCatalog::with_folder("f1", 3));
        let mut tracker = EliminationTracker::new();
        tracker.eliminate(ItemKey::new("f1-img1"));
        let loaded = source
            .load(&SourceId::Folder("f1".into()), &mut tracker)
            .await
            .unwrap();
        assert_eq!(loaded.items.len(), 2);
        assert!(!loaded.round_reset);
        assert_eq!(tracker.len(), 1);
    }

    #[tokio::test]
    async fn eliminating_everything_resets_the_round() {
        let source = AssetSource::new(NoCatalog).with_demo_count(3);
        let mut tracker = EliminationTracker::new();
        for n in 1..=3 {
            tracker.eliminate(ItemKey::demo(n));
        }
        let loaded = source.load(&SourceId::Demo, &mut tracker).await.unwrap();
        assert!(loaded.round_reset);
        assert_eq!(loaded.items.len(), 3);
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn exhausted_folder_falls_back_to_remaining_demo_items() {
        let source = AssetSource::new(MemoryCatalog::with_folder("f1", 2)).with_demo_count(4);
        let mut tracker = EliminationTracker::new();
        tracker.eliminate(ItemKey::new("f1-img0"));
        tracker.eliminate(ItemKey::new("f1-img1"));
        tracker.eliminate(ItemKey::demo(2));
        let loaded = source
            .load(&SourceId::Folder("f1".into()), &mut tracker)
            .await
            .unwrap();
        assert_eq!(loaded.source, SourceId::Demo);
        assert_eq!(loaded.fallback, Some(Fallback::Exhausted));
        assert_eq!(loaded.items.len(), 3);
        assert!(!loaded.round_reset);
        assert_eq!(tracker.len(), 3);
    }

    #[tokio::test]
    async fn exhausted_folder_and_demo_reset_with_full_demo() {
        let source = AssetSource::new(MemoryCatalog::with_folder("f1", 1)).with_demo_count(2);
        let mut tracker = EliminationTracker::new();
        tracker.eliminate(ItemKey::new("f1-img0"));
        tracker.eliminate(ItemKey::demo(1));
        tracker.eliminate(ItemKey::demo(2));
        let loaded = source
            .load(&SourceId::Folder("f1".into()), &mut tracker)
            .await
            .unwrap();
        assert!(loaded.round_reset);
        assert_eq!(loaded.source, SourceId::Demo);
        assert_eq!(loaded.items.len(), 2);
        assert!(tracker.is_empty());
    }

    #[tokio::test]
    async fn zero_demo_items_is_fatal() {
        let source = AssetSource::new(NoCatalog).with_demo_count(0);
        let err = source
            .load(&SourceId::Demo, &mut EliminationTracker::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::EmptyDemoSource));
    }
}
