use crate::engine::SpinState;

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("invalid engine params: {0}")]
    InvalidParams(&'static str),
    #[error("item set is empty")]
    EmptyItemSet,
    #[error("demo source produced no items")]
    EmptyDemoSource,
    #[error("duplicate item key {0}")]
    DuplicateKey(String),
    #[error("cannot rebuild carousel while {0:?}")]
    EngineBusy(SpinState),
    #[error("invalid seed key")]
    SeedKey,
}

/// Failure reported by an [`ImageCatalog`](crate::source::ImageCatalog).
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("fetch failed: {0}")]
    Fetch(String),
}
