pub mod carousel;
pub mod elimination;
pub mod engine;
pub mod error;
pub mod item;
pub mod presenter;
pub mod resolver;
pub mod rng;
pub mod session;
pub mod source;

pub use crate::carousel::{CarouselBuilder, CarouselParams, Frame, FrameList};
pub use crate::elimination::EliminationTracker;
pub use crate::engine::{EngineParams, SpinEngine, SpinState};
pub use crate::error::{CatalogError, CoreError};
pub use crate::item::{DisplayPayload, Item, ItemKey, ItemSet};
pub use crate::presenter::{Effect, EffectSchedule, Presenter, RecordingPresenter, ScheduledEffect};
pub use crate::resolver::{resolve, Resolution};
pub use crate::rng::{derive_hash_hex, SeededRng};
pub use crate::session::Roulette;
pub use crate::source::{AssetSource, Fallback, ImageCatalog, Loaded, NoCatalog, SourceId, DEMO_ITEM_COUNT};
