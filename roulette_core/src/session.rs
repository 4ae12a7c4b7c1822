use tracing::info;

use crate::{
    carousel::{CarouselBuilder, FrameList},
    elimination::EliminationTracker,
    engine::{EngineParams, SpinEngine, SpinState},
    error::CoreError,
    item::{Item, ItemKey, ItemSet},
    presenter::Presenter,
    resolver::Resolution,
    rng::SeededRng,
    source::{AssetSource, ImageCatalog, Loaded, SourceId},
};

/// One roulette table: assets, strip, engine and elimination state.
pub struct Roulette<C> {
    assets: AssetSource<C>,
    builder: CarouselBuilder,
    eliminated: EliminationTracker,
    engine: SpinEngine,
    /// Source the user selected; the loaded one may be the demo fallback.
    selected: SourceId,
    loaded: Loaded,
    frames: FrameList,
    last_winner: Option<ItemKey>,
}

impl<C: ImageCatalog> Roulette<C> {
    /// Loads `source` and builds the first strip. Nothing spins until the
    /// strip exists.
    pub async fn open(
        assets: AssetSource<C>,
        builder: CarouselBuilder,
        params: EngineParams,
        source: SourceId,
    ) -> Result<Self, CoreError> {
        let mut eliminated = EliminationTracker::new();
        let loaded = assets.load(&source, &mut eliminated).await?;
        let frames = builder.build(&loaded.items);
        let engine = SpinEngine::new(params, &frames)?;
        Ok(Self {
            assets,
            builder,
            eliminated,
            engine,
            selected: source,
            loaded,
            frames,
            last_winner: None,
        })
    }

    pub fn with_rng(mut self, rng: SeededRng) -> Self {
        self.engine.reseed(rng);
        self
    }

    /// Seeds the celebration effects of the next spin.
    pub fn reseed(&mut self, rng: SeededRng) {
        self.engine.reseed(rng);
    }

    pub fn engine(&self) -> &SpinEngine {
        &self.engine
    }

    pub fn state(&self) -> SpinState {
        self.engine.state()
    }

    pub fn items(&self) -> &ItemSet {
        &self.loaded.items
    }

    pub fn frames(&self) -> &FrameList {
        &self.frames
    }

    pub fn loaded(&self) -> &Loaded {
        &self.loaded
    }

    pub fn selected(&self) -> &SourceId {
        &self.selected
    }

    pub fn eliminated(&self) -> &EliminationTracker {
        &self.eliminated
    }

    pub fn last_winner(&self) -> Option<&ItemKey> {
        self.last_winner.as_ref()
    }

    /// Item behind a resolution.
    pub fn winner(&self, resolution: &Resolution) -> Option<&Item> {
        self.loaded.items.get(resolution.item_index)
    }

    /// Switches to another source. The elimination set carries over.
    pub async fn select_source<P: Presenter + ?Sized>(
        &mut self,
        source: SourceId,
        presenter: &mut P,
    ) -> Result<(), CoreError> {
        self.selected = source;
        self.reload(presenter).await
    }

    fn ensure_at_rest(&self) -> Result<(), CoreError> {
        match self.engine.state() {
            state @ (SpinState::Spinning | SpinState::Stopping) => Err(CoreError::EngineBusy(state)),
            SpinState::Idle | SpinState::Stopped => Ok(()),
        }
    }

    /// Rebuilds the item set and strip from the selected source. On error the
    /// current strip and winner display stay as they were.
    pub async fn reload<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> Result<(), CoreError> {
        self.ensure_at_rest()?;
        let loaded = self.assets.load(&self.selected, &mut self.eliminated).await?;
        let frames = self.builder.build(&loaded.items);
        let was_stopped = self.engine.state() == SpinState::Stopped;
        self.engine.load(&frames)?;
        if was_stopped {
            presenter.reset();
        }
        info!(
            source = %loaded.source,
            items = loaded.items.len(),
            frames = frames.len(),
            "carousel rebuilt"
        );
        self.loaded = loaded;
        self.frames = frames;
        Ok(())
    }

    pub fn start<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        presenter.reset();
        self.engine.start();
    }

    pub fn stop(&mut self) -> bool {
        self.engine.stop()
    }

    pub fn toggle<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> SpinState {
        match self.engine.state() {
            SpinState::Idle => {
                self.start(presenter);
                self.engine.state()
            }
            SpinState::Stopped => {
                self.continue_game(presenter);
                self.engine.state()
            }
            _ => self.engine.toggle(),
        }
    }

    pub fn tick<P: Presenter + ?Sized>(&mut self, presenter: &mut P) -> Option<Resolution> {
        let resolution = self.engine.tick(presenter)?;
        self.last_winner = self.winner(&resolution).map(|item| item.key.clone());
        Some(resolution)
    }

    /// Clears the winner display; eliminations are untouched.
    pub fn continue_game<P: Presenter + ?Sized>(&mut self, presenter: &mut P) {
        if self.engine.acknowledge() {
            presenter.reset();
        }
    }

    /// Eliminates the last winner and rebuilds the strip without it. Refused
    /// while the engine is moving, leaving the winner and tracker untouched.
    pub async fn eliminate_winner<P: Presenter + ?Sized>(
        &mut self,
        presenter: &mut P,
    ) -> Result<Option<ItemKey>, CoreError> {
        self.ensure_at_rest()?;
        let Some(key) = self.last_winner.take() else {
            return Ok(None);
        };
        let added = self.eliminated.eliminate(key.clone());
        if let Err(err) = self.reload(presenter).await {
            if added {
                self.eliminated.restore(&key);
            }
            self.last_winner = Some(key);
            return Err(err);
        }
        info!(%key, remaining = self.loaded.items.len(), "winner eliminated");
        Ok(Some(key))
    }

    /// Forgets every elimination and rebuilds the strip.
    pub async fn clear_eliminations<P: Presenter + ?Sized>(
        &mut self,
        presenter: &mut P,
    ) -> Result<(), CoreError> {
        self.eliminated.clear();
        self.reload(presenter).await
    }
}
