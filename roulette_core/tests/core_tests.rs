use roulette_core::{
    resolve, AssetSource, CarouselBuilder, CarouselParams, EliminationTracker, EngineParams,
    ItemKey, ItemSet, NoCatalog, RecordingPresenter, SourceId, SpinEngine, SpinState,
};

#[test]
fn scenario_three_items_stop_at_1450() {
    let r = resolve(1450.0, 200.0, 84, 3);
    assert_eq!(r.raw_index, 7);
    assert_eq!(r.item_index, 1);
}

#[test]
fn scenario_friction_ticks() {
    let params = EngineParams::default();
    let estimate = (0.2f64 / 50.0).ln() / 0.992f64.ln();
    assert!((estimate - 687.0).abs() < 1.0);
    assert_eq!(params.ticks_to_stop(), 688);
}

#[test]
fn scenario_five_item_carousel() {
    let frames = CarouselBuilder::default().build(&ItemSet::demo(5).unwrap());
    assert_eq!(frames.traversals(), 16);
    assert_eq!(frames.len(), 80);
}

#[test]
fn decay_terminates_for_assorted_params() {
    let items = ItemSet::demo(4).unwrap();
    let frames = CarouselBuilder::default().build(&items);
    for (max_speed, friction, stop_threshold) in [(50.0, 0.992, 0.2), (10.0, 0.5, 1.0), (80.0, 0.999, 0.05)] {
        let params = EngineParams {
            max_speed,
            friction,
            stop_threshold,
            ..Default::default()
        };
        let mut engine = SpinEngine::new(params, &frames).unwrap();
        let mut p = RecordingPresenter::default();
        engine.start();
        engine.stop();
        let bound = params.ticks_to_stop();
        let mut ticks = 0;
        while engine.tick(&mut p).is_none() {
            ticks += 1;
            assert!(ticks <= bound, "{params:?} exceeded {bound} ticks");
        }
        assert_eq!(ticks + 1, bound);
        assert_eq!(engine.state(), SpinState::Stopped);
    }
}

/// The same physical stop must pick the same item however long the strip is.
#[test]
fn repeat_factor_never_changes_the_winner() {
    let items = ItemSet::demo(3).unwrap();
    let mut winners = Vec::new();
    for (min_buffer_frames, safety_factor) in [(40, 2), (40, 1), (7, 3), (200, 4)] {
        let builder = CarouselBuilder::new(CarouselParams {
            min_buffer_frames,
            safety_factor,
        })
        .unwrap();
        let frames = builder.build(&items);
        let mut engine = SpinEngine::new(EngineParams::default(), &frames).unwrap();
        let mut p = RecordingPresenter::default();
        engine.start();
        for _ in 0..333 {
            engine.tick(&mut p);
        }
        engine.stop();
        let r = loop {
            if let Some(r) = engine.tick(&mut p) {
                break r;
            }
        };
        assert!(r.frame_index < frames.len());
        winners.push((r.raw_index, r.item_index));
    }
    assert!(winners.windows(2).all(|w| w[0] == w[1]), "{winners:?}");
}

#[tokio::test]
async fn elimination_round_trip_never_empties() {
    let source = AssetSource::new(NoCatalog).with_demo_count(5);
    let mut tracker = EliminationTracker::new();
    for n in 1..=5 {
        tracker.eliminate(ItemKey::demo(n));
    }
    let loaded = source.load(&SourceId::Demo, &mut tracker).await.unwrap();
    assert_eq!(loaded.items.len(), 5);
    assert!(loaded.round_reset);
}
