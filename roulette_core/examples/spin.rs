use roulette_core::{
    AssetSource, CarouselBuilder, EngineParams, NoCatalog, RecordingPresenter, Roulette, SeededRng,
    SourceId,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Example end-to-end spin over the demo faces
    let rng = SeededRng::new("example-server-seed", "example-client-seed", 1)?;
    let mut table = Roulette::open(
        AssetSource::new(NoCatalog),
        CarouselBuilder::default(),
        EngineParams::default(),
        SourceId::Demo,
    )
    .await?
    .with_rng(rng.clone());

    let mut presenter = RecordingPresenter::default();
    let mut stop_rng = rng;
    let spin_ticks = stop_rng.next_in(60, 240);
    table.start(&mut presenter);
    for _ in 0..spin_ticks {
        table.tick(&mut presenter);
    }
    table.stop();
    let resolution = loop {
        if let Some(r) = table.tick(&mut presenter) {
            break r;
        }
    };
    println!(
        "server_seed_hash={} ticks={} frame={} winner={:?}",
        stop_rng.server_seed_hash_hex(),
        table.engine().ticks(),
        resolution.frame_index,
        table.winner(&resolution).map(|item| &item.key)
    );
    Ok(())
}
