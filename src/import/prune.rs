use std::time::Duration;
use tracing::debug;

use crate::error::Result;
use crate::model::{EntityRef, Level};
use crate::store::GeoStore;
use crate::ui::{Phase, Progress, Ui};

/// Entities removed by a pruning pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneSummary {
    pub regions: u64,
    pub provinces: u64,
}

/// Delete regions, then provinces, that have no city attached.
///
/// Names go with them through the cascading foreign keys.
pub fn prune_empty<S: GeoStore, U: Ui>(
    store: &mut S,
    ui: &mut U,
    interval: Duration,
) -> Result<PruneSummary> {
    ui.set_phase(Phase::Pruning);
    store.begin()?;
    let regions = prune_level(store, ui, Level::Region, interval)?;
    let provinces = prune_level(store, ui, Level::Province, interval)?;
    store.commit()?;
    Ok(PruneSummary { regions, provinces })
}

fn prune_level<S: GeoStore, U: Ui>(
    store: &mut S,
    ui: &mut U,
    level: Level,
    interval: Duration,
) -> Result<u64> {
    let ids = store.entity_ids(level)?;
    let mut progress = Progress::start(
        ui,
        format!("    > Removing {} without cities", level.plural().to_lowercase()),
        ids.len() as u64,
        interval,
    );

    let mut removed = 0;
    for id in ids {
        let entity = EntityRef { level, id };
        if store.count_cities(entity)? == 0 {
            debug!(%level, id, "pruning entity without cities");
            store.delete(entity)?;
            removed += 1;
        }
        progress.tick(ui);
    }
    progress.finish(ui);

    Ok(removed)
}
