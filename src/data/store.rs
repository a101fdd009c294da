//! Reference data: the historical tables plus the fitted model artifacts.
//!
//! Everything here is read once and then shared read-only. `ReferenceStore`
//! is the load-once holder the binary creates at startup; the pipeline only
//! ever sees the resulting `Arc<ReferenceData>`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::domain::{
    HedonicArtifact, LeaseEvent, LocationRecord, MarketArtifact, ParcelKey, StructuralArtifact, TradeRecord,
};
use crate::error::RiskResult;
use crate::io::{
    read_hedonic_artifact, read_lease_events, read_locations, read_market_artifact, read_structural_artifact,
    read_trades,
};

pub const TRADES_FILE: &str = "trades.csv";
pub const LEASE_EVENTS_FILE: &str = "lease_events.csv";
pub const LOCATIONS_FILE: &str = "locations.csv";
pub const HEDONIC_FILE: &str = "hedonic.json";
pub const STRUCTURAL_FILE: &str = "structural.json";
pub const MARKET_FILE: &str = "market.json";

#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub trades: Vec<TradeRecord>,
    pub lease_events: Vec<LeaseEvent>,
    pub locations: HashMap<ParcelKey, LocationRecord>,
    pub hedonic: HedonicArtifact,
    pub structural: StructuralArtifact,
    pub market: MarketArtifact,
    /// Lease events flagged as auctioned within 4 years.
    pub total_suspected: u32,
    latest_trade: HashMap<ParcelKey, usize>,
}

impl ReferenceData {
    /// Load all tables and artifacts from `dir`.
    pub fn load(dir: &Path) -> RiskResult<ReferenceData> {
        let trades = read_trades(&dir.join(TRADES_FILE))?;
        let lease_events = read_lease_events(&dir.join(LEASE_EVENTS_FILE))?;
        let locations = read_locations(&dir.join(LOCATIONS_FILE))?;
        let hedonic = read_hedonic_artifact(&dir.join(HEDONIC_FILE))?;
        let structural = read_structural_artifact(&dir.join(STRUCTURAL_FILE))?;
        let market = read_market_artifact(&dir.join(MARKET_FILE))?;

        tracing::info!(
            dir = %dir.display(),
            trades = trades.rows.len(),
            trades_skipped = trades.row_errors.len(),
            lease_events = lease_events.rows.len(),
            lease_events_skipped = lease_events.row_errors.len(),
            locations = locations.rows.len(),
            locations_skipped = locations.row_errors.len(),
            "reference data loaded"
        );

        Ok(Self::from_parts(
            trades.rows,
            lease_events.rows,
            locations.rows,
            hedonic,
            structural,
            market,
        ))
    }

    /// Assemble from already-parsed parts (artifacts are assumed validated).
    ///
    /// A parcel listed twice in `locations` keeps its last coordinates.
    pub fn from_parts(
        trades: Vec<TradeRecord>,
        lease_events: Vec<LeaseEvent>,
        locations: Vec<(ParcelKey, LocationRecord)>,
        hedonic: HedonicArtifact,
        structural: StructuralArtifact,
        market: MarketArtifact,
    ) -> ReferenceData {
        let latest_trade = index_latest_trades(&trades);
        let total_suspected = lease_events.iter().filter(|e| e.auctioned_4y).count() as u32;
        ReferenceData {
            trades,
            lease_events,
            locations: locations.into_iter().collect(),
            hedonic,
            structural,
            market,
            total_suspected,
            latest_trade,
        }
    }

    /// Most recent trade for `parcel`.
    pub fn latest_trade(&self, parcel: &ParcelKey) -> Option<&TradeRecord> {
        self.latest_trade.get(parcel).map(|&idx| &self.trades[idx])
    }

    pub fn location(&self, parcel: &ParcelKey) -> Option<LocationRecord> {
        self.locations.get(parcel).copied()
    }
}

/// Parcel → index of its latest trade.
///
/// Later contract dates win; dated records beat dateless ones; equal dates
/// keep the row read first.
fn index_latest_trades(trades: &[TradeRecord]) -> HashMap<ParcelKey, usize> {
    let mut index: HashMap<ParcelKey, usize> = HashMap::new();
    for (idx, trade) in trades.iter().enumerate() {
        let Some(parcel) = trade.parcel.as_ref() else {
            continue;
        };
        match index.get_mut(parcel) {
            Some(current) => {
                if trade.contract_date > trades[*current].contract_date {
                    *current = idx;
                }
            }
            None => {
                index.insert(parcel.clone(), idx);
            }
        }
    }
    index
}

/// Load-once holder for `ReferenceData`.
///
/// The first successful `load_once` reads the data directory; every later
/// call (from any thread) gets the same `Arc`. Concurrent first callers
/// serialize on the init lock so the directory is read exactly once. A
/// failed load is not cached.
#[derive(Debug)]
pub struct ReferenceStore {
    dir: PathBuf,
    data: OnceLock<Arc<ReferenceData>>,
    init: Mutex<()>,
}

impl ReferenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            data: OnceLock::new(),
            init: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_loaded(&self) -> bool {
        self.data.get().is_some()
    }

    pub fn load_once(&self) -> RiskResult<Arc<ReferenceData>> {
        if let Some(data) = self.data.get() {
            return Ok(Arc::clone(data));
        }

        // A panic while loading leaves nothing behind to protect.
        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(data) = self.data.get() {
            return Ok(Arc::clone(data));
        }

        let data = Arc::new(ReferenceData::load(&self.dir)?);
        Ok(Arc::clone(self.data.get_or_init(|| data)))
    }
}
