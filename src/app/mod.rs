pub mod ports;
pub mod screening_use_case;

pub use screening_use_case::{
    AllTiers, DualIndexPreset, QualityStocksUseCase, RefreshSummary, ScreenedStock, TierListing,
    DUAL_INDEX_BEST, DUAL_INDEX_EXCELLENT,
};
