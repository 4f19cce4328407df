//! Domain data shapes shared across layers

pub mod catalog;
pub mod instrument;
pub mod labels;

pub use catalog::{Field, Metric, MetricKind, MetricSet, TextField};
pub use instrument::{CanonicalInstrument, DerivedFields, Identity, IdentityKey, InstrumentDetail};
pub use labels::{
    CashFlowQuality, LabelKind, MarginStability, OwnershipTrend, ProfitGrowthConsistency,
    RoceConsistency, RoeTrend, Tier, TrendLabels,
};
