// Pipeline processing: normalization, scoring, tiering and ad-hoc screens

pub mod normalize;
pub mod scoring;
pub mod screen;
pub mod stats;
pub mod tiers;
