pub mod scale;
pub mod spectrum;
pub mod weighting;

pub use scale::LogFrequencyScale;
pub use spectrum::{Aggregation, DbScale, LevelPolicy, SpectrumAnalyzer};
pub use weighting::d_weighting;
