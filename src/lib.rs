pub mod athlete;
pub mod catalog;
pub mod categories;
pub mod cohort;
pub mod dataset;
pub mod dominant;
pub mod error;
pub mod export;
pub mod fake_roster;
pub mod logging;
pub mod metrics;
pub mod percentile;
pub mod positions;
pub mod rating;
pub mod settings;
pub mod similarity;
pub mod zscore;

pub use athlete::AthleteRecord;
pub use catalog::{Profile, ProfileCatalog, global_catalog};
pub use dominant::{DominantProfile, dominant_profile};
pub use error::EngineError;
pub use metrics::{Aggregation, MetricDefinition};
pub use positions::PositionCode;
pub use rating::{RankedAthlete, RatingResult, RatingStrategy, rank_cohort, rate};
pub use similarity::{SimilarityResult, find_similar};
pub use zscore::zscore_rate;
