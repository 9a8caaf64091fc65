//! Revenue derivation: fee resolution, gross revenue, attrition, rebates,
//! and the pipeline that chains them per bracket.

pub mod aggregate;
pub mod analysis;
pub mod attrition;
pub mod common;
pub mod discount;
pub mod fee_policy;
pub mod pipeline;
pub mod revenue;

pub use aggregate::{PopulationShare, RevenueTotals, baseline_revenue, top_by_population, totals};
pub use analysis::upper_bound_percentiles;
pub use attrition::{AttritionScope, adjust};
pub use discount::{RebateBreakdown, compute_rebate, eligible_clients};
pub use fee_policy::{FeePolicy, UnmappedBracketError, UnmappedReason, resolve};
pub use pipeline::{
    PipelineConfig, PipelineError, PipelineOutput, RevenuePipeline, RunMode, SkippedBracket,
};
pub use revenue::{BracketGross, compute_gross, gross_revenue};
