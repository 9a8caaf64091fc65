mod bracket_record;
mod discount_program;
mod fee_schedule;
mod revenue_row;

pub use bracket_record::{BracketRecord, total_population};
pub use discount_program::DiscountProgram;
pub use fee_schedule::{FeeSchedule, FeeScheduleError, FeeTier};
pub use revenue_row::{PolicyRevenue, ProgramRebate, RevenueRow};
