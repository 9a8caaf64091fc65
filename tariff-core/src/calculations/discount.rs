//! Discount programs: per-bracket rebates granted to eligible clients.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::calculations::common::pct_to_fraction;
use crate::models::{DiscountProgram, ProgramRebate};
use crate::params::InvalidParameterError;

/// Rebates of one bracket, per program and in total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebateBreakdown {
    pub programs: Vec<ProgramRebate>,
    pub total: Decimal,
}

/// `floor(client_count * eligible_pct / 100)`.
///
/// Truncation is the defined policy: a partial client is never rebated.
pub fn eligible_clients(
    client_count: u64,
    eligible_pct: Decimal,
) -> u64 {
    let eligible = (Decimal::from(client_count) * pct_to_fraction(eligible_pct)).floor();
    // Bounded by client_count for any pct in [0, 100].
    eligible.to_u64().unwrap_or(0)
}

/// Total rebate of a bracket with `client_count` clients across `programs`.
///
/// Programs apply independently and add up; an empty list yields zero.
///
/// # Errors
///
/// Returns [`InvalidParameterError`] if any program has an eligibility
/// percentage outside [0, 100] or a negative rebate.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use tariff_core::DiscountProgram;
/// use tariff_core::calculations::compute_rebate;
///
/// let programs = vec![
///     DiscountProgram::tesserati(dec!(15), dec!(5)),
///     DiscountProgram::congiunti(dec!(10), dec!(3)),
/// ];
/// let rebate = compute_rebate(100, &programs).unwrap();
///
/// assert_eq!(rebate.programs[0].eligible_clients, 15);
/// assert_eq!(rebate.total, dec!(105));
/// ```
pub fn compute_rebate(
    client_count: u64,
    programs: &[DiscountProgram],
) -> Result<RebateBreakdown, InvalidParameterError> {
    let mut breakdown = Vec::with_capacity(programs.len());
    let mut total = Decimal::ZERO;

    for program in programs {
        program.validate()?;
        let eligible = eligible_clients(client_count, program.eligible_pct);
        let rebate = Decimal::from(eligible) * program.rebate_per_client;
        total += rebate;
        breakdown.push(ProgramRebate {
            program: program.name.clone(),
            eligible_clients: eligible,
            rebate,
        });
    }

    Ok(RebateBreakdown {
        programs: breakdown,
        total,
    })
}
