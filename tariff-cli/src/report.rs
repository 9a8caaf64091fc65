//! Plain-text rendering of a pipeline run.

use std::fmt;

use rust_decimal::Decimal;
use tariff_core::DiscountProgram;
use tariff_core::calculations::common::round_half_up;
use tariff_core::calculations::{
    PipelineConfig, PipelineError, PipelineOutput, PopulationShare, RevenueTotals, SkippedBracket,
    baseline_revenue,
};

/// Everything the text report shows, computed up front so rendering
/// cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub irpef_policy: String,
    pub custom_policy: String,
    pub attrition_pct: Decimal,
    pub attrition_scope: String,
    pub programs: Vec<DiscountProgram>,
    pub totals: RevenueTotals,
    pub skipped: Vec<SkippedBracket>,
    pub baseline_rate: Decimal,
    pub baseline: Decimal,
    pub top_n: usize,
    pub top: Vec<PopulationShare>,
}

impl Report {
    /// # Errors
    ///
    /// [`PipelineError::InvalidParameter`] if `top_n` is zero. A run where
    /// nothing was priced yields an empty ranking rather than an error.
    pub fn build(
        output: &PipelineOutput,
        config: &PipelineConfig,
        baseline_rate: Decimal,
        top_n: usize,
    ) -> Result<Self, PipelineError> {
        let totals = output.totals();
        let top = match output.top_by_population(top_n) {
            Ok(top) => top,
            // Only reachable when no priced bracket has clients; `skipped` says why.
            Err(PipelineError::EmptyPopulation) => Vec::new(),
            Err(err) => return Err(err),
        };

        Ok(Self {
            irpef_policy: config.irpef_policy.to_string(),
            custom_policy: config.custom_policy.to_string(),
            attrition_pct: config.attrition_pct,
            attrition_scope: config.attrition_scope.to_string(),
            programs: config.discount_programs.clone(),
            totals,
            skipped: output.skipped.clone(),
            baseline_rate,
            baseline: baseline_revenue(totals.population, baseline_rate),
            top_n,
            top,
        })
    }

    fn skipped_population(&self) -> u64 {
        self.skipped.iter().map(|s| s.client_count).sum()
    }
}

/// Two decimal places, half up.
fn money(value: Decimal) -> String {
    let mut rounded = round_half_up(value);
    rounded.rescale(2);
    rounded.to_string()
}

impl fmt::Display for Report {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "Tariff revenue report")?;
        writeln!(f, "=====================")?;
        writeln!(f, "{:<18}{}", "IRPEF policy", self.irpef_policy)?;
        writeln!(f, "{:<18}{}", "Custom policy", self.custom_policy)?;
        writeln!(
            f,
            "{:<18}{}% ({})",
            "Attrition",
            self.attrition_pct.normalize(),
            self.attrition_scope
        )?;
        let programs: Vec<_> = self
            .programs
            .iter()
            .map(|p| {
                format!(
                    "{} {}% x {}",
                    p.name,
                    p.eligible_pct.normalize(),
                    money(p.rebate_per_client)
                )
            })
            .collect();
        writeln!(f, "{:<18}{}", "Discounts", programs.join(", "))?;
        writeln!(f)?;

        let skipped = self.skipped_population();
        writeln!(
            f,
            "{:<18}{} ({} priced, {} skipped)",
            "Clients",
            self.totals.population + skipped,
            self.totals.population,
            skipped
        )?;
        writeln!(f)?;

        let t = &self.totals;
        writeln!(f, "{:<18}{:>16}{:>16}", "", "IRPEF", "Custom")?;
        for (name, irpef, custom) in [
            ("Gross revenue", t.gross_irpef, t.gross_custom),
            ("After attrition", t.adjusted_irpef, t.adjusted_custom),
            ("Rebates", t.total_rebate, t.total_rebate),
            ("Net revenue", t.net_irpef, t.net_custom),
        ] {
            writeln!(f, "{:<18}{:>16}{:>16}", name, money(irpef), money(custom))?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "Baseline at uniform rate {}: {}",
            self.baseline_rate.normalize(),
            money(self.baseline)
        )?;

        if !self.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped brackets")?;
            for s in &self.skipped {
                writeln!(f, "  {} ({} clients): {}", s.label, s.client_count, s.reason)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Top {} brackets by population", self.top_n)?;
        if self.top.is_empty() {
            writeln!(f, "  (no priced clients)")?;
        }
        for (rank, share) in self.top.iter().enumerate() {
            writeln!(
                f,
                "{:>4}. {:<28}{:>8}{:>9}%",
                rank + 1,
                share.label,
                share.client_count,
                money(share.percentage)
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tariff_core::calculations::{PipelineConfig, RevenuePipeline};
    use tariff_core::{BracketRecord, FeeSchedule};

    use super::*;

    fn run(records: &[BracketRecord]) -> (PipelineOutput, PipelineConfig) {
        let config = PipelineConfig::new(
            FeeSchedule::irpef_2022(),
            dec!(35),
            dec!(0),
            vec![
                DiscountProgram::tesserati(dec!(15), dec!(5)),
                DiscountProgram::congiunti(dec!(10), dec!(3)),
            ],
        );
        let output = RevenuePipeline::new(config.clone())
            .unwrap()
            .run(records)
            .unwrap();
        (output, config)
    }

    fn sample() -> Vec<BracketRecord> {
        vec![
            BracketRecord::new("TOTALE", 2000),
            BracketRecord::new("da 0 a 10.000", 1500),
            BracketRecord::new("oltre 120.000", 500),
        ]
    }

    // =========================================================================
    // money
    // =========================================================================

    #[test]
    fn test_money_pads_and_rounds() {
        assert_eq!(money(dec!(178800)), "178800.00");
        assert_eq!(money(dec!(43.47826)), "43.48");
        assert_eq!(money(dec!(0.005)), "0.01");
        assert_eq!(money(dec!(-250)), "-250.00");
    }

    // =========================================================================
    // Report::build
    // =========================================================================

    #[test]
    fn test_build_collects_totals_and_baseline() {
        let (output, config) = run(&sample());

        let report = Report::build(&output, &config, dec!(30), 10).unwrap();

        assert_eq!(report.totals.population, 2000);
        assert_eq!(report.baseline, dec!(60000));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.top.len(), 2);
        assert_eq!(report.top[0].percentage, dec!(75));
    }

    #[test]
    fn test_build_rejects_zero_top() {
        let (output, config) = run(&sample());

        let err = Report::build(&output, &config, dec!(30), 0).unwrap_err();

        assert!(matches!(err, PipelineError::InvalidParameter(_)));
    }

    #[test]
    fn test_build_with_everything_skipped_has_empty_ranking() {
        let (output, config) = run(&[BracketRecord::new("TOTALE", 10)]);

        let report = Report::build(&output, &config, dec!(30), 3).unwrap();

        assert!(report.top.is_empty());
        assert_eq!(report.baseline, dec!(0));
    }

    // =========================================================================
    // Display
    // =========================================================================

    #[test]
    fn test_render_sections() {
        let (output, config) = run(&sample());
        let text = Report::build(&output, &config, dec!(30), 10).unwrap().to_string();

        assert!(text.contains("IRPEF policy      schedule irpef-2022\n"), "{text}");
        assert!(text.contains("Custom policy     flat 35\n"), "{text}");
        assert!(text.contains("Attrition         0% (custom-only)\n"), "{text}");
        assert!(
            text.contains("Discounts         Tesserati 15% x 5.00, Congiunti 10% x 3.00\n"),
            "{text}"
        );
        assert!(text.contains("Clients           4000 (2000 priced, 2000 skipped)\n"), "{text}");
        assert!(text.contains("Baseline at uniform rate 30: 60000.00\n"), "{text}");
        assert!(text.contains("  TOTALE (2000 clients): "), "{text}");
    }

    #[test]
    fn test_render_revenue_table() {
        let (output, config) = run(&sample());
        let text = Report::build(&output, &config, dec!(30), 10).unwrap().to_string();

        // irpef 1500*25 + 500*40 = 57500, custom 2000*35 = 70000
        // rebate 225*5 + 150*3 + 75*5 + 50*3 = 2100
        let gross = format!("{:<18}{:>16}{:>16}", "Gross revenue", "57500.00", "70000.00");
        let net = format!("{:<18}{:>16}{:>16}", "Net revenue", "55400.00", "67900.00");
        assert!(text.contains(&gross), "{text}");
        assert!(text.contains(&net), "{text}");
    }

    #[test]
    fn test_render_ranking() {
        let (output, config) = run(&sample());
        let text = Report::build(&output, &config, dec!(30), 1).unwrap().to_string();

        let first = format!("{:>4}. {:<28}{:>8}{:>9}%", 1, "da 0 a 10.000", 1500, "100.00");
        assert!(text.contains("Top 1 brackets by population\n"), "{text}");
        assert!(text.contains(&first), "{text}");
        assert!(!text.contains("oltre 120.000       "), "{text}");
    }
}
