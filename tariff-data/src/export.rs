//! CSV export of the derived revenue table and of synthesized populations.
//!
//! Decimals are written normalized (`37500`, not `37500.00`) and the column
//! order is fixed, so exporting the same table twice yields identical bytes.

use std::io::Write;

use rust_decimal::Decimal;
use tariff_core::{BracketRecord, DiscountProgram, RevenueRow};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("row '{label}' has {found} program rebates, expected {expected}")]
    ProgramMismatch {
        label: String,
        expected: usize,
        found: usize,
    },
}

const LEADING_COLUMNS: [&str; 8] = [
    "Classe",
    "Numero_Clienti",
    "Tariffa_IRPEF",
    "Fatturato_IRPEF",
    "Tariffa_Custom",
    "Fatturato_Custom",
    "Fatturato_IRPEF_Adjusted",
    "Fatturato_Custom_Adjusted",
];

const TRAILING_COLUMNS: [&str; 3] = [
    "Sconto_Totale",
    "Fatturato_IRPEF_Dopo_Sconti",
    "Fatturato_Custom_Dopo_Sconti",
];

/// Header row: the fixed columns with one `Clienti_<Program>` column per
/// discount program, in program order.
pub fn revenue_header(programs: &[DiscountProgram]) -> Vec<String> {
    LEADING_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .chain(programs.iter().map(|p| format!("Clienti_{}", p.name)))
        .chain(TRAILING_COLUMNS.iter().map(|c| c.to_string()))
        .collect()
}

/// Writes the derived revenue table, one line per row, in row order.
///
/// # Errors
///
/// [`ExportError::ProgramMismatch`] if a row's rebates do not line up with
/// `programs`; otherwise any CSV or I/O failure.
pub fn write_revenue_csv<W: Write>(
    writer: W,
    rows: &[RevenueRow],
    programs: &[DiscountProgram],
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(revenue_header(programs))?;

    for row in rows {
        if row.rebates.len() != programs.len() {
            return Err(ExportError::ProgramMismatch {
                label: row.label.clone(),
                expected: programs.len(),
                found: row.rebates.len(),
            });
        }

        let mut record = vec![
            row.label.clone(),
            row.client_count.to_string(),
            fmt_decimal(row.irpef.rate),
            fmt_decimal(row.irpef.gross),
            fmt_decimal(row.custom.rate),
            fmt_decimal(row.custom.gross),
            fmt_decimal(row.irpef.adjusted),
            fmt_decimal(row.custom.adjusted),
        ];
        record.extend(row.rebates.iter().map(|r| r.eligible_clients.to_string()));
        record.push(fmt_decimal(row.total_rebate));
        record.push(fmt_decimal(row.irpef.net));
        record.push(fmt_decimal(row.custom.net));

        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes a population table readable by
/// [`PopulationLoader`](crate::loader::PopulationLoader).
pub fn write_population_csv<W: Write>(
    writer: W,
    records: &[BracketRecord],
) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["Classe", "Numero_Clienti"])?;
    for record in records {
        csv_writer.write_record([record.label.as_str(), &record.client_count.to_string()])?;
    }
    csv_writer.flush()?;
    Ok(())
}

fn fmt_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use tariff_core::calculations::{PipelineConfig, RevenuePipeline};
    use tariff_core::FeeSchedule;

    use super::*;

    fn programs() -> Vec<DiscountProgram> {
        vec![
            DiscountProgram::tesserati(dec!(15), dec!(5)),
            DiscountProgram::congiunti(dec!(10), dec!(3)),
        ]
    }

    fn derived_rows() -> Vec<RevenueRow> {
        let table = vec![
            BracketRecord::new("da 0 a 10.000", 1500),
            BracketRecord::new("oltre 120.000", 50),
        ];
        let config = PipelineConfig::new(FeeSchedule::irpef_2022(), dec!(35), dec!(20), programs());
        RevenuePipeline::new(config)
            .expect("valid config")
            .run(&table)
            .expect("run")
            .rows
    }

    fn export_to_string(rows: &[RevenueRow]) -> String {
        let mut buf = Vec::new();
        write_revenue_csv(&mut buf, rows, &programs()).expect("export");
        String::from_utf8(buf).expect("utf-8")
    }

    // =========================================================================
    // write_revenue_csv tests
    // =========================================================================

    #[test]
    fn test_header_has_one_column_per_program() {
        assert_eq!(
            revenue_header(&programs()).join(","),
            "Classe,Numero_Clienti,Tariffa_IRPEF,Fatturato_IRPEF,Tariffa_Custom,\
Fatturato_Custom,Fatturato_IRPEF_Adjusted,Fatturato_Custom_Adjusted,\
Clienti_Tesserati,Clienti_Congiunti,Sconto_Totale,\
Fatturato_IRPEF_Dopo_Sconti,Fatturato_Custom_Dopo_Sconti"
        );
    }

    #[test]
    fn test_rows_are_written_normalized() {
        let csv = export_to_string(&derived_rows());
        let lines: Vec<_> = csv.lines().collect();

        // 1500 clients: 225 + 150 eligible, rebate 1125 + 450 = 1575
        assert_eq!(
            lines[1],
            "da 0 a 10.000,1500,25,37500,35,52500,37500,42000,225,150,1575,35925,40425"
        );
        // 50 clients: 7 + 5 eligible, rebate 35 + 15 = 50
        assert_eq!(lines[2], "oltre 120.000,50,40,2000,35,1750,2000,1400,7,5,50,1950,1350");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_export_is_deterministic() {
        let rows = derived_rows();

        assert_eq!(export_to_string(&rows), export_to_string(&rows));
    }

    #[test]
    fn test_program_mismatch_is_rejected() {
        let rows = derived_rows();
        let mut buf = Vec::new();

        let err = write_revenue_csv(&mut buf, &rows, &programs()[..1]).expect_err("mismatch");

        assert!(matches!(
            err,
            ExportError::ProgramMismatch {
                expected: 1,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_table_writes_header_only() {
        let csv = export_to_string(&[]);

        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_negative_net_is_written_with_sign() {
        let table = vec![BracketRecord::new("da 0 a 10.000", 10)];
        let heavy = vec![DiscountProgram::tesserati(dec!(50), dec!(100))];
        let config = PipelineConfig::new(FeeSchedule::irpef_2022(), dec!(35), dec!(0), heavy.clone());
        let rows = RevenuePipeline::new(config).expect("config").run(&table).expect("run").rows;

        let mut buf = Vec::new();
        write_revenue_csv(&mut buf, &rows, &heavy).expect("export");
        let csv = String::from_utf8(buf).expect("utf-8");

        // gross 250 / 350, rebate 5 * 100 = 500
        assert!(csv.ends_with(",500,-250,-150\n"), "got: {csv}");
    }

    // =========================================================================
    // write_population_csv tests
    // =========================================================================

    #[test]
    fn test_population_csv_layout() {
        let records = vec![
            BracketRecord::new("da 0 a 10.000", 1500),
            BracketRecord::new("oltre 120.000", 50),
        ];
        let mut buf = Vec::new();

        write_population_csv(&mut buf, &records).expect("export");

        assert_eq!(
            String::from_utf8(buf).expect("utf-8"),
            "Classe,Numero_Clienti\nda 0 a 10.000,1500\noltre 120.000,50\n"
        );
    }
}
