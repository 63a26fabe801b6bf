//! Excel writer (xlsx)

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::model::{CellValue, Table};

use super::Writer;

/// Name of the single worksheet written
pub const SHEET_NAME: &str = "Sheet1";

/// Writer for `.xlsx` workbooks
pub struct ExcelWriter;

impl Writer for ExcelWriter {
    fn to_bytes(&self, table: &Table) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME).context("Failed to name worksheet")?;

        fill_sheet(worksheet, table).context("Failed to write worksheet")?;

        workbook
            .save_to_buffer()
            .context("Failed to serialize workbook")
    }

    fn extension(&self) -> &'static str {
        "xlsx"
    }

    fn supports_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case("xlsx")
    }
}

fn fill_sheet(worksheet: &mut Worksheet, table: &Table) -> std::result::Result<(), XlsxError> {
    let header = Format::new().set_bold();
    let date = Format::new().set_num_format("yyyy-mm-dd");
    let datetime = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    for (col, name) in table.column_names().into_iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let r = r as u32 + 1;
        for (c, cell) in row.cells.iter().enumerate() {
            let c = c as u16;
            match cell {
                // Missing values stay blank
                CellValue::Null => {}
                CellValue::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
                CellValue::Int(i) => {
                    worksheet.write_number(r, c, *i as f64)?;
                }
                CellValue::Float(f) => {
                    worksheet.write_number(r, c, *f)?;
                }
                CellValue::String(s) => {
                    worksheet.write_string(r, c, s.as_ref())?;
                }
                CellValue::Date(d) => {
                    worksheet.write_datetime_with_format(r, c, d, &date)?;
                }
                CellValue::DateTime(dt) => {
                    worksheet.write_datetime_with_format(r, c, dt, &datetime)?;
                }
            }
        }
    }

    Ok(())
}
