//! Table writer - renders the composed table to a styled workbook.
//!
//! Rendering contract: data rows are plain cells with the MSISDN column kept
//! as text (long numeric-looking identifiers lose digits otherwise), monetary
//! columns carry a 2-decimal format, grand-total rows are bold on a fill, and
//! spacer rows stay entirely blank so external column sums skip them.

use std::path::Path;

use rust_xlsxwriter::{Color, Format, Workbook, Worksheet};

use crate::error::RenderResult;
use crate::models::{grand_total_label, BillingRecord, OutputRow, OUTPUT_HEADERS};

/// Name of the single output sheet.
pub const OUTPUT_SHEET: &str = "Processed";

/// Default file name offered for downloads.
pub const DOWNLOAD_NAME: &str = "processed_roaming_cost.xlsx";

const TOTAL_FILL: Color = Color::RGB(0xD9D9D9);

/// Write the composed table to a file.
pub fn write_workbook<P: AsRef<Path>>(rows: &[OutputRow], path: P) -> RenderResult<()> {
    let mut workbook = build_workbook(rows)?;
    workbook.save(path.as_ref())?;
    Ok(())
}

/// Write the composed table to an in-memory xlsx buffer.
pub fn write_workbook_bytes(rows: &[OutputRow]) -> RenderResult<Vec<u8>> {
    let mut workbook = build_workbook(rows)?;
    Ok(workbook.save_to_buffer()?)
}

fn build_workbook(rows: &[OutputRow]) -> RenderResult<Workbook> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(OUTPUT_SHEET)?;

    let header_format = Format::new().set_bold();
    let text_format = Format::new().set_num_format("@");
    let money_format = Format::new().set_num_format("0.00");
    let total_format = Format::new().set_bold().set_background_color(TOTAL_FILL);
    let total_money_format = Format::new()
        .set_bold()
        .set_background_color(TOTAL_FILL)
        .set_num_format("0.00");

    for (col, header) in OUTPUT_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &header_format)?;
    }

    let mut row_idx: u32 = 1;
    for row in rows {
        match row {
            OutputRow::Data(rec) => {
                write_data_row(sheet, row_idx, rec, &text_format, &money_format)?;
            }
            OutputRow::GroupTotal {
                transporter_group,
                sum_old,
                sum_new,
            } => {
                sheet.write_string_with_format(
                    row_idx,
                    1,
                    grand_total_label(transporter_group),
                    &total_format,
                )?;
                sheet.write_number_with_format(row_idx, 6, *sum_old, &total_money_format)?;
                sheet.write_number_with_format(row_idx, 7, *sum_new, &total_money_format)?;
            }
            // Spacer rows are left untouched: blank cells, never zeroes.
            OutputRow::Spacer => {}
        }
        row_idx += 1;
    }

    sheet.autofit();
    Ok(workbook)
}

fn write_data_row(
    sheet: &mut Worksheet,
    row_idx: u32,
    rec: &BillingRecord,
    text_format: &Format,
    money_format: &Format,
) -> RenderResult<()> {
    sheet.write_string_with_format(row_idx, 0, &rec.msisdn, text_format)?;
    sheet.write_string(row_idx, 1, &rec.transporter)?;
    sheet.write_string(row_idx, 2, &rec.vehicle_reg)?;
    sheet.write_number_with_format(row_idx, 3, rec.calls_roaming, money_format)?;
    sheet.write_number_with_format(row_idx, 4, rec.calls_data, money_format)?;
    sheet.write_number_with_format(row_idx, 5, rec.total_excl_vat, money_format)?;
    sheet.write_number_with_format(row_idx, 6, rec.old_total, money_format)?;
    sheet.write_number_with_format(row_idx, 7, rec.new_total, money_format)?;
    Ok(())
}
