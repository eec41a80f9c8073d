// techlab_server/src/services/export.rs

use crate::errors::{AppError, Result};
use crate::models::Product;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

pub const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const PRODUCTS_FILE_NAME: &str = "productos.xlsx";

const HEADERS: [&str; 7] = ["ID", "Nombre", "SKU", "Categoría", "Precio", "Stock", "Descripción"];

impl From<XlsxError> for AppError {
  fn from(err: XlsxError) -> Self {
    AppError::Internal(format!("Spreadsheet generation failed: {}", err))
  }
}

/// One header row, then one row per product. Prices are written in currency units.
pub fn products_workbook(products: &[Product]) -> Result<Vec<u8>> {
  let mut workbook = Workbook::new();
  let bold = Format::new().set_bold();
  let sheet = workbook.add_worksheet();
  sheet.set_name("Productos")?;

  for (col, header) in HEADERS.iter().enumerate() {
    sheet.write_string_with_format(0, col as u16, *header, &bold)?;
  }

  for (i, product) in products.iter().enumerate() {
    let row = (i + 1) as u32;
    sheet.write_string(row, 0, product.id.to_string())?;
    sheet.write_string(row, 1, &product.name)?;
    sheet.write_string(row, 2, &product.sku)?;
    sheet.write_string(row, 3, &product.category)?;
    sheet.write_number(row, 4, product.price_cents as f64 / 100.0)?;
    sheet.write_number(row, 5, product.stock)?;
    sheet.write_string(row, 6, &product.description)?;
  }

  Ok(workbook.save_to_buffer()?)
}
