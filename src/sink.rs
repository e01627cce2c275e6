use std::path::Path;

use clap::ValueEnum;
use rust_xlsxwriter::Workbook;

use crate::errors::ExportError;
use crate::export::{Cell, Sheet};

pub const DEFAULT_EXPORT_FILE: &str = "Attendance_Export.xlsx";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SheetFormat {
    Xlsx,
    Csv,
}

impl SheetFormat {
    pub fn sink(self) -> Box<dyn SheetSink> {
        match self {
            SheetFormat::Xlsx => Box::new(XlsxSink),
            SheetFormat::Csv => Box::new(CsvSink),
        }
    }
}

/// Writes a named-column sheet somewhere on disk.
pub trait SheetSink {
    fn write(&self, sheet: &Sheet, path: &Path) -> Result<(), ExportError>;
}

pub struct XlsxSink;

impl SheetSink for XlsxSink {
    fn write(&self, sheet: &Sheet, path: &Path) -> Result<(), ExportError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, (header, width)) in sheet.headers.iter().zip(&sheet.widths).enumerate() {
            let col = col as u16;
            worksheet.write_string(0, col, header)?;
            worksheet.set_column_width(col, *width)?;
        }

        for (index, cells) in sheet.rows.iter().enumerate() {
            let row = index as u32 + 1;
            for (col, cell) in cells.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::Blank => {}
                    Cell::Number(value) => {
                        worksheet.write_number(row, col, *value as f64)?;
                    }
                    Cell::Text(value) => {
                        worksheet.write_string(row, col, value)?;
                    }
                }
            }
        }

        workbook.save(path)?;
        Ok(())
    }
}

pub struct CsvSink;

impl SheetSink for CsvSink {
    fn write(&self, sheet: &Sheet, path: &Path) -> Result<(), ExportError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&sheet.headers)?;
        for cells in &sheet.rows {
            // separator rows still carry every column
            let mut record: Vec<String> = cells
                .iter()
                .map(|cell| match cell {
                    Cell::Blank => String::new(),
                    Cell::Number(value) => value.to_string(),
                    Cell::Text(value) => value.clone(),
                })
                .collect();
            record.resize(sheet.headers.len(), String::new());
            writer.write_record(&record)?;
        }
        writer
            .flush()
            .map_err(|err| ExportError::Sink(err.to_string()))?;
        Ok(())
    }
}
