//! Sources tabulaires : CSV ou classeur, lus enregistrement par enregistrement.

use crate::model::Row;
use calamine::{open_workbook_auto, Data, ExcelDateTime, Range, Reader};
use chrono::NaiveTime;
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Enregistrement brut, dans l'ordre des colonnes.
pub type Record = Vec<String>;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("unknown file type: {}", .0.display())]
    UnknownFileType(PathBuf),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Spreadsheet(#[from] calamine::Error),
    #[error("sheet {0} not found in workbook")]
    MissingSheet(usize),
}

/// Source d'enregistrements : une seule passe, finie, paresseuse.
pub trait RowSource {
    fn records(&mut self) -> Box<dyn Iterator<Item = Result<Record, SourceError>> + '_>;
}

/// Ouvre `path` selon son extension (`.csv`, `.xls`, `.xlsx`, `.xlsm`, `.ods`).
pub fn open_source<P: AsRef<Path>>(path: P, sheet: usize) -> Result<Box<dyn RowSource>, SourceError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("csv") => Ok(Box::new(CsvSource::open(path)?)),
        Some("xls" | "xlsx" | "xlsm" | "xlsb" | "ods") => {
            Ok(Box::new(SpreadsheetSource::open(path, sheet)?))
        }
        _ => Err(SourceError::UnknownFileType(path.to_path_buf())),
    }
}

pub struct CsvSource<R> {
    reader: csv::Reader<R>,
}

impl CsvSource<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let reader = builder().from_path(path)?;
        Ok(Self { reader })
    }
}

impl<R: Read> CsvSource<R> {
    pub fn from_reader(rdr: R) -> Self {
        Self {
            reader: builder().from_reader(rdr),
        }
    }
}

fn builder() -> ReaderBuilder {
    let mut b = ReaderBuilder::new();
    // l'en-tête est un enregistrement comme un autre
    b.has_headers(false).flexible(true).trim(Trim::All);
    b
}

impl<R: Read> RowSource for CsvSource<R> {
    fn records(&mut self) -> Box<dyn Iterator<Item = Result<Record, SourceError>> + '_> {
        Box::new(self.reader.records().map(|rec| {
            rec.map(|r| r.iter().map(str::to_string).collect())
                .map_err(SourceError::from)
        }))
    }
}

/// Feuille de classeur vue comme un CSV.
pub struct SpreadsheetSource {
    range: Range<Data>,
}

impl SpreadsheetSource {
    pub fn open<P: AsRef<Path>>(path: P, sheet: usize) -> Result<Self, SourceError> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(sheet)
            .ok_or(SourceError::MissingSheet(sheet))??;
        Ok(Self { range })
    }

    pub fn from_range(range: Range<Data>) -> Self {
        Self { range }
    }
}

impl RowSource for SpreadsheetSource {
    fn records(&mut self) -> Box<dyn Iterator<Item = Result<Record, SourceError>> + '_> {
        Box::new(
            self.range
                .rows()
                .map(|row| Ok(row.iter().map(cell_text).collect())),
        )
    }
}

/// Rendu texte d'une cellule, comme un export CSV.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(dt) => excel_text(dt).unwrap_or_else(|| cell.to_string()),
        other => other.to_string().trim().to_string(),
    }
}

/// Date Excel (base 1900 ou 1904 selon le classeur) : `%Y/%m/%d` à minuit,
/// ISO-8601 sinon ; une durée s'écrit `HH:MM:SS`.
fn excel_text(dt: &ExcelDateTime) -> Option<String> {
    if dt.is_duration() {
        let secs = dt.as_duration()?.num_seconds();
        return Some(format!("{:02}:{:02}:{:02}", secs / 3_600, secs % 3_600 / 60, secs % 60));
    }
    let at = dt.as_datetime()?;
    if at.time() == NaiveTime::default() {
        Some(at.format("%Y/%m/%d").to_string())
    } else {
        Some(at.format("%Y-%m-%dT%H:%M:%S").to_string())
    }
}

/// Lignes nommées d'après le premier enregistrement non vide.
///
/// Les lignes vides sont ignorées ; une ligne plus courte que l'en-tête est
/// complétée par des valeurs vides.
pub fn table_rows<'a>(
    source: &'a mut dyn RowSource,
) -> impl Iterator<Item = Result<Row, SourceError>> + 'a {
    let mut header: Option<Record> = None;
    source.records().filter_map(move |rec| {
        let rec = match rec {
            Ok(rec) => rec,
            Err(err) => return Some(Err(err)),
        };
        if rec.iter().all(|c| c.is_empty()) {
            return None;
        }
        let Some(names) = header.as_ref() else {
            header = Some(rec);
            return None;
        };
        let values = rec.into_iter().chain(std::iter::repeat(String::new()));
        Some(Ok(Row::new(names.iter().cloned().zip(values))))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::ExcelDateTimeType;

    #[test]
    fn csv_rows_are_keyed_by_header() {
        let data = "Date,SHO,SpR\n\n01/04/2020, Alice ,Bob\n02/04/2020,Carol\n";
        let mut src = CsvSource::from_reader(data.as_bytes());
        let rows: Vec<Row> = table_rows(&mut src).collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("SHO"), Some("Alice"));
        assert_eq!(rows[1].get("SpR"), Some(""));
        assert_eq!(rows[1].date(), Some("02/04/2020"));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let err = open_source("rota.txt", 0).err().unwrap();
        assert!(matches!(err, SourceError::UnknownFileType(_)));
        assert_eq!(err.to_string(), "unknown file type: rota.txt");
    }

    #[test]
    fn missing_csv_is_an_error() {
        assert!(matches!(
            open_source("/nonexistent/rota.CSV", 0),
            Err(SourceError::Csv(_))
        ));
    }

    #[test]
    fn spreadsheet_cells_render_like_csv() {
        let mut range = Range::new((0, 0), (1, 2));
        range.set_value((0, 0), Data::String("Date".into()));
        range.set_value((0, 1), Data::String(" SHO ".into()));
        range.set_value((0, 2), Data::String("Beds".into()));
        range.set_value((1, 0), Data::String("01/04/2020".into()));
        range.set_value((1, 1), Data::String("Alice".into()));
        range.set_value((1, 2), Data::Float(12.0));
        let mut src = SpreadsheetSource::from_range(range);
        let rows: Vec<Row> = table_rows(&mut src).collect::<Result<_, _>>().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("SHO"), Some("Alice"));
        assert_eq!(rows[0].get("Beds"), Some("12"));
    }

    #[test]
    fn excel_dates_become_text() {
        let cell = |v, kind, is_1904| Data::DateTime(ExcelDateTime::new(v, kind, is_1904));
        assert_eq!(cell_text(&cell(43922.0, ExcelDateTimeType::DateTime, false)), "2020/04/01");
        assert_eq!(
            cell_text(&cell(43922.5, ExcelDateTimeType::DateTime, false)),
            "2020-04-01T12:00:00"
        );
    }

    #[test]
    fn mac_workbooks_count_from_1904() {
        let cell = Data::DateTime(ExcelDateTime::new(42460.0, ExcelDateTimeType::DateTime, true));
        assert_eq!(cell_text(&cell), "2020/04/01");
    }

    #[test]
    fn time_only_cells_are_durations() {
        let cell = Data::DateTime(ExcelDateTime::new(0.5, ExcelDateTimeType::TimeDelta, false));
        assert_eq!(cell_text(&cell), "12:00:00");
    }
}
