// SPDX-License-Identifier: MIT
//!
//! Tabular data read from / written to spreadsheet files
//!

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Sheet name used when the source has none (CSV)
const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// Text of spreadsheet error values, never sent to a translator
const ERROR_VALUES: &[&str] = &[
    "#NULL!", "#DIV/0!", "#VALUE!", "#REF!", "#NAME?", "#NUM!", "#N/A", "#GETTING_DATA",
];

/// Numeric cell value
///
/// Keeps the source field text of a CSV cell and the number format of an
/// xlsx cell, so untouched cells are written back as they were read.
#[derive(Clone, Debug)]
pub struct Number {
    value: f64,
    literal: Option<String>,
    format: Option<String>,
}

impl Number {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            literal: None,
            format: None,
        }
    }

    /// Number format code such as `yyyy-mm-dd`
    pub fn with_format<S: Into<String>>(mut self, code: S) -> Self {
        self.format = Some(code.into());
        self
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// Parse CSV field, the field text is kept as is
    fn parse(field: &str) -> Option<Self> {
        match field.trim().parse::<f64>() {
            Ok(value) if value.is_finite() => Some(Self {
                value,
                literal: Some(field.to_string()),
                format: None,
            }),
            _ => None,
        }
    }

    fn to_field(&self) -> String {
        match &self.literal {
            Some(literal) => literal.clone(),
            None => self.value.to_string(),
        }
    }
}

/// Same value and format, the source text does not matter
impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.format == other.format
    }
}

/// Single cell value
#[derive(Clone, Debug, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(Number),
    Bool(bool),
    /// Error value such as `#N/A`
    Error(String),
}

impl Cell {
    pub fn text<S: Into<String>>(s: S) -> Self {
        Self::Text(s.into())
    }

    pub fn number(value: f64) -> Self {
        Self::Number(Number::new(value))
    }

    /// Text worth sending to a translator, i.e. not empty after trimming
    pub fn translatable_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// CSV / display representation
    fn to_field(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Text(s) | Self::Error(s) => s.clone(),
            Self::Number(n) => n.to_field(),
            Self::Bool(b) => b.to_string(),
        }
    }

    /// Parse CSV field
    fn from_field(field: &str) -> Self {
        if field.is_empty() {
            Self::Empty
        } else if let Some(n) = Number::parse(field) {
            Self::Number(n)
        } else {
            Self::from_text(field)
        }
    }

    /// Text cell, unless it spells an error value
    fn from_text(s: &str) -> Self {
        if ERROR_VALUES.contains(&s.trim()) {
            Self::Error(s.to_string())
        } else {
            Self::Text(s.to_string())
        }
    }
}

/// Declared type of a column
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnKind {
    /// At least one cell holds text
    Text,
    /// Numbers, booleans or nothing at all
    Numeric,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    name: String,
    cells: Vec<Cell>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn kind(&self) -> ColumnKind {
        if self.cells.iter().any(|c| matches!(c, Cell::Text(_))) {
            ColumnKind::Text
        } else {
            ColumnKind::Numeric
        }
    }
}

/// Spreadsheet loaded in memory, one worksheet with a header row
///
/// All columns have the same number of cells.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    sheet_name: String,
    columns: Vec<Column>,
    rows: usize,
}

impl Table {
    /// Build table from header names and rows
    ///
    /// Short rows are padded with empty cells, surplus cells get an
    /// `Unnamed: N` header.
    pub fn from_rows<S: Into<String>>(headers: Vec<S>, rows: Vec<Vec<Cell>>) -> Self {
        let mut names: Vec<String> = headers.into_iter().map(Into::into).collect();
        let width = rows.iter().map(Vec::len).max().unwrap_or(0).max(names.len());
        for i in names.len()..width {
            names.push(format!("Unnamed: {}", i));
        }

        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column {
                name,
                cells: Vec::with_capacity(rows.len()),
            })
            .collect();
        let row_count = rows.len();
        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.cells.push(cells.next().unwrap_or(Cell::Empty));
            }
        }

        Self {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            columns,
            rows: row_count,
        }
    }

    pub fn with_sheet_name<S: Into<String>>(mut self, name: S) -> Self {
        self.sheet_name = name.into();
        self
    }

    pub fn sheet_name(&self) -> &str {
        &self.sheet_name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Cell at (row, column), both 0-origin, header excluded
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.columns.get(col).and_then(|c| c.cells.get(row))
    }

    /// Replace cell value, returns false if out of range
    pub fn set_cell(&mut self, row: usize, col: usize, value: Cell) -> bool {
        match self.columns.get_mut(col).and_then(|c| c.cells.get_mut(row)) {
            Some(cell) => {
                *cell = value;
                true
            }
            None => false,
        }
    }

    /// Indices of text columns, in sheet order
    pub fn translatable_columns(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.kind() == ColumnKind::Text)
            .map(|(i, _)| i)
            .collect()
    }

    /// Read .xlsx or .csv file
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let format = Format::from_path(path)?;
        if !path.is_file() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }
        log::debug!("Read {:?} as {:?}", path, format);

        match format {
            Format::Xlsx => read_xlsx(path),
            Format::Csv => read_csv(path),
        }
    }

    /// Write .xlsx or .csv file, format follows the extension
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        match Format::from_path(path)? {
            Format::Xlsx => self.write_xlsx(path),
            Format::Csv => self.write_csv(path),
        }
    }

    /// Write like [`Table::write`], keeping everything else of `source`
    ///
    /// For a .xlsx source the output starts from a copy of that workbook and
    /// only text cells whose value changed are overwritten, so styles,
    /// formulas and other sheets stay intact.
    pub fn write_over<P: AsRef<Path>, Q: AsRef<Path>>(&self, source: P, path: Q) -> Result<()> {
        let (source, path) = (source.as_ref(), path.as_ref());
        match (Format::from_path(source), Format::from_path(path)?) {
            (Ok(Format::Xlsx), Format::Xlsx) => self.write_xlsx_over(source, path),
            _ => self.write(path),
        }
    }

    fn write_xlsx(&self, path: &Path) -> Result<()> {
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        let sheet = book
            .new_sheet(self.sheet_name.as_str())
            .map_err(|e| Error::Workbook(e.to_string()))?;

        for (c, column) in self.columns.iter().enumerate() {
            let col = c as u32 + 1;
            sheet
                .get_cell_mut((col, 1u32))
                .set_value_string(column.name.as_str());

            for (r, cell) in column.cells.iter().enumerate() {
                let row = r as u32 + 2;
                match cell {
                    Cell::Empty => {}
                    Cell::Text(s) | Cell::Error(s) => {
                        sheet.get_cell_mut((col, row)).set_value_string(s.as_str());
                    }
                    Cell::Number(n) => {
                        let target = sheet.get_cell_mut((col, row));
                        target.set_value_number(n.value);
                        if let Some(code) = n.format() {
                            target
                                .get_style_mut()
                                .get_number_format_mut()
                                .set_format_code(code);
                        }
                    }
                    Cell::Bool(b) => {
                        sheet.get_cell_mut((col, row)).set_value_bool(*b);
                    }
                }
            }
        }

        umya_spreadsheet::writer::xlsx::write(&book, path)
            .map_err(|e| Error::Workbook(e.to_string()))
    }

    fn write_xlsx_over(&self, source: &Path, path: &Path) -> Result<()> {
        let mut book = umya_spreadsheet::reader::xlsx::read(source)?;
        let sheet = book
            .get_sheet_mut(&0)
            .ok_or_else(|| Error::Workbook(format!("no worksheet in {}", source.display())))?;

        let mut changed = 0;
        for (c, column) in self.columns.iter().enumerate() {
            let col = c as u32 + 1;
            for (r, cell) in column.cells.iter().enumerate() {
                let row = r as u32 + 2;
                if let Cell::Text(s) = cell {
                    if sheet.get_value((col, row)) != *s {
                        sheet.get_cell_mut((col, row)).set_value_string(s.as_str());
                        changed += 1;
                    }
                }
            }
        }
        log::debug!("{} cells of {:?} rewritten", changed, source);

        umya_spreadsheet::writer::xlsx::write(&book, path)
            .map_err(|e| Error::Workbook(e.to_string()))
    }

    fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(self.columns.iter().map(|c| c.name.as_str()))?;
        for row in 0..self.rows {
            writer.write_record(self.columns.iter().map(|c| c.cells[row].to_field()))?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Xlsx,
    Csv,
}

impl Format {
    fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("xlsx") => Ok(Self::Xlsx),
            Some("csv") => Ok(Self::Csv),
            _ => Err(Error::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

fn read_xlsx(path: &Path) -> Result<Table> {
    let book = umya_spreadsheet::reader::xlsx::read(path)?;
    let sheet = book
        .get_sheet_collection()
        .first()
        .ok_or_else(|| Error::Workbook(format!("no worksheet in {}", path.display())))?;

    let (max_col, max_row) = sheet.get_highest_column_and_row();
    let headers: Vec<String> = (1..=max_col)
        .map(|col| sheet.get_value((col, 1u32)))
        .collect();

    let rows = (2..=max_row)
        .map(|row| {
            (1..=max_col)
                .map(|col| match sheet.get_cell((col, row)) {
                    Some(cell) => xlsx_cell(cell),
                    None => Cell::Empty,
                })
                .collect()
        })
        .collect();

    Ok(Table::from_rows(headers, rows).with_sheet_name(sheet.get_name()))
}

fn xlsx_cell(cell: &umya_spreadsheet::Cell) -> Cell {
    let value = cell.get_value().to_string();
    match cell.get_data_type() {
        // umya keeps no error code, it writes every error back as #VALUE!
        "e" if value.is_empty() => Cell::Error("#VALUE!".to_string()),
        "e" => Cell::Error(value),
        _ if value.is_empty() => Cell::Empty,
        "s" | "str" | "inlineStr" => Cell::from_text(&value),
        "n" => match cell.get_value_number() {
            Some(n) => Cell::Number(Number {
                value: n,
                literal: None,
                format: number_format(cell),
            }),
            None => Cell::from_text(&value),
        },
        "b" => Cell::Bool(value.eq_ignore_ascii_case("true") || value == "1"),
        _ => Cell::Empty,
    }
}

/// Format code of a numeric cell, `None` for General
fn number_format(cell: &umya_spreadsheet::Cell) -> Option<String> {
    cell.get_style()
        .get_number_format()
        .map(|f| f.get_format_code())
        .filter(|code| {
            !code.is_empty() && *code != umya_spreadsheet::NumberingFormat::FORMAT_GENERAL
        })
        .map(str::to_string)
}

fn read_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = vec![];
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(Cell::from_field).collect());
    }

    Ok(Table::from_rows(headers, rows))
}

/// `<out_dir>/<input stem>_<code>.<input extension>`
pub fn output_path(input: &Path, out_dir: &Path, code: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}_{}.{}", stem, code, ext.to_string_lossy()),
        None => format!("{}_{}", stem, code),
    };
    out_dir.join(name)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Table {
        Table::from_rows(
            vec!["Name", "Age", "Note"],
            vec![
                vec![Cell::text("Hello"), Cell::number(5.0), Cell::text("  ")],
                vec![Cell::text(""), Cell::number(7.0), Cell::text("Good bye")],
            ],
        )
    }

    #[test]
    fn column_kind_from_cells() {
        let table = Table::from_rows(
            vec!["Mixed", "Numbers", "Blank", "Flags"],
            vec![
                vec![Cell::number(1.0), Cell::number(2.0), Cell::Empty, Cell::Bool(true)],
                vec![Cell::text("x"), Cell::Empty, Cell::Empty, Cell::Bool(false)],
            ],
        );
        let kinds: Vec<ColumnKind> = table.columns().iter().map(Column::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Text,
                ColumnKind::Numeric,
                ColumnKind::Numeric,
                ColumnKind::Numeric
            ]
        );
        assert_eq!(table.translatable_columns(), vec![0]);
    }

    #[test]
    fn ragged_rows_are_padded() {
        let table = Table::from_rows(
            vec!["A"],
            vec![vec![Cell::text("a")], vec![Cell::text("b"), Cell::number(1.0)]],
        );
        assert_eq!(table.column_count(), 2);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.columns()[1].name(), "Unnamed: 1");
        assert_eq!(table.cell(0, 1), Some(&Cell::Empty));
    }

    #[test]
    fn blank_text_is_not_translatable() {
        assert_eq!(Cell::text("Hi").translatable_text(), Some("Hi"));
        assert_eq!(Cell::text(" \t\n").translatable_text(), None);
        assert_eq!(Cell::text("").translatable_text(), None);
        assert_eq!(Cell::number(3.0).translatable_text(), None);
        assert_eq!(Cell::Empty.translatable_text(), None);
    }

    #[test]
    fn set_cell_out_of_range() {
        let mut table = sample();
        assert!(table.set_cell(1, 2, Cell::text("Adios")));
        assert!(!table.set_cell(2, 0, Cell::text("nope")));
        assert_eq!(table.cell(1, 2), Some(&Cell::text("Adios")));
    }

    #[test]
    fn csv_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        std::fs::write(&path, "Name,Age,Note\nHello,5,\"a, b\"\n,7.5,\n").unwrap();

        let table = Table::read(&path).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, 0), Some(&Cell::text("Hello")));
        assert_eq!(table.cell(1, 0), Some(&Cell::Empty));
        assert_eq!(table.cell(1, 1), Some(&Cell::number(7.5)));
        assert_eq!(table.cell(0, 2), Some(&Cell::text("a, b")));

        let out = dir.path().join("people_es.csv");
        table.write(&out).unwrap();
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "Name,Age,Note\nHello,5,\"a, b\"\n,7.5,\n"
        );
    }

    #[test]
    fn xlsx_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.xlsx");
        let table = sample().with_sheet_name("People");
        table.write(&path).unwrap();

        let read = Table::read(&path).unwrap();
        assert_eq!(read.sheet_name(), "People");
        assert_eq!(read.column_count(), 3);
        assert_eq!(read.row_count(), 2);
        assert_eq!(read.cell(0, 0), Some(&Cell::text("Hello")));
        assert_eq!(read.cell(1, 1), Some(&Cell::number(7.0)));
        assert_eq!(read.cell(1, 2), Some(&Cell::text("Good bye")));
        assert_eq!(read.translatable_columns(), vec![0, 2]);
    }

    #[test]
    fn csv_numbers_are_written_back_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.csv");
        let src = "Code,Note\nA-1,Hello\n0012,x\n12345678901234567890,y\n+15551234,z\n 7 ,w\n1.50,v\n";
        std::fs::write(&path, src).unwrap();

        let table = Table::read(&path).unwrap();
        assert_eq!(table.cell(1, 0), Some(&Cell::number(12.0)));
        assert_eq!(table.cell(4, 0), Some(&Cell::number(7.0)));
        assert_eq!(table.translatable_columns(), vec![0, 1]);

        let out = dir.path().join("codes_es.csv");
        table.write(&out).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), src);
    }

    #[test]
    fn error_values_are_not_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calc.xlsx");
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();
        sheet.get_cell_mut((1u32, 1u32)).set_value_string("Name");
        sheet.get_cell_mut((2u32, 1u32)).set_value_string("Calc");
        sheet.get_cell_mut((1u32, 2u32)).set_value_string("Apple");
        sheet.get_cell_mut((2u32, 2u32)).set_error();
        sheet.get_cell_mut((1u32, 3u32)).set_value_string("Pear");
        sheet.get_cell_mut((2u32, 3u32)).set_value_string("#N/A");
        sheet.get_cell_mut((2u32, 4u32)).set_value_number(3);
        umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

        let table = Table::read(&path).unwrap();
        assert_eq!(table.cell(0, 1), Some(&Cell::Error("#VALUE!".to_string())));
        assert_eq!(table.cell(1, 1), Some(&Cell::Error("#N/A".to_string())));
        assert_eq!(table.cell(1, 1).unwrap().translatable_text(), None);
        assert_eq!(table.columns()[1].kind(), ColumnKind::Numeric);
        assert_eq!(table.translatable_columns(), vec![0]);

        let csv = dir.path().join("calc.csv");
        std::fs::write(&csv, "Calc\n#DIV/0!\n2\n").unwrap();
        assert_eq!(Table::read(&csv).unwrap().translatable_columns(), Vec::<usize>::new());
    }

    /// Workbook with a text cell, a date and a bold header
    fn dated_workbook(path: &Path) {
        let mut book = umya_spreadsheet::new_file();
        let sheet = book.get_sheet_mut(&0).unwrap();
        sheet.get_cell_mut((1u32, 1u32)).set_value_string("Event");
        sheet.get_cell_mut((2u32, 1u32)).set_value_string("Date");
        sheet.get_style_mut((1u32, 1u32)).get_font_mut().set_bold(true);
        sheet.get_cell_mut((1u32, 2u32)).set_value_string("Party");
        sheet
            .get_cell_mut((2u32, 2u32))
            .set_value_number(45122)
            .get_style_mut()
            .get_number_format_mut()
            .set_format_code("yyyy-mm-dd");
        umya_spreadsheet::writer::xlsx::write(&book, path).unwrap();
    }

    fn format_code(sheet: &umya_spreadsheet::Worksheet, col: u32, row: u32) -> Option<String> {
        sheet
            .get_cell((col, row))
            .and_then(|c| c.get_style().get_number_format())
            .map(|f| f.get_format_code().to_string())
    }

    #[test]
    fn xlsx_number_format_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.xlsx");
        dated_workbook(&path);

        let table = Table::read(&path).unwrap();
        let date = Cell::Number(Number::new(45122.0).with_format("yyyy-mm-dd"));
        assert_eq!(table.cell(0, 1), Some(&date));

        let out = dir.path().join("events_es.xlsx");
        table.write(&out).unwrap();
        let book = umya_spreadsheet::reader::xlsx::read(&out).unwrap();
        let sheet = book.get_sheet(&0).unwrap();
        assert_eq!(format_code(sheet, 2, 2).as_deref(), Some("yyyy-mm-dd"));
        assert_eq!(Table::read(&out).unwrap().cell(0, 1), Some(&date));
    }

    #[test]
    fn write_over_keeps_source_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.xlsx");
        dated_workbook(&path);

        let mut table = Table::read(&path).unwrap();
        assert!(table.set_cell(0, 0, Cell::text("Fiesta")));
        let out = dir.path().join("events_es.xlsx");
        table.write_over(&path, &out).unwrap();

        let book = umya_spreadsheet::reader::xlsx::read(&out).unwrap();
        let sheet = book.get_sheet(&0).unwrap();
        assert_eq!(sheet.get_value((1u32, 2u32)), "Fiesta");
        assert_eq!(format_code(sheet, 2, 2).as_deref(), Some("yyyy-mm-dd"));
        let bold = sheet
            .get_style((1u32, 1u32))
            .get_font()
            .map_or(false, |f| *f.get_bold());
        assert!(bold);
    }

    #[test]
    fn unsupported_or_missing_input() {
        assert!(matches!(
            Table::read("table.ods"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            Table::read("/nonexistent/table.xlsx"),
            Err(Error::InputNotFound(_))
        ));
    }

    #[test]
    fn output_file_name() {
        assert_eq!(
            output_path(Path::new("data/menu.xlsx"), Path::new("out"), "es"),
            PathBuf::from("out/menu_es.xlsx")
        );
        assert_eq!(
            output_path(Path::new("menu.v2.CSV"), Path::new("."), "pt-br"),
            PathBuf::from("./menu.v2_pt-br.CSV")
        );
    }
}
