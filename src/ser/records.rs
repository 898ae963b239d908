use std::{
    fs,
    io::Read,
    path::{Path, PathBuf},
    time::Instant,
};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::{
    ser::{CsvConfig, InputError, SerRow},
    shared::text,
};

/// Reads every row of the segments CSV.
///
/// The file is decoded as UTF-8, or as Latin-1 when it is not valid UTF-8.
/// Fails when the file cannot be read or a configured column is missing.
/// Short rows are accepted; their missing cells read as empty strings.
pub fn load_records<P: AsRef<Path>>(path: P, config: &CsvConfig) -> Result<Vec<SerRow>, InputError> {
    let path = path.as_ref();
    debug!("Loading records from {}...", path.display());
    let now = Instant::now();
    let bytes = fs::read(path).map_err(InputError::io(path))?;
    let content = text::decode_text(bytes);
    let content = content.trim_start_matches('\u{feff}');
    let rows = parse_records(content.as_bytes(), config, path)?;
    debug!("Loaded {} records in {:?}", rows.len(), now.elapsed());
    Ok(rows)
}

/// Parses CSV text already decoded to UTF-8. `origin` is only used in error messages.
pub fn parse_records<R: Read>(
    reader: R,
    config: &CsvConfig,
    origin: &Path,
) -> Result<Vec<SerRow>, InputError> {
    if !config.delimiter.is_ascii() {
        return Err(InputError::InvalidDelimiter(config.delimiter));
    }
    let mut rdr = ReaderBuilder::new()
        .delimiter(config.delimiter as u8)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = Columns::resolve(rdr.headers()?, config, origin)?;
    let mut rows = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let line = record
            .position()
            .map(|pos| pos.line())
            .unwrap_or(i as u64 + 2);
        rows.push(columns.row(&record, line));
    }
    Ok(rows)
}

struct Columns {
    id: usize,
    zone: usize,
    spots: usize,
    street: usize,
    key: usize,
    bay_type: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord, config: &CsvConfig, origin: &Path) -> Result<Self, InputError> {
        let find = |column: &str| -> Result<usize, InputError> {
            headers
                .iter()
                .position(|header| header.trim() == column)
                .ok_or_else(|| InputError::MissingColumn {
                    column: column.to_string(),
                    path: PathBuf::from(origin),
                })
        };
        let bay_type = config
            .bay_type_column
            .as_deref()
            .and_then(|column| headers.iter().position(|header| header.trim() == column));
        Ok(Self {
            id: find(&config.id_column)?,
            zone: find(&config.zone_column)?,
            spots: find(&config.spots_column)?,
            street: find(&config.street_column)?,
            key: find(&config.key_column)?,
            bay_type,
        })
    }

    fn row(&self, record: &StringRecord, line: u64) -> SerRow {
        let cell = |index: usize| record.get(index).unwrap_or_default().to_string();
        SerRow {
            line,
            id: cell(self.id),
            zone: cell(self.zone),
            spots: cell(self.spots),
            street: cell(self.street),
            key: cell(self.key),
            bay_type: self
                .bay_type
                .map(cell)
                .filter(|value| !value.is_empty()),
        }
    }
}

#[test]
fn parse_records_reads_semicolon_rows() {
    let data = "ID;Color;Res_NumPla;Calle\n1;Azul;12;Calle Mayor\n2;Verde;3;Gran Via\n";
    let rows = parse_records(data.as_bytes(), &CsvConfig::default(), Path::new("test.csv")).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].id, "1");
    assert_eq!(rows[0].key, "1");
    assert_eq!(rows[0].zone, "Azul");
    assert_eq!(rows[0].spots, "12");
    assert_eq!(rows[0].street, "Calle Mayor");
    assert_eq!(rows[0].line, 2);
    assert_eq!(rows[1].line, 3);
    assert!(rows[0].bay_type.is_none());
}

#[test]
fn parse_records_missing_column() {
    let data = "ID;Color;Calle\n1;Azul;Calle Mayor\n";
    let err = parse_records(data.as_bytes(), &CsvConfig::default(), Path::new("test.csv")).unwrap_err();
    match err {
        InputError::MissingColumn { column, .. } => assert_eq!(column, "Res_NumPla"),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn parse_records_short_row_is_lenient() {
    let data = "ID;Color;Res_NumPla;Calle\n7;Rojo\n";
    let rows = parse_records(data.as_bytes(), &CsvConfig::default(), Path::new("test.csv")).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].spots, "");
    assert_eq!(rows[0].street, "");
}
