// src/services/excel_service.rs
//
// Lê a pasta de trabalho de três abas (Clients / Materials / Visits) e
// transforma cada linha de dados em um StagedRecord. Problema ESTRUTURAL
// (aba faltando, coluna obrigatória ausente, arquivo corrompido) aborta a
// importação inteira com FormatError: nada fica parcialmente em staging.

use std::collections::BTreeMap;
use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx};
use chrono::{Datelike, Timelike};

use crate::{
    common::error::AppError,
    models::import::{EntityKind, ImportSummary, RecordSource, StagedRecord},
};

// Colunas do template, por aba: (nome exato no cabeçalho, campo interno,
// obrigatória?). Colunas extras são ignoradas.
const CLIENT_COLUMNS: &[(&str, &str, bool)] = &[
    ("Name", "name", true),
    ("Email", "email", false),
    ("Phone", "phone", false),
    ("Address", "address", false),
    ("Monthly_Charge", "monthly_charge", true),
    ("Notes", "notes", false),
];

const MATERIAL_COLUMNS: &[(&str, &str, bool)] = &[
    ("Name", "name", true),
    ("Cost", "cost", true),
    ("Unit", "unit", false),
    ("Is_Global", "is_global", false),
    ("Description", "description", false),
];

const VISIT_COLUMNS: &[(&str, &str, bool)] = &[
    ("Client_Name", "client_name", true),
    ("Date", "date", true),
    ("Start_Time", "start_time", true),
    ("End_Time", "end_time", true),
    ("Notes", "notes", false),
];

// Ordem de staging: clientes antes de materiais antes de visitas, porque
// as visitas dependem dos clientes do mesmo lote.
const SHEETS: &[(&str, EntityKind)] = &[
    ("Clients", EntityKind::Client),
    ("Materials", EntityKind::Material),
    ("Visits", EntityKind::Visit),
];

#[derive(Clone, Default)]
pub struct ExcelImportService;

impl ExcelImportService {
    pub fn new() -> Self {
        Self
    }

    pub fn import_workbook(
        &self,
        bytes: &[u8],
    ) -> Result<(Vec<StagedRecord>, ImportSummary), AppError> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(|e| {
            AppError::FormatError(format!("Não foi possível ler o arquivo XLSX: {e}"))
        })?;

        // Checagem das três abas ANTES de qualquer staging. Case-sensitive,
        // igual ao template.
        let sheet_names = workbook.sheet_names().to_vec();
        for (name, _) in SHEETS {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(AppError::FormatError(format!(
                    "A aba obrigatória '{name}' não foi encontrada na planilha."
                )));
            }
        }

        let mut records = Vec::new();
        let mut summary = ImportSummary::default();

        for (sheet_name, kind) in SHEETS {
            let range = workbook.worksheet_range(sheet_name).map_err(|e| {
                AppError::FormatError(format!("Falha ao ler a aba '{sheet_name}': {e}"))
            })?;

            let (headers, rows) = split_rows(&range);
            let (staged, warnings) = stage_sheet(*kind, sheet_name, &headers, rows)?;

            match kind {
                EntityKind::Client => summary.clients_staged += staged.len(),
                EntityKind::Material => summary.materials_staged += staged.len(),
                EntityKind::Visit => summary.visits_staged += staged.len(),
            }
            summary.warnings.extend(warnings);
            records.extend(staged);
        }

        tracing::info!(
            clientes = summary.clients_staged,
            materiais = summary.materials_staged,
            visitas = summary.visits_staged,
            "Planilha carregada para staging"
        );

        Ok((records, summary))
    }
}

fn split_rows(range: &Range<Data>) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|r| r.iter().map(cell_to_string).collect())
        .unwrap_or_default();
    let data = rows.map(|r| r.iter().map(cell_to_string).collect()).collect();
    (headers, data)
}

// Mapeia o cabeçalho e cria um registro por linha de dados. `rows` não
// inclui o cabeçalho; o número de linha reportado é o da planilha
// (1-based, cabeçalho = linha 1).
pub fn stage_sheet(
    kind: EntityKind,
    sheet_name: &str,
    headers: &[String],
    rows: Vec<Vec<String>>,
) -> Result<(Vec<StagedRecord>, Vec<String>), AppError> {
    let columns = match kind {
        EntityKind::Client => CLIENT_COLUMNS,
        EntityKind::Material => MATERIAL_COLUMNS,
        EntityKind::Visit => VISIT_COLUMNS,
    };

    // Posição de cada coluna conhecida, por nome exato.
    let mut mapping: Vec<(usize, &str)> = Vec::new();
    let mut missing: Vec<&str> = Vec::new();
    for (header, field, required) in columns {
        match headers.iter().position(|h| h.trim() == *header) {
            Some(idx) => mapping.push((idx, field)),
            None if *required => missing.push(header),
            None => {}
        }
    }
    if !missing.is_empty() {
        return Err(AppError::FormatError(format!(
            "A aba '{sheet_name}' está sem as colunas obrigatórias: {}.",
            missing.join(", ")
        )));
    }

    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for (i, row) in rows.into_iter().enumerate() {
        let row_number = i + 2; // linha 1 é o cabeçalho

        let mut raw: BTreeMap<String, String> = BTreeMap::new();
        for (idx, field) in &mapping {
            if let Some(value) = row.get(*idx) {
                if !value.trim().is_empty() {
                    raw.insert((*field).to_string(), value.trim().to_string());
                }
            }
        }

        if raw.is_empty() {
            warnings.push(format!("{sheet_name}, linha {row_number}: ignorada (vazia)"));
            continue;
        }

        records.push(StagedRecord::new(
            kind,
            RecordSource::Sheet {
                sheet: sheet_name.to_string(),
                row: row_number,
            },
            raw,
        ));
    }

    Ok((records, warnings))
}

// Conversão de célula para texto cru. Datas e horários do Excel chegam
// como serial numérico; devolvemos algo que os parsers do Row Validator
// entendem.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(n) => n.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{}", *f as i64)
            } else {
                format!("{f}")
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::Error(e) => format!("#ERR({e:?})"),
        Data::DateTime(dt) => match dt.as_datetime() {
            // Serial < 1900 = célula só de horário.
            Some(ndt) if ndt.year() < 1900 => ndt.format("%H:%M").to_string(),
            Some(ndt) if ndt.hour() == 0 && ndt.minute() == 0 && ndt.second() == 0 => {
                ndt.format("%Y-%m-%d").to_string()
            }
            Some(ndt) => ndt.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => format!("{dt}"),
        },
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}
