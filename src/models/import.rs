// src/models/import.rs
//
// Tipos transitórios da pipeline de importação. Nada daqui é persistido:
// os registros vivem dentro de uma ImportSession até o commit (ou descarte).

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Client,
    Material,
    Visit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImportSource {
    Excel,
    Ocr,
}

// Resultado do Entity Resolver para o registro. `CreateNew` NÃO é erro:
// significa que o commit vai criar a entidade (ou que o usuário ainda
// precisa confirmar, no caso de visitas).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", tag = "kind", content = "id")]
pub enum Resolution {
    Found(i64),
    CreateNew,
}

// De onde o registro veio, para mensagens de erro rastreáveis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RecordSource {
    // `row` é o número da linha na planilha (1-based, contando o cabeçalho).
    Sheet { sheet: String, row: usize },
    Image { image: String, index: usize },
}

impl RecordSource {
    pub fn describe(&self) -> String {
        match self {
            RecordSource::Sheet { sheet, row } => format!("{sheet}, linha {row}"),
            RecordSource::Image { image, index } => format!("imagem {} (#{})", image, index + 1),
        }
    }
}

// --- PROJEÇÃO TIPADA ---

// O Row Validator produz isto a partir dos campos crus. Nunca confiamos
// no texto cru como se já fosse tipado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum NormalizedFields {
    Client {
        name: String,
        email: Option<String>,
        phone: Option<String>,
        address: Option<String>,
        monthly_charge: f64,
        notes: Option<String>,
    },
    Material {
        name: String,
        cost: f64,
        unit: Option<String>,
        is_global: bool,
        description: Option<String>,
    },
    Visit {
        client_name: String,
        #[schema(value_type = String, format = Date)]
        date: NaiveDate,
        #[schema(value_type = String, example = "09:00")]
        start_time: NaiveTime,
        #[schema(value_type = String, example = "11:30")]
        end_time: NaiveTime,
        notes: Option<String>,
    },
}

// --- REGISTRO EM STAGING ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StagedRecord {
    pub id: Uuid,
    pub kind: EntityKind,
    pub source: RecordSource,

    // Valores crus, exatamente como vieram da planilha/imagem.
    pub raw: BTreeMap<String, String>,

    // Projeção tipada (None enquanto houver problema que impeça o parse).
    pub normalized: Option<NormalizedFields>,

    // campo -> código do problema. Vazio = registro "limpo".
    pub problems: BTreeMap<String, String>,

    pub resolution: Resolution,

    // Para visitas: autoriza o commit a criar o cliente que não resolveu.
    pub create_missing: bool,

    // Registros vindos de OCR são SEMPRE needs_review, independente da
    // confiança do backend.
    pub needs_review: bool,

    pub status: RecordStatus,
}

impl StagedRecord {
    pub fn new(kind: EntityKind, source: RecordSource, raw: BTreeMap<String, String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            source,
            raw,
            normalized: None,
            problems: BTreeMap::new(),
            resolution: Resolution::CreateNew,
            create_missing: false,
            needs_review: false,
            status: RecordStatus::Pending,
        }
    }

    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

// --- RESUMO DA IMPORTAÇÃO ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub clients_staged: usize,
    pub materials_staged: usize,
    pub visits_staged: usize,
    pub clean: usize,
    pub needs_review: usize,
    // Linhas puladas, valores estranhos, etc.
    pub warnings: Vec<String>,
    // Falhas de backend por imagem (isoladas, nunca abortam o lote).
    pub diagnostics: Vec<String>,
}

// --- SESSÃO ---

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSession {
    pub id: Uuid,
    pub source: ImportSource,
    // Ordem de staging = ordem de commit.
    pub records: Vec<StagedRecord>,
    pub summary: ImportSummary,
    pub created_at: DateTime<Utc>,
}

impl ImportSession {
    pub fn new(source: ImportSource, records: Vec<StagedRecord>, summary: ImportSummary) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            records,
            summary,
            created_at: Utc::now(),
        }
    }

    pub fn record_mut(&mut self, record_id: Uuid) -> Option<&mut StagedRecord> {
        self.records.iter_mut().find(|r| r.id == record_id)
    }
}

// --- RELATÓRIO DE COMMIT ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CommitOutcome {
    Committed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitEntry {
    pub record_id: Uuid,
    pub kind: EntityKind,
    pub source: String,
    pub outcome: CommitOutcome,
    // Id da linha criada/atualizada, quando houver.
    pub entity_id: Option<i64>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitReport {
    pub entries: Vec<CommitEntry>,
    pub committed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl CommitReport {
    pub fn push(&mut self, entry: CommitEntry) {
        match entry.outcome {
            CommitOutcome::Committed => self.committed += 1,
            CommitOutcome::Skipped => self.skipped += 1,
            CommitOutcome::Failed => self.failed += 1,
        }
        self.entries.push(entry);
    }
}

// --- ENTRADA DO OCR ---

// Uma imagem enviada para o backend de visão. `data` é base64.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    #[schema(example = "agenda-semana-3.jpg")]
    pub name: String,
    #[serde(default = "default_mime")]
    #[schema(example = "image/jpeg")]
    pub mime_type: String,
    pub data: String,
}

fn default_mime() -> String {
    "image/jpeg".to_string()
}
