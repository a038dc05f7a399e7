// src/services/row_validator.rs
//
// Valida e normaliza UM registro em staging. Valor que não parseia vira
// problema por campo (código curto, estilo "invalid_date"), nunca erro:
// o registro continua editável na sessão.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use sqlx::{Executor, Sqlite};

use crate::{
    common::error::AppError,
    models::import::{EntityKind, NormalizedFields, Resolution},
    services::entity_resolver::EntityResolver,
};

// Resultado da anotação: projeção tipada + problemas + resolução de entidade.
#[derive(Debug, Clone)]
pub struct Annotation {
    pub normalized: Option<NormalizedFields>,
    pub problems: BTreeMap<String, String>,
    pub resolution: Resolution,
}

#[derive(Clone)]
pub struct RowValidator {
    resolver: EntityResolver,
}

impl RowValidator {
    pub fn new(resolver: EntityResolver) -> Self {
        Self { resolver }
    }

    pub async fn validate<'e, E>(
        &self,
        executor: E,
        kind: EntityKind,
        raw: &BTreeMap<String, String>,
        create_missing: bool,
    ) -> Result<Annotation, AppError>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let (normalized, mut problems) = normalize(kind, raw);

        // Resolução de entidade: para client/material, "Found" significa que o
        // commit atualiza/pula em vez de duplicar. Para visitas, o nome do
        // cliente PRECISA resolver, ou o usuário confirma a criação.
        let name_field = match kind {
            EntityKind::Visit => "client_name",
            _ => "name",
        };
        let name = trimmed(raw, name_field);

        let resolution = match name {
            Some(ref n) => match self.resolver.resolve(executor, kind, n).await? {
                Some(id) => Resolution::Found(id),
                None => {
                    if kind == EntityKind::Visit && !create_missing {
                        // "Novo cliente: confirme ou mapeie para um existente."
                        problems.insert("client_name".into(), "client_not_found".into());
                    }
                    Resolution::CreateNew
                }
            },
            None => Resolution::CreateNew,
        };

        Ok(Annotation {
            normalized,
            problems,
            resolution,
        })
    }
}

// =============================================================================
//  NORMALIZAÇÃO PURA (sem banco): regras por tipo de entidade
// =============================================================================

pub fn normalize(
    kind: EntityKind,
    raw: &BTreeMap<String, String>,
) -> (Option<NormalizedFields>, BTreeMap<String, String>) {
    match kind {
        EntityKind::Client => normalize_client(raw),
        EntityKind::Material => normalize_material(raw),
        EntityKind::Visit => normalize_visit(raw),
    }
}

fn normalize_client(
    raw: &BTreeMap<String, String>,
) -> (Option<NormalizedFields>, BTreeMap<String, String>) {
    let mut problems = BTreeMap::new();

    let name = trimmed(raw, "name");
    if name.is_none() {
        problems.insert("name".into(), "required".into());
    }

    // Mensalidade em branco vale 0: o usuário ajusta depois.
    let monthly_charge = match trimmed(raw, "monthly_charge") {
        None => Some(0.0),
        Some(s) => match parse_money(&s) {
            Some(v) if v >= 0.0 => Some(v),
            Some(_) => {
                problems.insert("monthly_charge".into(), "negative_value".into());
                None
            }
            None => {
                problems.insert("monthly_charge".into(), "invalid_number".into());
                None
            }
        },
    };

    let normalized = match (name, monthly_charge) {
        (Some(name), Some(monthly_charge)) => Some(NormalizedFields::Client {
            name,
            email: trimmed(raw, "email"),
            phone: trimmed(raw, "phone"),
            address: trimmed(raw, "address"),
            monthly_charge,
            notes: trimmed(raw, "notes"),
        }),
        _ => None,
    };

    (normalized, problems)
}

fn normalize_material(
    raw: &BTreeMap<String, String>,
) -> (Option<NormalizedFields>, BTreeMap<String, String>) {
    let mut problems = BTreeMap::new();

    let name = trimmed(raw, "name");
    if name.is_none() {
        problems.insert("name".into(), "required".into());
    }

    let cost = match trimmed(raw, "cost") {
        None => {
            problems.insert("cost".into(), "required".into());
            None
        }
        Some(s) => match parse_money(&s) {
            Some(v) if v >= 0.0 => Some(v),
            Some(_) => {
                problems.insert("cost".into(), "negative_value".into());
                None
            }
            None => {
                problems.insert("cost".into(), "invalid_number".into());
                None
            }
        },
    };

    // Materiais importados são globais por padrão, igual ao template.
    let is_global = match trimmed(raw, "is_global") {
        None => Some(true),
        Some(s) => match parse_bool(&s) {
            Some(b) => Some(b),
            None => {
                problems.insert("is_global".into(), "invalid_boolean".into());
                None
            }
        },
    };

    let normalized = match (name, cost, is_global) {
        (Some(name), Some(cost), Some(is_global)) => Some(NormalizedFields::Material {
            name,
            cost,
            unit: trimmed(raw, "unit"),
            is_global,
            description: trimmed(raw, "description"),
        }),
        _ => None,
    };

    (normalized, problems)
}

fn normalize_visit(
    raw: &BTreeMap<String, String>,
) -> (Option<NormalizedFields>, BTreeMap<String, String>) {
    let mut problems = BTreeMap::new();

    let client_name = trimmed(raw, "client_name");
    if client_name.is_none() {
        problems.insert("client_name".into(), "required".into());
    }

    let date = match trimmed(raw, "date") {
        None => {
            problems.insert("date".into(), "required".into());
            None
        }
        Some(s) => match parse_date(&s) {
            Some(d) => Some(d),
            None => {
                problems.insert("date".into(), "invalid_date".into());
                None
            }
        },
    };

    let start_time = parse_time_field(raw, "start_time", &mut problems);
    let end_time = parse_time_field(raw, "end_time", &mut problems);

    // Fim antes do início = duração negativa. Fim igual ao início é aceito
    // (duração zero).
    if let (Some(start), Some(end)) = (start_time, end_time) {
        if end < start {
            problems.insert("end_time".into(), "negative_duration".into());
        }
    }

    let normalized = match (client_name, date, start_time, end_time) {
        (Some(client_name), Some(date), Some(start), Some(end)) if end >= start => {
            Some(NormalizedFields::Visit {
                client_name,
                date,
                start_time: start,
                end_time: end,
                notes: trimmed(raw, "notes"),
            })
        }
        _ => None,
    };

    (normalized, problems)
}

fn parse_time_field(
    raw: &BTreeMap<String, String>,
    field: &str,
    problems: &mut BTreeMap<String, String>,
) -> Option<NaiveTime> {
    match trimmed(raw, field) {
        None => {
            problems.insert(field.into(), "required".into());
            None
        }
        Some(s) => match parse_time(&s) {
            Some(t) => Some(t),
            None => {
                problems.insert(field.into(), "invalid_time".into());
                None
            }
        },
    }
}

// =============================================================================
//  PARSERS TOLERANTES
// =============================================================================

fn trimmed(raw: &BTreeMap<String, String>, field: &str) -> Option<String> {
    raw.get(field)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// Aceita os formatos do template e os que aparecem em planilha real,
// inclusive célula de data que veio como "2024-01-15 00:00:00".
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let value = value.split_whitespace().next().unwrap_or(value);

    const FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%m-%d-%Y", "%d/%m/%Y", "%m/%d/%y"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

// HH:MM, HH:MM:SS, "12:10 PM", e o dígito corrido de OCR ("930" -> 9:30).
pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let mut value = value.trim().replace('.', ":").to_uppercase();

    // OCR costuma perder o dois-pontos.
    if !value.contains(':') && (value.len() == 3 || value.len() == 4) && value.chars().all(|c| c.is_ascii_digit()) {
        let split = value.len() - 2;
        value = format!("{}:{}", &value[..split], &value[split..]);
    }

    const FORMATS: [&str; 4] = ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(&value, fmt).ok())
}

// "500", "500,00", "R$ 1.234,56", "$1,234.56": tudo vira f64.
pub fn parse_money(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .trim_start_matches("R$")
        .trim_start_matches('$')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    // Com vírgula E ponto, o último separador é o decimal.
    let normalized = if cleaned.contains(',') && cleaned.contains('.') {
        if cleaned.rfind(',') > cleaned.rfind('.') {
            cleaned.replace('.', "").replace(',', ".")
        } else {
            cleaned.replace(',', "")
        }
    } else {
        cleaned.replace(',', ".")
    };

    normalized.parse::<f64>().ok()
}

pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "sim" | "verdadeiro" => Some(true),
        "false" | "0" | "no" | "n" | "nao" | "não" | "falso" => Some(false),
        _ => None,
    }
}

// Duração em minutos entre dois horários (end >= start garantido pelo
// validador).
pub fn duration_minutes(start: NaiveTime, end: NaiveTime) -> f64 {
    (end - start).num_minutes() as f64
}

pub fn format_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_date_accepts_template_and_spreadsheet_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(parse_date("2024-01-15"), Some(expected));
        assert_eq!(parse_date("01/15/2024"), Some(expected));
        assert_eq!(parse_date("01-15-2024"), Some(expected));
        assert_eq!(parse_date("2024-01-15 00:00:00"), Some(expected));
        assert_eq!(parse_date("não é data"), None);
    }

    #[test]
    fn parse_time_accepts_24h_12h_and_ocr_digits() {
        let t = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
        assert_eq!(parse_time("09:30"), Some(t));
        assert_eq!(parse_time("9:30"), Some(t));
        assert_eq!(parse_time("09:30:00"), Some(t));
        assert_eq!(parse_time("9:30 AM"), Some(t));
        assert_eq!(parse_time("930"), Some(t));
        assert_eq!(
            parse_time("12:10 PM"),
            NaiveTime::from_hms_opt(12, 10, 0)
        );
        assert_eq!(parse_time("25:99"), None);
        assert_eq!(parse_time(""), None);
    }

    #[test]
    fn parse_money_handles_brazilian_and_american_separators() {
        assert_eq!(parse_money("500"), Some(500.0));
        assert_eq!(parse_money("500,00"), Some(500.0));
        assert_eq!(parse_money("R$ 1.234,56"), Some(1234.56));
        assert_eq!(parse_money("$1,234.56"), Some(1234.56));
        assert_eq!(parse_money("abc"), None);
    }

    #[test]
    fn client_with_blank_charge_defaults_to_zero() {
        let (normalized, problems) = normalize(EntityKind::Client, &raw(&[("name", "Smith Residence")]));
        assert!(problems.is_empty());
        match normalized {
            Some(NormalizedFields::Client { monthly_charge, .. }) => {
                assert_eq!(monthly_charge, 0.0)
            }
            other => panic!("projeção inesperada: {other:?}"),
        }
    }

    #[test]
    fn client_without_name_is_flagged() {
        let (normalized, problems) =
            normalize(EntityKind::Client, &raw(&[("monthly_charge", "100")]));
        assert!(normalized.is_none());
        assert_eq!(problems.get("name").map(String::as_str), Some("required"));
    }

    #[test]
    fn material_rejects_negative_cost() {
        let (normalized, problems) = normalize(
            EntityKind::Material,
            &raw(&[("name", "Mulch"), ("cost", "-5")]),
        );
        assert!(normalized.is_none());
        assert_eq!(
            problems.get("cost").map(String::as_str),
            Some("negative_value")
        );
    }

    #[test]
    fn material_defaults_to_global() {
        let (normalized, _) = normalize(
            EntityKind::Material,
            &raw(&[("name", "Mulch"), ("cost", "5.50")]),
        );
        match normalized {
            Some(NormalizedFields::Material { is_global, .. }) => assert!(is_global),
            other => panic!("projeção inesperada: {other:?}"),
        }
    }

    #[test]
    fn visit_with_end_before_start_yields_negative_duration() {
        let (normalized, problems) = normalize(
            EntityKind::Visit,
            &raw(&[
                ("client_name", "Smith Residence"),
                ("date", "2024-01-15"),
                ("start_time", "11:00"),
                ("end_time", "09:00"),
            ]),
        );
        assert!(normalized.is_none());
        assert_eq!(
            problems.get("end_time").map(String::as_str),
            Some("negative_duration")
        );
    }

    #[test]
    fn visit_with_equal_times_is_accepted() {
        let (normalized, problems) = normalize(
            EntityKind::Visit,
            &raw(&[
                ("client_name", "Smith Residence"),
                ("date", "2024-01-15"),
                ("start_time", "09:00"),
                ("end_time", "09:00"),
            ]),
        );
        assert!(problems.is_empty());
        assert!(normalized.is_some());
    }

    #[test]
    fn visit_with_garbage_date_is_flagged_not_fatal() {
        let (normalized, problems) = normalize(
            EntityKind::Visit,
            &raw(&[
                ("client_name", "Smith Residence"),
                ("date", "ontem"),
                ("start_time", "09:00"),
                ("end_time", "10:00"),
            ]),
        );
        assert!(normalized.is_none());
        assert_eq!(
            problems.get("date").map(String::as_str),
            Some("invalid_date")
        );
        // os horários válidos não geram problema
        assert!(!problems.contains_key("start_time"));
    }

    #[test]
    fn duration_is_in_minutes() {
        let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let end = NaiveTime::from_hms_opt(11, 30, 0).unwrap();
        assert_eq!(duration_minutes(start, end), 150.0);
    }
}
