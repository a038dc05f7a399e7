// src/services/vision_service.rs
//
// Adaptador de OCR: manda cada imagem para o backend de visão (Gemini) e
// transforma as respostas em registros de visita em staging. A falha de
// uma imagem vira diagnóstico e NÃO derruba as demais. Tudo que sai daqui
// é needs_review: extração de manuscrito erra, sempre.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use regex::Regex;
use tokio::sync::Semaphore;

use crate::{
    common::error::AppError,
    models::import::{EntityKind, ImagePayload, ImportSummary, RecordSource, StagedRecord},
};

const EXTRACTION_PROMPT: &str = "\
Extract ALL visit records from this handwritten landscaping schedule.

For each visit, provide:
- Date (MM/DD/YYYY format)
- Client name
- Start time (HH:MM 24-hour format)
- End time (HH:MM 24-hour format)

Format each visit as:
Date: MM/DD/YYYY | Client: [name] | Time: HH:MM-HH:MM

Example:
Date: 01/15/2024 | Client: Smith Residence | Time: 09:30-11:45

Extract every visit you can identify. If handwriting is unclear, make your best guess.";

// =============================================================================
//  BACKEND DE VISÃO (trait para permitir mock nos testes)
// =============================================================================

#[async_trait]
pub trait VisionBackend: Send + Sync {
    fn is_available(&self) -> bool;

    // Devolve o texto estruturado do backend. O parse fica no adaptador:
    // o backend não dá nenhuma garantia de conformidade de esquema.
    async fn extract_text(&self, image: &ImagePayload) -> Result<String, AppError>;
}

// Implementação real via REST do Gemini.
pub struct GeminiVision {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiVision {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Falha ao construir o cliente HTTP: {e}"))?;

        Ok(Self {
            http,
            api_key,
            model,
        })
    }
}

#[async_trait]
impl VisionBackend for GeminiVision {
    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn extract_text(&self, image: &ImagePayload) -> Result<String, AppError> {
        if !self.is_available() {
            return Err(AppError::VisionUnavailable);
        }

        // Valida o base64 antes de gastar a chamada.
        base64::engine::general_purpose::STANDARD
            .decode(&image.data)
            .map_err(|_| {
                AppError::VisionBackend(format!("imagem '{}' não é base64 válido", image.name))
            })?;

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let body = serde_json::json!({
            "contents": [{
                "parts": [
                    { "text": EXTRACTION_PROMPT },
                    { "inline_data": { "mime_type": image.mime_type, "data": image.data } }
                ]
            }]
        });

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::VisionBackend(format!("timeout na imagem '{}'", image.name))
                } else {
                    AppError::VisionBackend(format!("falha na chamada ao Gemini: {e}"))
                }
            })?;

        if !response.status().is_success() {
            return Err(AppError::VisionBackend(format!(
                "Gemini respondeu {} para a imagem '{}'",
                response.status(),
                image.name
            )));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::VisionBackend(format!("resposta do Gemini ilegível: {e}")))?;

        // Parse defensivo: o caminho candidates[0].content.parts[0].text
        // pode não existir.
        payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                AppError::VisionBackend(format!(
                    "Gemini não devolveu texto para a imagem '{}'",
                    image.name
                ))
            })
    }
}

// Usado quando GEMINI_API_KEY não está definida: o endpoint de OCR
// responde 503 em vez de quebrar.
pub struct UnconfiguredVision;

#[async_trait]
impl VisionBackend for UnconfiguredVision {
    fn is_available(&self) -> bool {
        false
    }

    async fn extract_text(&self, _image: &ImagePayload) -> Result<String, AppError> {
        Err(AppError::VisionUnavailable)
    }
}

// =============================================================================
//  ADAPTADOR DE IMPORTAÇÃO
// =============================================================================

#[derive(Clone)]
pub struct OcrImportService {
    vision: Arc<dyn VisionBackend>,
    // Limite de chamadas simultâneas ao backend (rate limit externo).
    max_concurrency: usize,
}

impl OcrImportService {
    pub fn new(vision: Arc<dyn VisionBackend>, max_concurrency: usize) -> Self {
        Self {
            vision,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub fn is_available(&self) -> bool {
        self.vision.is_available()
    }

    // Despacha as imagens em paralelo (limitado pelo semáforo) e remonta
    // os resultados na ordem de envio, independente da ordem de término.
    pub async fn import_images(
        &self,
        images: Vec<ImagePayload>,
    ) -> Result<(Vec<StagedRecord>, ImportSummary), AppError> {
        if !self.vision.is_available() {
            return Err(AppError::VisionUnavailable);
        }

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut handles = Vec::with_capacity(images.len());

        for (index, image) in images.into_iter().enumerate() {
            let vision = Arc::clone(&self.vision);
            let semaphore = Arc::clone(&semaphore);
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                let result = vision.extract_text(&image).await;
                (index, image.name, result)
            }));
        }

        let mut records = Vec::new();
        let mut summary = ImportSummary::default();

        // Await na ordem de submissão = saída na ordem de submissão.
        for handle in handles {
            let (index, name, result) = match handle.await {
                Ok(tuple) => tuple,
                Err(e) => {
                    summary.diagnostics.push(format!("tarefa de OCR abortada: {e}"));
                    continue;
                }
            };

            match result {
                Ok(text) => {
                    let parsed = parse_vision_response(&text);
                    if parsed.is_empty() {
                        summary.diagnostics.push(format!(
                            "imagem '{name}': nenhum registro de visita reconhecido"
                        ));
                        continue;
                    }
                    for raw in parsed {
                        let mut record = StagedRecord::new(
                            EntityKind::Visit,
                            RecordSource::Image {
                                image: name.clone(),
                                index,
                            },
                            raw,
                        );
                        // OCR nunca é aceito automaticamente.
                        record.needs_review = true;
                        records.push(record);
                    }
                }
                Err(e) => {
                    tracing::warn!(imagem = %name, erro = %e, "Falha de OCR isolada");
                    summary.diagnostics.push(format!("imagem '{name}': {e}"));
                }
            }
        }

        summary.visits_staged = records.len();
        summary.needs_review = records.len();

        Ok((records, summary))
    }
}

// Linhas no formato "Date: MM/DD/YYYY | Client: nome | Time: HH:MM-HH:MM".
// Tudo que não casa é ignorado: o modelo às vezes devolve comentários.
pub fn parse_vision_response(text: &str) -> Vec<BTreeMap<String, String>> {
    static LINE_RE: OnceLock<Regex> = OnceLock::new();
    let re = LINE_RE.get_or_init(|| {
        Regex::new(
            r"(?i)Date:\s*([0-9/\-]+)\s*\|\s*Client:\s*(.+?)\s*\|\s*Time:\s*(\d{1,2}[:.]?\d{2})\s*-\s*(\d{1,2}[:.]?\d{2})",
        )
        .expect("regex de resposta do OCR inválida")
    });

    let mut records = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("Example") {
            continue;
        }
        if let Some(caps) = re.captures(line) {
            let mut raw = BTreeMap::new();
            raw.insert("date".to_string(), caps[1].trim().to_string());
            raw.insert("client_name".to_string(), caps[2].trim().to_string());
            raw.insert("start_time".to_string(), caps[3].trim().to_string());
            raw.insert("end_time".to_string(), caps[4].trim().to_string());
            records.push(raw);
        }
    }
    records
}
