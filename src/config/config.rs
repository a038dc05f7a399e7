use std::{env, str::FromStr, sync::Arc, time::Duration};

use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::{
    db::{ClientRepository, MaterialRepository, StatsRepository, VisitRepository},
    services::{
        CatalogService, CommitEngine, EntityResolver, ExcelImportService, GeminiVision,
        ImportService, OcrImportService, RowValidator, SessionStore, StatsService,
        UnconfiguredVision, VisionBackend, VisitService,
    },
};

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
    pub catalog_service: CatalogService,
    pub visit_service: VisitService,
    pub import_service: ImportService,
    pub stats_service: StatsService,
}

impl AppState {
    // Função para carregar as configurações e criar o AppState
    pub async fn new() -> Self {
        // .env é opcional em produção; as variáveis podem vir do ambiente.
        dotenvy::dotenv().ok();
        tracing_subscriber::fmt().with_target(false).compact().init();

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://landscaping.db".to_string());

        let connect_options = match SqliteConnectOptions::from_str(&database_url) {
            Ok(opts) => opts.create_if_missing(true).foreign_keys(true),
            Err(e) => {
                tracing::error!("🔥 DATABASE_URL inválida: {:?}", e);
                std::process::exit(1);
            }
        };

        let db_pool = match SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect_with(connect_options)
            .await
        {
            Ok(pool) => {
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
                pool
            }
            Err(e) => {
                tracing::error!("🔥 Falha ao conectar ao banco de dados: {:?}", e);
                std::process::exit(1);
            }
        };

        Self::with_pool(db_pool)
    }

    // Monta o grafo de serviços sobre um pool já aberto (usado também nos
    // testes de integração, com sqlite::memory:).
    pub fn with_pool(db_pool: SqlitePool) -> Self {
        let client_repo = ClientRepository::new(db_pool.clone());
        let material_repo = MaterialRepository::new(db_pool.clone());
        let visit_repo = VisitRepository::new(db_pool.clone());
        let stats_repo = StatsRepository::new(db_pool.clone());

        let catalog_service =
            CatalogService::new(db_pool.clone(), client_repo.clone(), material_repo.clone());
        let visit_service = VisitService::new(
            db_pool.clone(),
            visit_repo.clone(),
            client_repo.clone(),
            material_repo.clone(),
        );
        let stats_service = StatsService::new(db_pool.clone(), client_repo.clone(), stats_repo);

        let resolver = EntityResolver::new(client_repo.clone(), material_repo.clone());
        let validator = RowValidator::new(resolver);
        let commit_engine = CommitEngine::new(
            db_pool.clone(),
            client_repo,
            material_repo,
            visit_repo,
        );

        let vision = build_vision_backend();
        let ocr_concurrency = env_usize("OCR_CONCURRENCY", 3);
        let import_service = ImportService::new(
            db_pool.clone(),
            ExcelImportService::new(),
            OcrImportService::new(vision, ocr_concurrency),
            validator,
            commit_engine,
            SessionStore::new(),
        );

        Self {
            db_pool,
            catalog_service,
            visit_service,
            import_service,
            stats_service,
        }
    }
}

fn build_vision_backend() -> Arc<dyn VisionBackend> {
    let api_key = env::var("GEMINI_API_KEY").unwrap_or_default();
    if api_key.trim().is_empty() {
        // Sem chave o endpoint de OCR responde 503 em vez de quebrar.
        tracing::warn!("GEMINI_API_KEY não definida; importação por OCR desabilitada");
        return Arc::new(UnconfiguredVision);
    }

    let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".to_string());
    let timeout = Duration::from_secs(env_usize("OCR_TIMEOUT_SECS", 60) as u64);

    match GeminiVision::new(api_key, model, timeout) {
        Ok(vision) => Arc::new(vision),
        Err(e) => {
            tracing::error!("🔥 Falha ao configurar o backend de visão: {:?}", e);
            Arc::new(UnconfiguredVision)
        }
    }
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
