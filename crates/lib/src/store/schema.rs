//! # Schema Definitions
//!
//! This module centralizes the `CREATE TABLE` statements for every table the
//! application uses. All statements are idempotent so they can run on every
//! startup.

pub const CREATE_USERS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS users (
    telegram_id     TEXT PRIMARY KEY,
    nome            TEXT NOT NULL,
    ddd             TEXT,
    canal_principal TEXT,
    tipo_parceiro   TEXT,
    rede_parceiro   TEXT,
    loja            TEXT,
    cargo           TEXT,
    is_admin        INTEGER NOT NULL DEFAULT 0,
    data_registro   TEXT NOT NULL DEFAULT (datetime('now'))
);";

pub const CREATE_CHALLENGES_TABLE: &str = "
CREATE TABLE IF NOT EXISTS challenges (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    kind         TEXT NOT NULL,
    value        TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'draft',
    created_at   TEXT NOT NULL DEFAULT (datetime('now')),
    activated_at TEXT,
    closed_at    TEXT
);";

pub const CREATE_SESSIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS sessions (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      TEXT NOT NULL REFERENCES users(telegram_id),
    challenge_id INTEGER REFERENCES challenges(id),
    is_training  INTEGER NOT NULL DEFAULT 0,
    started_at   TEXT NOT NULL DEFAULT (datetime('now'))
);";

pub const CREATE_ANSWERS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS answers (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    session_id       INTEGER NOT NULL REFERENCES sessions(id),
    user_id          TEXT NOT NULL,
    pergunta         TEXT NOT NULL,
    resposta_usuario TEXT NOT NULL,
    resposta_correta TEXT NOT NULL,
    acertou          INTEGER NOT NULL,
    tema             TEXT,
    subtema          TEXT,
    answered_at      TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE (session_id, pergunta)
);";

pub const CREATE_RESULTS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS results (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id         TEXT NOT NULL,
    session_id      INTEGER NOT NULL REFERENCES sessions(id),
    pontos          INTEGER NOT NULL,
    total_perguntas INTEGER NOT NULL,
    created_at      TEXT NOT NULL DEFAULT (datetime('now'))
);";

pub const CREATE_QUESTIONS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS questions (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    pergunta         TEXT NOT NULL,
    opcoes           TEXT NOT NULL,
    resposta_correta TEXT NOT NULL,
    tema             TEXT NOT NULL DEFAULT '',
    subtema          TEXT NOT NULL DEFAULT '',
    feedback         TEXT NOT NULL DEFAULT '',
    fonte            TEXT NOT NULL DEFAULT '',
    publico_alvo     TEXT NOT NULL DEFAULT '',
    canais           TEXT NOT NULL DEFAULT ''
);";

pub const CREATE_PILLS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS pills (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    cargos           TEXT NOT NULL DEFAULT '',
    canais           TEXT NOT NULL DEFAULT '',
    tema             TEXT NOT NULL DEFAULT '',
    conteudo         TEXT NOT NULL,
    arquivo_origem   TEXT NOT NULL DEFAULT '',
    pagina           INTEGER,
    telegram_file_id TEXT,
    last_sent_at     TEXT
);";

pub const CREATE_SETTINGS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);";

pub const CREATE_ADMINS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS admins (
    username      TEXT PRIMARY KEY,
    password_hash TEXT NOT NULL,
    salt          TEXT NOT NULL,
    telegram_id   TEXT
);";

pub const CREATE_SESSIONS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);";
pub const CREATE_SESSIONS_CHALLENGE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_sessions_challenge ON sessions(challenge_id);";
pub const CREATE_ANSWERS_SESSION_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_answers_session ON answers(session_id);";
pub const CREATE_RESULTS_USER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_results_user ON results(user_id);";
pub const CREATE_RESULTS_SESSION_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_results_session ON results(session_id);";

/// Every statement required to bring a fresh database up to the current schema.
pub const ALL_TABLE_CREATION_SQL: &[&str] = &[
    CREATE_USERS_TABLE,
    CREATE_CHALLENGES_TABLE,
    CREATE_SESSIONS_TABLE,
    CREATE_ANSWERS_TABLE,
    CREATE_RESULTS_TABLE,
    CREATE_QUESTIONS_TABLE,
    CREATE_PILLS_TABLE,
    CREATE_SETTINGS_TABLE,
    CREATE_ADMINS_TABLE,
    CREATE_SESSIONS_USER_INDEX,
    CREATE_SESSIONS_CHALLENGE_INDEX,
    CREATE_ANSWERS_SESSION_INDEX,
    CREATE_RESULTS_USER_INDEX,
    CREATE_RESULTS_SESSION_INDEX,
];
