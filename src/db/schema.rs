//! Database schema and migrations for DeskSync.
//!
//! Migrations are applied in order when the database is opened. The
//! `schema_version` table tracks which have been applied.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: accounts and the reservations that depend on them
    r#"
CREATE TABLE accounts (
    id                      INTEGER PRIMARY KEY AUTOINCREMENT,
    username                TEXT NOT NULL UNIQUE,
    email                   TEXT NOT NULL UNIQUE,
    password_hash           TEXT,                              -- Argon2 PHC string
    role                    TEXT NOT NULL DEFAULT 'user',      -- 'user', 'om', 'admin', 'superadmin'
    is_disabled             INTEGER NOT NULL DEFAULT 0,
    description             TEXT,
    receiving_email         INTEGER NOT NULL DEFAULT 1,
    password_changed_at     TEXT,                              -- NULL until the first rotation
    reset_token_hash        TEXT,                              -- SHA-256 hex of the reset secret
    reset_token_expires_at  TEXT,
    verification_code_hash  TEXT,
    verification_expires_at TEXT,
    created_at              TEXT NOT NULL,
    CHECK (role IN ('user', 'om', 'admin', 'superadmin'))
);

CREATE INDEX idx_accounts_role ON accounts(role);

CREATE TABLE reservations (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    account_id  INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
    desk_id     INTEGER NOT NULL,
    starts_at   TEXT NOT NULL,
    ends_at     TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_reservations_account ON reservations(account_id);
"#,
    // v2: audit trail written by the SQLite audit sink
    r#"
CREATE TABLE audit_events (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    actor_id    INTEGER,                 -- NULL for anonymous callers
    category    TEXT NOT NULL,
    action      TEXT NOT NULL,
    subject     TEXT,                    -- attempted identifier or target account
    outcome     TEXT NOT NULL,           -- 'success', 'failed'
    detail      TEXT,
    occurred_at TEXT NOT NULL
);

CREATE INDEX idx_audit_events_actor ON audit_events(actor_id);
"#,
    // v3: rendered outbound messages awaiting transport
    r#"
CREATE TABLE outbox (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    kind        TEXT NOT NULL,
    recipient   TEXT NOT NULL,
    subject     TEXT NOT NULL,
    body        TEXT NOT NULL,
    created_at  TEXT NOT NULL,
    sent_at     TEXT
);
"#,
];
