//! SQL schema for the Procura SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Directory tables. Owned by the HR system in production; read-only here.
CREATE TABLE IF NOT EXISTS employee (
    id         TEXT PRIMARY KEY,
    username   TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS organization_employee (
    organization_id TEXT NOT NULL,
    employee_id     TEXT NOT NULL REFERENCES employee(id),
    PRIMARY KEY (organization_id, employee_id)
);

-- Current rows. Updated in place, always together with a version row.
CREATE TABLE IF NOT EXISTS tender (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    description     TEXT NOT NULL,
    service_type    TEXT NOT NULL,   -- 'Construction' | 'Delivery' | 'Manufacture'
    status          TEXT NOT NULL,   -- 'Created' | 'Published' | 'Closed'
    organization_id TEXT NOT NULL,
    creator_id      TEXT NOT NULL,
    version_id      INTEGER NOT NULL CHECK (version_id >= 1),
    created         TEXT NOT NULL
);

-- Version logs are strictly append-only.
-- No UPDATE or DELETE is ever issued against these tables.
CREATE TABLE IF NOT EXISTS tender_version (
    tender_id    TEXT NOT NULL REFERENCES tender(id),
    version_id   INTEGER NOT NULL,
    name         TEXT NOT NULL,
    description  TEXT NOT NULL,
    status       TEXT NOT NULL,
    service_type TEXT NOT NULL,
    created      TEXT NOT NULL,
    PRIMARY KEY (tender_id, version_id)
);

CREATE TABLE IF NOT EXISTS bid (
    id              TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    description     TEXT NOT NULL,
    status          TEXT NOT NULL,   -- 'Created' | 'Published' | 'Closed' | 'Approved' | 'Rejected'
    tender_id       TEXT NOT NULL REFERENCES tender(id),
    creator_type    TEXT NOT NULL,   -- 'Organization' | 'User'
    creator_id      TEXT NOT NULL,
    organization_id TEXT NOT NULL,
    version_id      INTEGER NOT NULL CHECK (version_id >= 1),
    created         TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bid_version (
    bid_id      TEXT NOT NULL REFERENCES bid(id),
    version_id  INTEGER NOT NULL,
    name        TEXT NOT NULL,
    description TEXT NOT NULL,
    status      TEXT NOT NULL,
    created     TEXT NOT NULL,
    PRIMARY KEY (bid_id, version_id)
);

-- One decision per employee per bid; a repeat vote overwrites.
CREATE TABLE IF NOT EXISTS bid_agreement (
    bid_id      TEXT NOT NULL REFERENCES bid(id),
    employee_id TEXT NOT NULL,
    status      TEXT NOT NULL CHECK (status IN ('Approved', 'Rejected')),
    created     TEXT NOT NULL,
    PRIMARY KEY (bid_id, employee_id)
);

CREATE INDEX IF NOT EXISTS tender_org_idx      ON tender(organization_id);
CREATE INDEX IF NOT EXISTS bid_tender_idx      ON bid(tender_id);
CREATE INDEX IF NOT EXISTS bid_org_idx         ON bid(organization_id);
CREATE INDEX IF NOT EXISTS org_employee_emp_idx ON organization_employee(employee_id);

PRAGMA user_version = 1;
";
