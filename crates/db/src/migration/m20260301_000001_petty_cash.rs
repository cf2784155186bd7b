//! Petty-cash schema.
//!
//! Reference tables, the balance ledger (snapshot, monthly rows, history),
//! document counters and the voucher/invoice/withdrawal/kasbon documents.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: REFERENCE DATA
        // ============================================================
        db.execute_unprepared(REFERENCE_SQL).await?;

        // ============================================================
        // PART 2: BALANCE LEDGER
        // ============================================================
        db.execute_unprepared(SALDO_SQL).await?;
        db.execute_unprepared(COUNTERS_SQL).await?;

        // ============================================================
        // PART 3: DOCUMENTS
        // ============================================================
        db.execute_unprepared(DOCUMENTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

const REFERENCE_SQL: &str = r"
CREATE TABLE IF NOT EXISTS companies (
    id UUID PRIMARY KEY,
    code VARCHAR(32) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS branches (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id),
    code VARCHAR(32) NOT NULL,
    name VARCHAR(255) NOT NULL,
    shorter VARCHAR(16) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_branches_company_code UNIQUE (company_id, code)
);

CREATE TABLE IF NOT EXISTS employees (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id),
    branch_id UUID NOT NULL REFERENCES branches(id),
    department_id UUID,
    name VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const SALDO_SQL: &str = r"
CREATE TABLE IF NOT EXISTS saldos (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id),
    branch_id UUID NOT NULL REFERENCES branches(id),
    opening_balance BIGINT NOT NULL DEFAULT 0,
    inflow_total BIGINT NOT NULL DEFAULT 0,
    voucher_limit BIGINT NOT NULL DEFAULT 0,
    advance_limit BIGINT NOT NULL DEFAULT 0,
    voucher_used BIGINT NOT NULL DEFAULT 0,
    advance_used BIGINT NOT NULL DEFAULT 0,
    closing_balance BIGINT NOT NULL DEFAULT 0,
    month_year VARCHAR(7) NOT NULL,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_by VARCHAR(255) NOT NULL,
    updated_by VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_saldos_scope UNIQUE (company_id, branch_id),
    CONSTRAINT chk_saldos_closing CHECK (
        closing_balance >= 0
        AND closing_balance = opening_balance + inflow_total - voucher_used - advance_used
    ),
    CONSTRAINT chk_saldos_limits CHECK (voucher_limit >= 0 AND advance_limit >= 0)
);

CREATE TABLE IF NOT EXISTS saldo_months (
    id UUID PRIMARY KEY,
    company_id UUID NOT NULL REFERENCES companies(id),
    branch_id UUID NOT NULL REFERENCES branches(id),
    month_year VARCHAR(7) NOT NULL,
    month SMALLINT NOT NULL CHECK (month BETWEEN 1 AND 12),
    year INTEGER NOT NULL,
    opening_balance BIGINT NOT NULL DEFAULT 0,
    inflow_total BIGINT NOT NULL DEFAULT 0,
    voucher_used BIGINT NOT NULL DEFAULT 0,
    advance_used BIGINT NOT NULL DEFAULT 0,
    closing_balance BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_saldo_months_scope UNIQUE (company_id, branch_id, month_year)
);

CREATE TABLE IF NOT EXISTS saldo_histories (
    id UUID PRIMARY KEY,
    description VARCHAR(255) NOT NULL,
    company_id UUID NOT NULL REFERENCES companies(id),
    branch_id UUID NOT NULL REFERENCES branches(id),
    opening_balance BIGINT NOT NULL,
    in_amount BIGINT NOT NULL DEFAULT 0,
    out_amount BIGINT NOT NULL DEFAULT 0,
    closing_balance BIGINT NOT NULL,
    created_by VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_saldo_histories_scope_created
    ON saldo_histories (company_id, branch_id, created_at);
CREATE INDEX IF NOT EXISTS idx_saldo_histories_description
    ON saldo_histories (company_id, branch_id, description);
";

const COUNTERS_SQL: &str = r"
CREATE TABLE IF NOT EXISTS counters (
    id UUID PRIMARY KEY,
    key_counter VARCHAR(64) NOT NULL UNIQUE,
    counter_value BIGINT NOT NULL CHECK (counter_value > 0),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const DOCUMENTS_SQL: &str = r"
CREATE TABLE IF NOT EXISTS bkk_headers (
    id UUID PRIMARY KEY,
    num VARCHAR(64) NOT NULL UNIQUE,
    number_seq BIGINT NOT NULL,
    company_id UUID NOT NULL REFERENCES companies(id),
    branch_id UUID NOT NULL REFERENCES branches(id),
    kasbon_id UUID,
    invoice_id UUID,
    release_date DATE,
    paid_date DATE,
    total_amount BIGINT NOT NULL CHECK (total_amount > 0),
    status VARCHAR(16) NOT NULL DEFAULT '',
    status_approve SMALLINT NOT NULL DEFAULT 0 CHECK (status_approve BETWEEN 0 AND 2),
    created_by VARCHAR(255) NOT NULL,
    updated_by VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_bkk_headers_scope ON bkk_headers (company_id, branch_id);
CREATE INDEX IF NOT EXISTS idx_bkk_headers_invoice ON bkk_headers (invoice_id);

CREATE TABLE IF NOT EXISTS bkk_details (
    id UUID PRIMARY KEY,
    bkk_header_id UUID NOT NULL REFERENCES bkk_headers(id) ON DELETE CASCADE,
    trx_id UUID,
    lines_desc TEXT NOT NULL,
    lines_date DATE NOT NULL,
    lines_amount BIGINT NOT NULL CHECK (lines_amount > 0),
    lines_file TEXT,
    status VARCHAR(32) NOT NULL DEFAULT '',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_bkk_details_header ON bkk_details (bkk_header_id);

CREATE TABLE IF NOT EXISTS invoice_headers (
    id UUID PRIMARY KEY,
    num VARCHAR(64) NOT NULL UNIQUE,
    number_seq BIGINT NOT NULL,
    invoice_type VARCHAR(64) NOT NULL,
    amount BIGINT NOT NULL CHECK (amount >= 0),
    sisa_amount BIGINT NOT NULL DEFAULT 0 CHECK (sisa_amount >= 0),
    description TEXT NOT NULL,
    invoice_date DATE NOT NULL,
    file TEXT,
    status VARCHAR(64) NOT NULL DEFAULT '',
    status_approve SMALLINT NOT NULL DEFAULT 0 CHECK (status_approve BETWEEN 0 AND 4),
    company_id UUID NOT NULL REFERENCES companies(id),
    branch_id UUID NOT NULL REFERENCES branches(id),
    created_by VARCHAR(255) NOT NULL,
    updated_by VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS invoice_details (
    id UUID PRIMARY KEY,
    invoice_header_id UUID NOT NULL REFERENCES invoice_headers(id) ON DELETE CASCADE,
    bkk_header_id UUID NOT NULL REFERENCES bkk_headers(id),
    status VARCHAR(32) NOT NULL DEFAULT '',
    total_amount BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_invoice_details_header ON invoice_details (invoice_header_id);

CREATE TABLE IF NOT EXISTS tarik_danas (
    id UUID PRIMARY KEY,
    withdrawal_type VARCHAR(64) NOT NULL,
    amount BIGINT NOT NULL CHECK (amount > 0),
    description VARCHAR(255) NOT NULL,
    withdrawal_date DATE NOT NULL,
    file TEXT,
    company_id UUID NOT NULL REFERENCES companies(id),
    branch_id UUID NOT NULL REFERENCES branches(id),
    created_by VARCHAR(255) NOT NULL,
    updated_by VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT uq_tarik_danas_description UNIQUE (company_id, branch_id, description)
);

CREATE TABLE IF NOT EXISTS kasbons (
    id UUID PRIMARY KEY,
    num VARCHAR(64) NOT NULL UNIQUE,
    number_seq BIGINT NOT NULL,
    kasbon_type VARCHAR(64) NOT NULL,
    amount BIGINT NOT NULL CHECK (amount > 0),
    description TEXT NOT NULL,
    kasbon_date DATE NOT NULL,
    file TEXT,
    status VARCHAR(64) NOT NULL DEFAULT '',
    release_date DATE,
    paid_date DATE,
    settled_date DATE,
    employee_id UUID NOT NULL REFERENCES employees(id),
    bkk_header_id UUID,
    company_id UUID NOT NULL REFERENCES companies(id),
    branch_id UUID NOT NULL REFERENCES branches(id),
    department_id UUID,
    created_by VARCHAR(255) NOT NULL,
    updated_by VARCHAR(255),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS kasbons CASCADE;
DROP TABLE IF EXISTS tarik_danas CASCADE;
DROP TABLE IF EXISTS invoice_details CASCADE;
DROP TABLE IF EXISTS invoice_headers CASCADE;
DROP TABLE IF EXISTS bkk_details CASCADE;
DROP TABLE IF EXISTS bkk_headers CASCADE;
DROP TABLE IF EXISTS counters CASCADE;
DROP TABLE IF EXISTS saldo_histories CASCADE;
DROP TABLE IF EXISTS saldo_months CASCADE;
DROP TABLE IF EXISTS saldos CASCADE;
DROP TABLE IF EXISTS employees CASCADE;
DROP TABLE IF EXISTS branches CASCADE;
DROP TABLE IF EXISTS companies CASCADE;
";
