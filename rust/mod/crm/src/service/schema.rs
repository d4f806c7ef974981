use subhub_core::ServiceError;
use subhub_sql::SQLStore;

/// SQL DDL statements to initialize the CRM database schema.
///
/// Each table stores the full JSON document in a `data` TEXT column,
/// with indexed columns extracted for filtering, joins and aggregation.
/// Dates are ISO `YYYY-MM-DD` TEXT so range predicates compare
/// lexicographically.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS customers (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        name TEXT,
        name_norm TEXT,
        note TEXT,
        create_at TEXT,
        update_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS subscriptions (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        customer_id TEXT,
        package_id TEXT,
        plan_id TEXT,
        contract_due TEXT,
        billing_due TEXT,
        status TEXT,
        create_at TEXT,
        update_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS app_registrations (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        customer_id TEXT,
        app_id TEXT,
        subscription_id TEXT,
        mac TEXT,
        valid_until TEXT,
        status TEXT,
        create_at TEXT,
        update_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS apps (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        name TEXT,
        create_at TEXT,
        update_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS payments (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        customer_id TEXT,
        paid_at TEXT,
        method TEXT,
        amount REAL,
        kind TEXT,
        details TEXT,
        purchase_ref TEXT,
        create_at TEXT,
        update_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS plans (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        kind TEXT,
        screens INTEGER,
        months INTEGER,
        price REAL,
        create_at TEXT,
        update_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS packages (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        contract_label TEXT,
        screens INTEGER,
        create_at TEXT,
        update_at TEXT
    )",
    "CREATE TABLE IF NOT EXISTS contacts (
        id TEXT PRIMARY KEY,
        data TEXT NOT NULL,
        customer_id TEXT,
        phone TEXT,
        name TEXT,
        create_at TEXT,
        update_at TEXT
    )",
    // Indexes
    "CREATE INDEX IF NOT EXISTS idx_cust_name ON customers(name)",
    "CREATE INDEX IF NOT EXISTS idx_cust_name_norm ON customers(name_norm)",
    "CREATE INDEX IF NOT EXISTS idx_sub_customer ON subscriptions(customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_sub_status ON subscriptions(status)",
    "CREATE INDEX IF NOT EXISTS idx_sub_contract_due ON subscriptions(contract_due)",
    "CREATE INDEX IF NOT EXISTS idx_sub_billing_due ON subscriptions(billing_due)",
    "CREATE INDEX IF NOT EXISTS idx_reg_customer ON app_registrations(customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_reg_mac ON app_registrations(mac)",
    "CREATE INDEX IF NOT EXISTS idx_reg_valid_until ON app_registrations(valid_until)",
    "CREATE INDEX IF NOT EXISTS idx_pay_customer ON payments(customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_pay_paid_at ON payments(paid_at)",
    "CREATE INDEX IF NOT EXISTS idx_contact_customer ON contacts(customer_id)",
];

/// Create all tables and indexes if they do not exist.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    for ddl in SCHEMA {
        sql.exec(ddl, &[])
            .map_err(|e| ServiceError::Storage(e.to_string()))?;
    }
    Ok(())
}
