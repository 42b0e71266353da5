//! Embedded schema migrations, oldest first.

use super::Migration;

pub static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 20240601090000,
        name: "create_inventory",
        statements: &[
            r#"CREATE TABLE cable_types (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                prefix VARCHAR(16) NOT NULL,
                description TEXT,
                unit TEXT NOT NULL DEFAULT 'meters',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT cable_types_prefix_key UNIQUE (prefix),
                CONSTRAINT cable_types_prefix_format CHECK (prefix ~ '^[A-Z0-9]+$')
            )"#,
            r#"CREATE TABLE projects (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT,
                status TEXT NOT NULL DEFAULT 'active',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )"#,
            r#"CREATE TABLE boxes (
                id BIGSERIAL PRIMARY KEY,
                number VARCHAR(32) NOT NULL,
                cable_type_id BIGINT NOT NULL REFERENCES cable_types (id),
                initial_quantity NUMERIC(12, 3) NOT NULL,
                current_quantity NUMERIC(12, 3) NOT NULL,
                status TEXT NOT NULL DEFAULT 'new',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT boxes_number_key UNIQUE (number),
                CONSTRAINT boxes_status_check
                    CHECK (status IN ('new', 'open', 'closed', 'exhausted')),
                CONSTRAINT boxes_quantity_check
                    CHECK (initial_quantity > 0
                           AND current_quantity >= 0
                           AND current_quantity <= initial_quantity)
            )"#,
            r#"CREATE TABLE usages (
                id BIGSERIAL PRIMARY KEY,
                box_id BIGINT NOT NULL REFERENCES boxes (id),
                project_id BIGINT NOT NULL REFERENCES projects (id),
                quantity_used NUMERIC(12, 3) NOT NULL CHECK (quantity_used >= 0),
                technician TEXT NOT NULL,
                used_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                notes TEXT
            )"#,
            "CREATE INDEX idx_boxes_cable_type ON boxes (cable_type_id)",
            "CREATE INDEX idx_boxes_created_at ON boxes (created_at DESC, id DESC)",
            "CREATE INDEX idx_usages_box ON usages (box_id, used_at)",
        ],
    },
    Migration {
        version: 20240601090100,
        name: "usages_append_only",
        statements: &[
            r#"CREATE FUNCTION usages_reject_change() RETURNS trigger AS $$
            BEGIN
                RAISE EXCEPTION 'usages are append-only';
            END;
            $$ LANGUAGE plpgsql"#,
            r#"CREATE TRIGGER usages_append_only
                BEFORE UPDATE OR DELETE ON usages
                FOR EACH ROW EXECUTE FUNCTION usages_reject_change()"#,
        ],
    },
];
