//! Opt-in smoke test: boot embedded PostgreSQL and apply the portal schema.
//! Run with `RUN_PG_EMBEDDED=1` and `--ignored`.

#[path = "support/pg_embed.rs"]
mod pg_embed;

mod support;

use postgres::{Client, NoTls};
use support::{migrate_schema, reset_database};

const TEST_DB: &str = "portal_smoke";

#[test]
#[ignore = "requires embedded Postgres binaries; opt-in via RUN_PG_EMBEDDED=1"]
fn migrations_create_the_portal_tables() {
    if std::env::var("RUN_PG_EMBEDDED").as_deref() != Ok("1") {
        eprintln!("SKIP-TEST-CLUSTER: set RUN_PG_EMBEDDED=1 to run");
        return;
    }

    let cluster = pg_embed::test_cluster().expect("embedded Postgres should start");
    reset_database(&cluster, TEST_DB).expect("fresh database");
    let url = cluster.connection().database_url(TEST_DB);
    migrate_schema(&url).expect("migrations apply");

    let mut client = Client::connect(&url, NoTls).expect("connect");
    let rows = client
        .query(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_name <> '__diesel_schema_migrations' \
             ORDER BY table_name",
            &[],
        )
        .expect("list tables");
    let tables: Vec<String> = rows.iter().map(|row| row.get(0)).collect();
    assert_eq!(
        tables,
        [
            "accommodations",
            "events",
            "payments",
            "registrations",
            "team_registrations",
            "teams",
            "users",
        ]
    );
}
