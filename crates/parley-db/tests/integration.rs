use parley_db::{create_pool, run_migrations, DbRuntimeSettings};

#[test]
fn db_initialization_works() {
    let temp_file = tempfile::NamedTempFile::new().expect("failed to create temp file");
    let pool = create_pool(
        temp_file.path().to_str().expect("temp path should be utf-8"),
        DbRuntimeSettings::default(),
    )
    .expect("failed to create pool");
    let conn = pool.get().expect("failed to get connection");
    let applied = run_migrations(&conn).expect("failed to run migrations");
    assert_eq!(applied, 1);

    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )
        .expect("failed to prepare table query");
    let tables: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .expect("failed to execute table query")
        .map(|r| r.expect("failed to read table name"))
        .collect();

    assert_eq!(tables, vec!["_parley_migrations", "results"]);
}

#[test]
fn schema_is_visible_across_pooled_connections() {
    let temp_file = tempfile::NamedTempFile::new().expect("failed to create temp file");
    let pool = create_pool(
        temp_file.path().to_str().expect("temp path should be utf-8"),
        DbRuntimeSettings::default(),
    )
    .expect("failed to create pool");

    {
        let conn = pool.get().expect("failed to get connection");
        run_migrations(&conn).expect("failed to run migrations");
        conn.execute(
            "INSERT INTO results (request_id, response, written_at) VALUES ('abc', 'It is noon.', 0)",
            [],
        )
        .expect("insert should succeed");
    }

    let other = pool.get().expect("failed to get second connection");
    let response: String = other
        .query_row(
            "SELECT response FROM results WHERE request_id = 'abc'",
            [],
            |row| row.get(0),
        )
        .expect("row should be visible");
    assert_eq!(response, "It is noon.");
}
