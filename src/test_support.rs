use crate::adapters::sqlite::SqliteQueryExecutor;
use crate::db::Database;
use crate::engine::DashboardEngine;
use crate::models::EngineSettings;
use rusqlite::Connection;
use std::sync::Arc;

/// Miniature PSA reporting schema with a handful of tickets.
pub const PSA_FIXTURE_SQL: &str = "
CREATE TABLE TStatus (Tstatus INTEGER PRIMARY KEY, tstatusdesc TEXT NOT NULL);
CREATE TABLE Priority (PriorityId INTEGER PRIMARY KEY, pdesc TEXT NOT NULL);
CREATE TABLE Area (Aarea INTEGER PRIMARY KEY, aareadesc TEXT NOT NULL);
CREATE TABLE Uname (Unum INTEGER PRIMARY KEY, uname TEXT NOT NULL);
CREATE TABLE RequestType (RTid INTEGER PRIMARY KEY, rtdesc TEXT NOT NULL);
CREATE TABLE Faults (
  Faultid INTEGER PRIMARY KEY,
  Symptom TEXT NOT NULL,
  Status INTEGER NOT NULL,
  Seriousness INTEGER NOT NULL,
  Areaint INTEGER NOT NULL,
  Assignedtoint INTEGER NOT NULL,
  Sectio_ TEXT NOT NULL,
  RequestTypeNew INTEGER NOT NULL,
  Dateoccured TEXT NOT NULL,
  Datecleared TEXT,
  FixByDate TEXT,
  SLAState TEXT NOT NULL,
  FDeleted INTEGER NOT NULL DEFAULT 0
);
INSERT INTO TStatus VALUES (1, 'New'), (2, 'In Progress'), (9, 'Closed');
INSERT INTO Priority VALUES (1, 'Critical'), (2, 'High'), (3, 'Medium'), (4, 'Low');
INSERT INTO Area VALUES (1, 'Acme Corp'), (2, 'Globex');
INSERT INTO Uname VALUES (1, 'Alice'), (2, 'Bob');
INSERT INTO RequestType VALUES (1, 'Incident'), (2, 'Service Request');
INSERT INTO Faults VALUES
  (1, 'Printer down', 1, 2, 1, 1, '1st Line', 1, '2026-01-05T09:00:00Z', NULL, '2026-01-06T09:00:00Z', 'I', 0),
  (2, 'VPN drops', 2, 1, 2, 2, '2nd Line', 1, '2026-01-06T10:00:00Z', NULL, '2026-01-06T14:00:00Z', 'O', 0),
  (3, 'New laptop', 9, 3, 1, 1, '1st Line', 2, '2026-01-02T08:00:00Z', '2026-01-04T16:00:00Z', NULL, 'I', 0),
  (4, 'Mail bounce', 1, 4, 2, 0, '1st Line', 1, '2026-01-07T11:00:00Z', NULL, '2026-01-07T12:00:00Z', 'O', 0),
  (5, 'Duplicate', 1, 3, 1, 1, '1st Line', 1, '2026-01-07T12:00:00Z', NULL, NULL, 'I', 1);
";

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub db: Arc<Database>,
    pub executor: Arc<SqliteQueryExecutor>,
}

pub fn harness() -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = Arc::new(Database::new(&dir.path().join("state.sqlite")).expect("state database"));

    let source_path = dir.path().join("source.sqlite");
    {
        let conn = Connection::open(&source_path).expect("source database");
        conn.execute_batch(PSA_FIXTURE_SQL).expect("fixture schema");
    }
    let executor = Arc::new(SqliteQueryExecutor::open(db.clone(), &source_path, 500).expect("executor"));

    Harness { dir, db, executor }
}

impl Harness {
    pub fn engine(&self) -> DashboardEngine {
        DashboardEngine::new(
            self.db.clone(),
            self.db.clone(),
            self.executor.clone(),
            EngineSettings::default(),
        )
    }
}
