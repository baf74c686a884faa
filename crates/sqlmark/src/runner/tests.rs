use super::*;
use crate::compile::InjectionPolicy;
use crate::driver::DriverRow;
use crate::monitor::StatsMonitor;
use crate::unique_id::candidate;
use serde_json::json;
use std::collections::VecDeque;

#[derive(Default)]
struct ScriptedDriver {
    executed: Vec<String>,
    responses: VecDeque<SqlResult<ResultHandle>>,
    affected: u64,
    insert_id: u64,
}

impl ScriptedDriver {
    fn then(mut self, response: SqlResult<ResultHandle>) -> Self {
        self.responses.push_back(response);
        self
    }
}

impl Driver for ScriptedDriver {
    fn execute(&mut self, sql: &str) -> SqlResult<ResultHandle> {
        self.executed.push(sql.to_string());
        self.responses
            .pop_front()
            .unwrap_or(Ok(ResultHandle::Rows(Vec::new())))
    }

    fn execute_batch(&mut self, sql: &str) -> SqlResult<Vec<ResultHandle>> {
        self.executed.push(sql.to_string());
        Ok(Vec::new())
    }

    fn last_insert_id(&self) -> u64 {
        self.insert_id
    }

    fn affected_rows(&self) -> u64 {
        self.affected
    }

    fn last_error(&self) -> String {
        String::new()
    }
}

fn user_row(id: i64, name: &str) -> DriverRow {
    DriverRow::new().with("id", id).with("name", name)
}

#[test]
fn test_run_single_materializes_rows() {
    let driver = ScriptedDriver::default().then(Ok(ResultHandle::Rows(vec![
        user_row(1, "ann"),
        user_row(2, "bob"),
    ])));
    let mut runner = Runner::new(driver);

    let result = runner.run_single("SELECT id, name FROM users").unwrap();
    assert_eq!(result.affected_rows, 2);
    assert_eq!(result.rows.len(), 2);
    assert_eq!(result.first().unwrap()["name"], json!("ann"));
    assert_eq!(result.last().unwrap()["id"], json!(2));
    assert_eq!(result.last_insert_id, None);
}

#[test]
fn test_insert_reports_last_insert_id() {
    let driver = ScriptedDriver {
        insert_id: 41,
        affected: 1,
        ..Default::default()
    }
    .then(Ok(ResultHandle::Empty));
    let mut runner = Runner::new(driver);

    let result = runner.insert("users", [("name", "ann")]).unwrap();
    assert_eq!(result.last_insert_id, Some(41));
    assert_eq!(result.affected_rows, 1);
    assert_eq!(
        runner.driver().executed,
        vec!["INSERT INTO `users` (`name`) VALUES ('ann')"]
    );
}

#[test]
fn test_driver_error_names_the_statement() {
    let driver = ScriptedDriver::default().then(Err(SqlError::query("", "Unknown column 'x'")));
    let mut runner = Runner::new(driver);

    let err = runner.run_single("SELECT x FROM t").unwrap_err();
    match err {
        SqlError::Query { sql, message } => {
            assert_eq!(sql, "SELECT x FROM t");
            assert_eq!(message, "Unknown column 'x'");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_voided_statement_never_reaches_driver() {
    let config = RunnerConfig::new().injection_policy(InjectionPolicy::VoidQuery);
    let mut runner = Runner::with_config(ScriptedDriver::default(), config);

    let spec = WhereSpec::new().eq("name", Token::raw("x' OR 1=1"));
    let result = runner.select("users", &spec).unwrap();
    assert!(result.voided);
    assert!(result.rows.is_empty());
    assert!(runner.driver().executed.is_empty());
}

#[test]
fn test_injection_raises_by_default() {
    let mut runner = Runner::new(ScriptedDriver::default());
    let spec = WhereSpec::new().eq("name", Token::raw("x' OR 1=1"));
    let err = runner.select("users", &spec).unwrap_err();
    assert!(err.is_injection_suspected());
    assert!(runner.driver().executed.is_empty());
}

#[test]
fn test_facade_sql() {
    let mut runner = Runner::new(ScriptedDriver::default());
    let spec = WhereSpec::new().eq("id", 7);

    runner.select("users", &spec).unwrap();
    runner.update("users", [("name", "ann")], &spec).unwrap();
    runner.delete("users", &spec).unwrap();
    runner.delete("users", &WhereSpec::new()).unwrap();

    assert_eq!(
        runner.driver().executed,
        vec![
            "SELECT * FROM `users` WHERE `id` = '7'",
            "UPDATE `users` SET `name` = 'ann' WHERE `id` = '7'",
            "DELETE FROM `users` WHERE `id` = '7'",
            "DELETE FROM `users` WHERE 1=0",
        ]
    );
}

#[test]
fn test_affected_rows_fall_back_to_driver() {
    let driver = ScriptedDriver {
        affected: 3,
        ..Default::default()
    }
    .then(Ok(ResultHandle::Empty))
    .then(Ok(ResultHandle::Affected(5)));
    let mut runner = Runner::new(driver);

    assert_eq!(runner.run_single("UPDATE t SET a = 1").unwrap().affected_rows, 3);
    assert_eq!(runner.run_single("DELETE FROM t").unwrap().affected_rows, 5);
}

#[test]
fn test_select_first() {
    let driver = ScriptedDriver::default()
        .then(Ok(ResultHandle::Rows(vec![user_row(9, "zed")])))
        .then(Ok(ResultHandle::Rows(Vec::new())));
    let mut runner = Runner::new(driver);
    let spec = WhereSpec::new().eq("name", "zed");

    let found = runner.select_first("users", &spec).unwrap().unwrap();
    assert_eq!(found["id"], json!(9));
    assert!(runner.select_first("users", &spec).unwrap().is_none());
    assert_eq!(
        runner.driver().executed[0],
        "SELECT * FROM `users` WHERE `name` = 'zed' LIMIT 1"
    );
}

#[test]
fn test_unique_id_probes_until_free() {
    let taken = DriverRow::new().with("1", 1);
    let driver = ScriptedDriver::default().then(Ok(ResultHandle::Rows(vec![taken])));
    let mut runner = Runner::new(driver);

    let id = runner.unique_id("orders", "code", "seed").unwrap().unwrap();
    assert_eq!(id, candidate("seed", 1, 10));

    let executed = &runner.driver().executed;
    assert_eq!(executed.len(), 2);
    assert_eq!(
        executed[0],
        format!(
            "SELECT 1 FROM `orders` WHERE `code` = '{}' LIMIT 1",
            candidate("seed", 0, 10)
        )
    );
}

#[test]
fn test_unique_id_propagates_driver_errors() {
    let driver = ScriptedDriver::default().then(Err(SqlError::Connection("gone".into())));
    let mut runner = Runner::new(driver);
    let err = runner.unique_id("orders", "code", "seed").unwrap_err();
    assert!(matches!(err, SqlError::Connection(_)));
}

#[test]
fn test_unique_id_ignores_fallback_policy() {
    let driver = ScriptedDriver::default().then(Err(SqlError::Connection("gone".into())));
    let config = RunnerConfig::new().on_failure(|_| ExecutionResult::default());
    let mut runner = Runner::with_config(driver, config);

    let err = runner.unique_id("orders", "code", "seed").unwrap_err();
    assert!(matches!(err, SqlError::Connection(_)));
    assert_eq!(runner.driver().executed.len(), 1);

    // Ordinary statements still fall back.
    let driver = ScriptedDriver::default().then(Err(SqlError::Connection("gone".into())));
    let config = RunnerConfig::new().on_failure(|_| ExecutionResult::default());
    let mut runner = Runner::with_config(driver, config);
    assert!(runner.run_single("SELECT 1").unwrap().rows.is_empty());
}

#[test]
fn test_unique_id_rejects_voided_existence_check() {
    let config = RunnerConfig::new().injection_policy(InjectionPolicy::VoidQuery);
    let mut runner = Runner::with_config(ScriptedDriver::default(), config);

    let err = runner.unique_id("orders", "co'de", "seed").unwrap_err();
    assert!(err.is_injection_suspected());
    assert!(runner.driver().executed.is_empty());
}

#[test]
fn test_stats_monitor_counts_statements() {
    let stats = Arc::new(StatsMonitor::new());
    let driver = ScriptedDriver::default()
        .then(Ok(ResultHandle::Rows(Vec::new())))
        .then(Err(SqlError::query("", "boom")));
    let config = RunnerConfig::new().injection_policy(InjectionPolicy::VoidQuery);
    let mut runner = Runner::with_config(driver, config).with_monitor(stats.clone());

    runner.run_single("SELECT 1").unwrap();
    runner.run_single("DELETE FROM t").unwrap_err();
    runner
        .select("t", &WhereSpec::new().eq("a", Token::raw("'")))
        .unwrap();

    let snapshot = stats.stats();
    assert_eq!(snapshot.total_queries, 2);
    assert_eq!(snapshot.select_count, 1);
    assert_eq!(snapshot.delete_count, 1);
    assert_eq!(snapshot.failed_queries, 1);
    assert_eq!(snapshot.voided_queries, 1);
}

#[test]
fn test_compile_uses_runner_policy() {
    let runner = Runner::with_config(
        ScriptedDriver::default(),
        RunnerConfig::new().injection_policy(InjectionPolicy::VoidQuery),
    );
    let stmt = runner
        .compile(&Delete::new("t").filter(WhereSpec::new().eq("a", Token::raw("'"))))
        .unwrap();
    assert!(stmt.is_voided());
}
