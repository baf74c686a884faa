use super::*;
use crate::compile::InjectionPolicy;
use crate::spec::WhereSpec;
use serde_json::json;

#[test]
fn test_kind_detection() {
    assert_eq!(StatementKind::from_sql("SELECT 1"), StatementKind::Select);
    assert_eq!(StatementKind::from_sql("  select * from t"), StatementKind::Select);
    assert_eq!(
        StatementKind::from_sql("/* hint */ (SELECT 1) UNION (SELECT 2)"),
        StatementKind::Select
    );
    assert_eq!(
        StatementKind::from_sql("-- note\nINSERT INTO t VALUES (1)"),
        StatementKind::Insert
    );
    assert_eq!(StatementKind::from_sql("REPLACE INTO t VALUES (1)"), StatementKind::Insert);
    assert_eq!(StatementKind::from_sql("update t set a = 1"), StatementKind::Update);
    assert_eq!(StatementKind::from_sql("DELETE FROM t"), StatementKind::Delete);
    assert_eq!(StatementKind::from_sql("CREATE TABLE t (id INT)"), StatementKind::Raw);
    assert_eq!(StatementKind::from_sql("SELECTED"), StatementKind::Raw);
    assert_eq!(StatementKind::from_sql(""), StatementKind::Raw);
}

#[test]
fn test_select_all() {
    assert_eq!(Select::new("users").to_sql(), "SELECT * FROM `users`");
}

#[test]
fn test_select_full() {
    let sql = Select::new("users")
        .columns(["id", "u.name", "COUNT(*) AS n|q"])
        .filter(WhereSpec::new().eq("status", 1).in_list("id", [2, 3, 4]))
        .order_by_desc("created_at")
        .order_by("id")
        .limit(10)
        .offset(20)
        .to_sql();
    assert_eq!(
        sql,
        "SELECT `id`, `u`.`name`, COUNT(*) AS n FROM `users` \
         WHERE `status` = '1' AND `id` IN ('2','3','4') \
         ORDER BY `created_at` DESC, `id` ASC LIMIT 10 OFFSET 20"
    );
}

#[test]
fn test_select_offset_without_limit() {
    let sql = Select::new("t").offset(5).to_sql();
    assert_eq!(sql, "SELECT * FROM `t` LIMIT 18446744073709551615 OFFSET 5");
}

#[test]
fn test_select_kind_and_errors() {
    let stmt = Select::new("t").to_statement().unwrap();
    assert_eq!(stmt.kind(), StatementKind::Select);
    assert!(!stmt.is_voided());

    let err = Select::new("").to_statement().unwrap_err();
    assert!(matches!(err, SqlError::Validation(_)));

    let err = Select::new("t")
        .filter(WhereSpec::new().cmp("a", "LIKE", "x"))
        .to_statement()
        .unwrap_err();
    assert!(matches!(err, SqlError::OperatorUnsupported(_)));
}

#[test]
fn test_select_voided_by_policy() {
    let compiler = Compiler::new(&MysqlEscape).with_policy(InjectionPolicy::VoidQuery);
    let stmt = Select::new("t")
        .filter(WhereSpec::new().eq("a", Token::raw("x' OR 1=1")))
        .build(&compiler)
        .unwrap();
    assert!(stmt.is_voided());
    assert_eq!(stmt.sql(), "");
    assert_eq!(stmt.kind(), StatementKind::Select);
}

#[test]
fn test_insert_single_row() {
    let sql = Insert::new("users")
        .set("name", "O'Brien")
        .set("created_at", Token::value("NOW()|q"))
        .set("deleted_at", None::<String>)
        .to_sql();
    assert_eq!(
        sql,
        r"INSERT INTO `users` (`name`, `created_at`, `deleted_at`) VALUES ('O\'Brien', NOW(), NULL)"
    );
}

#[test]
fn test_insert_many_rows_matched_by_name() {
    let stmt = Insert::new("t")
        .row([("a", 1), ("b", 2)])
        .row([("b", 4), ("a", 3)])
        .to_statement()
        .unwrap();
    assert_eq!(stmt.sql(), "INSERT INTO `t` (`a`, `b`) VALUES ('1', '2'), ('3', '4')");
    assert_eq!(stmt.kind(), StatementKind::Insert);
}

#[test]
fn test_insert_json_rows() {
    let stmt = Insert::new("t")
        .json_rows(&json!([{ "a": 1, "b": "x|c" }, { "a": 2, "b": null }]))
        .unwrap()
        .to_statement()
        .unwrap();
    assert_eq!(
        stmt.sql(),
        "INSERT INTO `t` (`a`, `b`) VALUES ('1', `x`), ('2', NULL)"
    );
}

#[test]
fn test_insert_validation() {
    let err = Insert::new("t").to_statement().unwrap_err();
    assert!(matches!(err, SqlError::Validation(_)));

    let err = Insert::new("t")
        .row([("a", 1)])
        .row([("b", 2)])
        .to_statement()
        .unwrap_err();
    assert!(matches!(err, SqlError::Validation(ref m) if m.contains("missing column 'a'")));

    let err = Insert::new("t")
        .row([("a", 1)])
        .row([("a", 2), ("b", 3)])
        .to_statement()
        .unwrap_err();
    assert!(matches!(err, SqlError::Validation(_)));
}

#[test]
fn test_insert_injection_raises_or_voids() {
    let insert = Insert::new("t").set("a", Token::raw("'oops"));
    assert!(insert.to_statement().unwrap_err().is_injection_suspected());

    let compiler = Compiler::new(&MysqlEscape).with_policy(InjectionPolicy::VoidQuery);
    let stmt = insert.build(&compiler).unwrap();
    assert!(stmt.is_voided());
    assert_eq!(stmt.kind(), StatementKind::Insert);
}

#[test]
fn test_update_with_markers() {
    let sql = Update::new("posts")
        .set("title", "Hello")
        .set("hits", Token::value("`hits` + 1|q"))
        .set("editor_id", Token::value("users.id|c"))
        .filter(WhereSpec::new().eq("id", 7))
        .to_sql();
    assert_eq!(
        sql,
        "UPDATE `posts` SET `title` = 'Hello', `hits` = `hits` + 1, `editor_id` = `users`.`id` WHERE `id` = '7'"
    );
}

#[test]
fn test_string_values_stay_literal() {
    let sql = Update::new("posts")
        .set("title", String::from("NOW()|q"))
        .filter(WhereSpec::new().eq("slug", "a|c"))
        .to_sql();
    assert_eq!(
        sql,
        "UPDATE `posts` SET `title` = 'NOW()|q' WHERE `slug` = 'a|c'"
    );
}

#[test]
fn test_update_requires_set() {
    let err = Update::new("t")
        .filter(WhereSpec::new().eq("id", 1))
        .to_statement()
        .unwrap_err();
    assert!(matches!(err, SqlError::Validation(_)));
}

#[test]
fn test_update_without_where() {
    assert_eq!(
        Update::new("t").set("a", 1).to_sql(),
        "UPDATE `t` SET `a` = '1'"
    );
}

#[test]
fn test_delete_safe_default() {
    assert_eq!(Delete::new("t").to_sql(), "DELETE FROM `t` WHERE 1=0");
    assert_eq!(Delete::new("t").allow_all().to_sql(), "DELETE FROM `t`");
}

#[test]
fn test_delete_with_where() {
    let stmt = Delete::new("sessions")
        .filter(WhereSpec::new().cmp("expires_at", "<", Token::value("NOW()|q")))
        .to_statement()
        .unwrap();
    assert_eq!(stmt.sql(), "DELETE FROM `sessions` WHERE `expires_at` < NOW()");
    assert_eq!(stmt.kind(), StatementKind::Delete);
}

#[test]
fn test_batch_statement() {
    let stmt = CompiledStatement::batch(&["SELECT 1", "SELECT 2"], vec!["a".into(), "b".into()]);
    assert_eq!(stmt.sql(), "SELECT 1;SELECT 2");
    assert_eq!(stmt.labels(), &[Label::from("a"), Label::from("b")]);
}

#[test]
fn test_label_helpers() {
    assert!(Label::from("  ").is_empty());
    assert!(!Label::from(0usize).is_empty());
    assert_eq!(Label::from(3usize).to_string(), "3");
    assert_eq!(Label::from("x").to_string(), "x");
}
