use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

const SCHEMA: &str = r#"{
  "schema_version": 1,
  "schema": {
    "name": "shop",
    "tables": [
      {
        "name": "customer",
        "class_name": "Customer",
        "repository_name": "Customers",
        "columns": [
          { "name": "customer_id", "db_type": "int(10) unsigned", "primary_key": true, "auto_increment": true },
          { "name": "email", "db_type": "varchar(120)" },
          { "name": "created_at", "db_type": "datetime", "default": "CURRENT_TIMESTAMP" }
        ]
      }
    ]
  }
}"#;

const DIFF: &str = r#"{
  "schema_version": 1,
  "diff": {
    "entries": [
      {
        "kind": "create_table",
        "name": "post",
        "columns": [
          { "name": "id", "db_type": "bigint unsigned", "primary_key": true, "auto_increment": true },
          { "name": "title", "db_type": "varchar(200)" }
        ]
      },
      {
        "kind": "alter_table",
        "name": "customer",
        "operations": [ { "kind": "drop_column", "name": "fax" } ]
      }
    ]
  }
}"#;

fn write_input(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.display().to_string()
}

fn ormgen(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ormgen").unwrap();
    cmd.current_dir(dir).env_remove("ORMGEN_CONFIG");
    cmd
}

#[test]
fn backends_are_listed() {
    let dir = TempDir::new().unwrap();
    ormgen(dir.path())
        .arg("backends")
        .assert()
        .success()
        .stdout(predicate::str::contains("hibernate"))
        .stdout(predicate::str::contains("django"))
        .stdout(predicate::str::contains("laravel"))
        .stdout(predicate::str::contains("yii2"));
}

#[test]
fn entities_are_written() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "schema.json", SCHEMA);

    ormgen(dir.path())
        .args(["entities", "--backend", "ef", "--input", &input, "--output", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated"));

    let code = std::fs::read_to_string(dir.path().join("out/DataContextGenerated.cs")).unwrap();
    assert!(code.contains("public DbSet<Customer> Customers"));
    assert!(code.contains("[DatabaseGenerated(DatabaseGeneratedOption.Computed)]"));
}

#[test]
fn dry_run_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "schema.json", SCHEMA);

    ormgen(dir.path())
        .args(["entities", "-b", "django", "-i", &input, "-o", "out", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("models.py"))
        .stdout(predicate::str::contains("Would generate"));

    assert!(!dir.path().join("out").exists());
}

#[test]
fn config_file_in_working_directory_is_used() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "schema.json", SCHEMA);
    std::fs::write(
        dir.path().join("ormgen.toml"),
        "output_dir = \"gen\"\n\n[java]\npackage = \"org.shop.model\"\n",
    )
    .unwrap();

    ormgen(dir.path())
        .args(["entities", "-b", "jooq", "-i", &input])
        .assert()
        .success();

    let code = std::fs::read_to_string(
        dir.path()
            .join("gen/src/main/java/org/shop/model/Customer.java"),
    )
    .unwrap();
    assert!(code.starts_with("package org.shop.model;"));
}

#[test]
fn irreversible_migration_is_reported() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "diff.json", DIFF);

    ormgen(dir.path())
        .args(["migration", "-b", "laravel", "-i", &input, "-o", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("irreversible"))
        .stderr(predicate::str::contains("fax"));

    let files: Vec<_> = std::fs::read_dir(dir.path().join("out/database/migrations"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(files.len(), 1);
    let code = std::fs::read_to_string(&files[0]).unwrap();
    assert!(code.contains("Schema::create('post'"));
    assert!(code.contains("return false;"));
}

#[test]
fn unknown_backend_exits_with_two() {
    let dir = TempDir::new().unwrap();
    let input = write_input(dir.path(), "schema.json", SCHEMA);

    ormgen(dir.path())
        .args(["entities", "-b", "sqlalchemy", "-i", &input])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("sqlalchemy"));
}

#[test]
fn missing_input_exits_with_two() {
    let dir = TempDir::new().unwrap();

    ormgen(dir.path())
        .args(["migration", "-b", "yii2", "-i", "missing.json"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("missing.json"));
}

#[test]
fn failed_table_exits_with_one() {
    let dir = TempDir::new().unwrap();
    let input = write_input(
        dir.path(),
        "schema.json",
        r#"{"name": "shop", "tables": [{"name": "t", "class_name": "T",
            "columns": [{"name": "id", "db_type": "geometry", "primary_key": true}]}]}"#,
    );

    ormgen(dir.path())
        .args(["entities", "-b", "hibernate", "-i", &input, "-o", "out"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("geometry"));
}
