use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const HEADER: &str = "terminology_id,terminology_description,terminology_name,system,terminology_resource_type,code,display,description";

fn locutils_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("locutils");
    path
}

struct TestEnv {
    _tmp: TempDir,
    root: PathBuf,
    config_path: PathBuf,
}

impl TestEnv {
    fn db_uri(&self) -> String {
        format!("sqlite:{}/data/locutus.sqlite", self.root.display())
    }

    fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }
}

/// Temp workspace with a catalog of local files and a settings file that
/// points at it. Ontology API loading is off.
fn setup_test_env() -> TestEnv {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let terms_dir = root.join("terminologies");
    fs::create_dir_all(&terms_dir).unwrap();
    fs::write(
        terms_dir.join("data_types.csv"),
        format!(
            "{HEADER}\n\
             DataTypes,Value types,Data Types,http://example.org/dt,Terminology,string,String,Free text\n\
             DataTypes,Value types,Data Types,http://example.org/dt,Terminology,integer,Integer,Whole number\n"
        ),
    )
    .unwrap();
    fs::write(
        terms_dir.join("kf_terms.csv"),
        format!(
            "{HEADER}\n\
             KFSex,Sex values,KF Sex,http://example.org/kf/sex,Terminology,F,Female,\n"
        ),
    )
    .unwrap();
    fs::write(
        terms_dir.join("anvil_terms.csv"),
        format!(
            "{HEADER}\n\
             AnvilRace,Race values,AnVIL Race,http://example.org/anvil/race,Terminology,1,Asian,\n"
        ),
    )
    .unwrap();

    let catalog = format!(
        r#"data_types:
  organizations: [all]
  seed_db: true
  normalized_data:
    url_prefix: {dir}
    name: [data_types.csv]
kf_terms:
  organizations: [kf]
  seed_db: true
  normalized_data:
    url_prefix: {dir}
    name: [kf_terms.csv]
anvil_terms:
  organizations: [anvil]
  seed_db: true
  normalized_data:
    url_prefix: {dir}
    name: [anvil_terms.csv]
legacy:
  organizations: [all]
  seed_db: false
"#,
        dir = terms_dir.display()
    );
    let catalog_path = root.join("catalog.yaml");
    fs::write(&catalog_path, catalog).unwrap();

    let config_content = format!(
        r#"[terminologies]
catalog = "{}"
editor = "integration-test"

[ontology_api]
enabled = false
"#,
        catalog_path.display()
    );
    let config_path = root.join("locutils.toml");
    fs::write(&config_path, config_content).unwrap();

    TestEnv {
        _tmp: tmp,
        root,
        config_path,
    }
}

fn run_locutils(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = locutils_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .env_remove("LOCUTUS_DB_URI")
        .env_remove("DATABASE_URL")
        .env_remove("RUST_LOG")
        .output()
        .unwrap_or_else(|e| panic!("Failed to run locutils binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

fn hp_mondo_csv(env: &TestEnv, name: &str, hp_codes: &[&str]) -> PathBuf {
    let mut content = format!("{HEADER}\n");
    for code in hp_codes {
        content.push_str(&format!(
            "HP,Phenotypic abnormalities,Human Phenotype Ontology,http://purl.obolibrary.org/obo/hp.owl,Terminology,{code},{code} label,\n"
        ));
    }
    content.push_str(
        "MONDO,Diseases,Mondo Disease Ontology,http://purl.obolibrary.org/obo/mondo.owl,Terminology,MONDO:0000001,disease,\n",
    );
    env.write(name, &content)
}

#[test]
fn test_seed_explicit_file() {
    let env = setup_test_env();
    let csv = hp_mondo_csv(&env, "input/terms.csv", &["HP:0000001", "HP:0000002"]);
    let db = env.db_uri();

    let (stdout, stderr, success) = run_locutils(
        &env.config_path,
        &["seed", "-d", &db, "-t", csv.to_str().unwrap()],
    );
    assert!(success, "seed failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Loaded 2 terminologies."));
    assert!(stdout.contains("HP - Human Phenotype Ontology with 2 codes (created)"));
    assert!(stdout.contains("MONDO - Mondo Disease Ontology with 1 codes (created)"));
}

#[test]
fn test_seed_rerun_is_unchanged() {
    let env = setup_test_env();
    let csv = hp_mondo_csv(&env, "input/terms.csv", &["HP:0000001"]);
    let db = env.db_uri();
    let args: [&str; 5] = ["seed", "-d", &db, "-t", csv.to_str().unwrap()];

    let (_, _, first) = run_locutils(&env.config_path, &args);
    assert!(first, "first seed failed");

    let (stdout, stderr, second) = run_locutils(&env.config_path, &args);
    assert!(second, "second seed failed: {}", stderr);
    assert!(stdout.contains("HP - Human Phenotype Ontology with 1 codes (unchanged)"));
}

#[test]
fn test_seed_refuses_orphaning_codes() {
    let env = setup_test_env();
    let full = hp_mondo_csv(&env, "input/full.csv", &["HP:0000001", "HP:0000002"]);
    let partial = hp_mondo_csv(&env, "input/partial.csv", &["HP:0000001"]);
    let db = env.db_uri();

    let (_, stderr, success) =
        run_locutils(&env.config_path, &["seed", "-d", &db, "-t", full.to_str().unwrap()]);
    assert!(success, "initial seed failed: {}", stderr);

    let (_, stderr, success) = run_locutils(
        &env.config_path,
        &["seed", "-d", &db, "-t", partial.to_str().unwrap()],
    );
    assert!(!success, "seed that orphans codes should fail");
    assert!(stderr.contains("Terminology, HP, exists in the database"));
    assert!(stderr.contains("HP:0000002"));

    let (stdout, stderr, success) = run_locutils(
        &env.config_path,
        &[
            "seed",
            "-d",
            &db,
            "-t",
            partial.to_str().unwrap(),
            "--on-orphan",
            "skip",
        ],
    );
    assert!(success, "skip policy should succeed: {}", stderr);
    assert!(stdout.contains("Skipped 1 terminologies with orphaned codings:"));
    assert!(stdout.contains("HP - HP:0000002"));
    assert!(stdout.contains("MONDO - Mondo Disease Ontology with 1 codes (unchanged)"));
}

#[test]
fn test_seed_catalog_defaults_per_organization() {
    let env = setup_test_env();
    let db = env.db_uri();

    let (stdout, stderr, success) =
        run_locutils(&env.config_path, &["seed", "-d", &db, "-o", "kf"]);
    assert!(success, "seed failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Loaded 2 terminologies."));
    assert!(stdout.contains("DataTypes - Data Types with 2 codes"));
    assert!(stdout.contains("KFSex - KF Sex with 1 codes"));
    assert!(!stdout.contains("AnvilRace"));

    let (stdout, _, success) =
        run_locutils(&env.config_path, &["seed", "-d", &db, "-o", "anvil"]);
    assert!(success);
    assert!(stdout.contains("AnvilRace - AnVIL Race with 1 codes (created)"));
    assert!(!stdout.contains("KFSex"));
}

#[test]
fn test_seed_terminology_skip() {
    let env = setup_test_env();
    let db = env.db_uri();

    let (stdout, stderr, success) =
        run_locutils(&env.config_path, &["seed", "-d", &db, "-t", "skip"]);
    assert!(success, "seed failed: {}", stderr);
    assert!(stdout.contains("Loaded 0 terminologies."));
}

#[test]
fn test_seed_ontology_apis_from_settings() {
    let env = setup_test_env();
    let sheet = env.write(
        "ontology_apis.csv",
        "api_id,curie,ontology_title,system,version,short_list\n\
         ols,HP,Human Phenotype Ontology,http://purl.obolibrary.org/obo/hp.owl,2024-01-01,true\n\
         ols,MONDO,Mondo Disease Ontology,http://purl.obolibrary.org/obo/mondo.owl,2024-02-01,false\n\
         umls,LNC,LOINC,http://loinc.org,2.77,\n",
    );
    // [ontology_api] is the last table in the settings file
    let mut config = fs::read_to_string(&env.config_path).unwrap();
    config.push_str(&format!("csv_url = \"{}\"\n", sheet.display()));
    fs::write(&env.config_path, config).unwrap();
    let db = env.db_uri();

    let (stdout, stderr, success) = run_locutils(
        &env.config_path,
        &[
            "seed",
            "-d",
            &db,
            "-s",
            "ontology_api",
            "--ontology-api",
            "true",
        ],
    );
    assert!(success, "seed failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Loaded 0 terminologies."));
    assert!(stdout.contains("Loaded 2 ontology APIs."));
    assert!(stdout.contains("ols with 2 ontologies"));
    assert!(stdout.contains("umls with 1 ontologies"));
}

#[test]
fn test_seed_without_database_target_fails() {
    let env = setup_test_env();
    let (_, stderr, success) = run_locutils(&env.config_path, &["seed", "-t", "skip"]);
    assert!(!success);
    assert!(stderr.contains("no database URI"));
    assert!(!env.root.join("data").exists());
}

#[test]
fn test_seed_database_uri_from_settings() {
    let env = setup_test_env();
    let db = env.db_uri();
    let config = fs::read_to_string(&env.config_path).unwrap();
    fs::write(
        &env.config_path,
        format!("[db]\nuri = \"{}\"\n\n{}", db, config),
    )
    .unwrap();

    let (stdout, stderr, success) = run_locutils(&env.config_path, &["seed", "-t", "skip"]);
    assert!(success, "seed failed: {}", stderr);
    assert!(stdout.contains("Loaded 0 terminologies."));
    assert!(env.root.join("data/locutus.sqlite").exists());
}

#[test]
fn test_seed_unsupported_format_fails() {
    let env = setup_test_env();
    let sheet = env.write("input/terms.xlsx", "not a spreadsheet");
    let db = env.db_uri();

    let (_, stderr, success) = run_locutils(
        &env.config_path,
        &["seed", "-d", &db, "-t", sheet.to_str().unwrap()],
    );
    assert!(!success);
    assert!(stderr.contains("unsupported format"));
    assert!(stderr.contains("xlsx"));
}

#[test]
fn test_seed_missing_file_fails() {
    let env = setup_test_env();
    let missing = env.root.join("input/nope.csv");
    let db = env.db_uri();

    let (_, stderr, success) = run_locutils(
        &env.config_path,
        &["seed", "-d", &db, "-t", missing.to_str().unwrap()],
    );
    assert!(!success);
    assert!(stderr.contains("source unavailable"));
}

#[test]
fn test_seed_missing_column_fails() {
    let env = setup_test_env();
    let sheet = env.write(
        "input/bad.csv",
        "terminology_id,terminology_name,code\nHP,Human Phenotype Ontology,HP:0000001\n",
    );
    let db = env.db_uri();

    let (_, stderr, success) = run_locutils(
        &env.config_path,
        &["seed", "-d", &db, "-t", sheet.to_str().unwrap()],
    );
    assert!(!success);
    assert!(stderr.contains("malformed source"));
}

#[test]
fn test_catalog_lists_sources() {
    let env = setup_test_env();

    let (stdout, stderr, success) = run_locutils(&env.config_path, &["catalog", "-o", "kf"]);
    assert!(success, "catalog failed: {}", stderr);
    assert!(stdout.contains("SOURCE"));
    assert!(stdout.contains("data_types"));
    assert!(stdout.contains("legacy"));
    assert!(stdout.contains("2 of 4 sources seeded for organization 'kf'"));
}

#[test]
fn test_invalid_settings_rejected() {
    let env = setup_test_env();
    fs::write(&env.config_path, "[terminologies]\neditor = \"\"\n").unwrap();

    let (_, stderr, success) = run_locutils(&env.config_path, &["catalog"]);
    assert!(!success);
    assert!(stderr.contains("terminologies.editor must not be empty"));
}
