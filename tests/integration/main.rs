//! Integration tests for Strata

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Strata isolated from the user's config and Ansible role paths
    fn strata(project: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("strata");
        cmd.env_remove("ANSIBLE_ROLES_PATH")
            .env_remove("STRATA_CONFIG")
            .env("HOME", project)
            .env_remove("XDG_CONFIG_HOME")
            .arg("--no-local")
            .arg("--config")
            .arg(project.join("missing-config.toml"))
            .arg("--project")
            .arg(project);
        cmd
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn project() -> TempDir {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "roles/web/tasks/main.yml", "- name: install nginx\n");
        write(
            temp.path(),
            "roles/web/meta/main.yml",
            "dependencies:\n  - role: base\n",
        );
        write(temp.path(), "roles/base/tasks/main.yml", "- name: update\n");
        temp
    }

    fn fingerprint_of(project: &Path, role: &str) -> String {
        let output = strata(project)
            .args(["fingerprint", role])
            .output()
            .unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("strata")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("content-addressed role layer builds"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("strata")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("strata"));
    }

    #[test]
    fn fingerprint_prints_hex_digest() {
        let project = project();
        strata(project.path())
            .args(["fingerprint", "web"])
            .assert()
            .success()
            .stdout(predicate::str::is_match("^[0-9a-f]{64}\n$").unwrap());
    }

    #[test]
    fn fingerprint_is_stable_and_tracks_dependencies() {
        let project = project();
        let first = fingerprint_of(project.path(), "web");
        assert_eq!(first, fingerprint_of(project.path(), "web"));

        write(project.path(), "roles/base/tasks/main.yml", "- name: upgrade\n");
        assert_ne!(first, fingerprint_of(project.path(), "web"));
    }

    #[test]
    fn fingerprint_json_lists_closure() {
        let project = project();
        strata(project.path())
            .args(["fingerprint", "web", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"fingerprint\""))
            .stdout(predicate::str::contains("\"name\": \"base\""));
    }

    #[test]
    fn fingerprint_roles_path_flag() {
        let project = project();
        let extra = TempDir::new().unwrap();
        write(extra.path(), "db/tasks/main.yml", "- name: install postgres\n");

        strata(project.path())
            .arg("--roles-path")
            .arg(extra.path())
            .args(["fingerprint", "db"])
            .assert()
            .success();
    }

    #[test]
    fn fingerprint_finds_roles_under_home() {
        let project = project();
        write(
            project.path(),
            ".ansible/roles/db/tasks/main.yml",
            "- name: install postgres\n",
        );

        strata(project.path())
            .args(["fingerprint", "db"])
            .assert()
            .success();
    }

    #[test]
    fn fingerprint_missing_role() {
        let project = project();
        strata(project.path())
            .args(["fingerprint", "nonexistent"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Role not found: nonexistent"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn fingerprint_missing_dependency_names_parent() {
        let project = project();
        write(
            project.path(),
            "roles/app/meta/main.yml",
            "dependencies:\n  - role: ghost\n",
        );

        strata(project.path())
            .args(["fingerprint", "app"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("ghost (dependency of app)"));
    }

    #[test]
    fn fingerprint_malformed_meta() {
        let project = project();
        write(project.path(), "roles/web/meta/main.yml", "dependencies: [\n");

        strata(project.path())
            .args(["fingerprint", "web"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid role metadata"));
    }

    #[test]
    fn lookup_rejects_bad_fingerprint() {
        let project = project();
        strata(project.path())
            .args(["lookup", "--fingerprint", "not-hex"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid fingerprint"));
    }

    #[test]
    fn config_path() {
        cargo_bin_cmd!("strata")
            .env_remove("STRATA_CONFIG")
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let project = project();
        strata(project.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[build]"))
            .stdout(predicate::str::contains("base_image"));
    }

    #[test]
    fn local_config_is_merged() {
        let project = project();
        write(
            project.path(),
            "strata.toml",
            "[build]\nbase_image = \"alpine:3.20\"\n",
        );

        cargo_bin_cmd!("strata")
            .env_remove("STRATA_CONFIG")
            .arg("--config")
            .arg(project.path().join("missing-config.toml"))
            .arg("--project")
            .arg(project.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("alpine:3.20"));
    }

    #[test]
    fn config_init_writes_file() {
        let project = project();
        strata(project.path())
            .args(["config", "init"])
            .assert()
            .success();

        assert!(project.path().join("missing-config.toml").is_file());
    }
}
