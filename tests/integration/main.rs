//! Integration tests for sdb

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// sdb with an isolated (missing) config file
    fn sdb(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("sdb");
        cmd.env("SDB_CONFIG", temp.path().join("config.toml"));
        cmd
    }

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        sdb(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("smart container image builds"))
            .stdout(predicate::str::contains("fingerprint"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        sdb(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("sdb"));
    }

    #[test]
    fn fingerprint_of_base_image_only() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Dockerfile", "FROM alpine:latest");

        sdb(&temp)
            .arg("fingerprint")
            .arg(temp.path().join("Dockerfile"))
            .assert()
            .success()
            .stdout("3ec05fad\n");
    }

    #[test]
    fn fingerprint_lists_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Dockerfile", "FROM alpine:latest\nCOPY *.go /opt/app/");
        write(temp.path(), "file1.go", "aaa");
        write(temp.path(), "file2.go", "bbb");

        sdb(&temp)
            .arg("fingerprint")
            .arg(temp.path().join("Dockerfile"))
            .arg("--files")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "file1.go 7e240de74fb1ed08fa08d38063f6a6a91462a815",
            ))
            .stdout(predicate::str::ends_with("3f9974ce\n"));
    }

    #[test]
    fn fingerprint_json() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Dockerfile", "FROM alpine:latest");

        sdb(&temp)
            .arg("fingerprint")
            .arg(temp.path().join("Dockerfile"))
            .args(["--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"fingerprint\": \"3ec05fad\""))
            .stdout(predicate::str::contains("alpine:latest"));
    }

    #[test]
    fn fingerprint_missing_build_file() {
        let temp = TempDir::new().unwrap();
        sdb(&temp)
            .arg("fingerprint")
            .arg(temp.path().join("Dockerfile"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Build file not found"));
    }

    #[test]
    fn tags_dry_run() {
        let temp = TempDir::new().unwrap();
        sdb(&temp)
            .args([
                "tags",
                "@app-version|-alpine|@os-version",
                "-f",
                "app-version=1.0.0",
                "-f",
                "os-version=3.20.1",
            ])
            .assert()
            .success()
            .stdout(predicate::str::starts_with("1-alpine3\n1.0-alpine3\n"))
            .stdout(predicate::str::contains("1.0.0-alpine3.20.1\n"))
            .stdout(predicate::function(|out: &str| out.lines().count() == 9));
    }

    #[test]
    fn tags_rejects_malformed_fact() {
        let temp = TempDir::new().unwrap();
        sdb(&temp)
            .args(["tags", "$x", "-f", "novalue"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("NAME=VALUE"));
    }

    #[test]
    fn config_path_follows_flag() {
        let temp = TempDir::new().unwrap();
        sdb(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();
        sdb(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[engine]"))
            .stdout(predicate::str::contains("binary = \"auto\""));
    }

    #[test]
    fn config_init_then_set() {
        let temp = TempDir::new().unwrap();
        sdb(&temp).args(["config", "init"]).assert().success();
        assert!(temp.path().join("config.toml").exists());

        sdb(&temp)
            .args(["config", "set", "build.prefix", "ghcr.io/team"])
            .assert()
            .success();
        sdb(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("prefix = \"ghcr.io/team\""));
    }

    #[test]
    fn build_rejects_unrecognized_file_name() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "foo.txt", "FROM alpine:latest");

        sdb(&temp)
            .arg("build")
            .arg(temp.path().join("foo.txt"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unrecognized build file name"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn build_rejects_invalid_image_config() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Dockerfile.web", "FROM alpine:latest");
        write(temp.path(), "web.sdb.yaml", "tags: {broken");

        sdb(&temp)
            .arg("build")
            .arg(temp.path().join("Dockerfile.web"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn facts_without_definitions() {
        let temp = TempDir::new().unwrap();
        sdb(&temp)
            .args(["facts", "alpine:latest", "--no-builtin"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No facts to gather"));
    }

    #[test]
    fn unknown_engine_is_reported() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "config.toml",
            "[engine]\nbinary = \"sdb-no-such-engine\"\n",
        );

        sdb(&temp)
            .args(["facts", "alpine:latest"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No container engine found"));
    }
}
