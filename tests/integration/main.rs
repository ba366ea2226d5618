//! Integration tests for bcsched

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use serde_json::{json, Value};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn bcsched() -> Command {
        cargo_bin_cmd!("bcsched")
    }

    /// Command isolated from the user's config, with an `oc` that cannot run
    fn isolated(temp: &TempDir) -> Command {
        let config = temp.path().join("config.toml");
        if !config.exists() {
            std::fs::write(&config, "[cluster]\noc_binary = \"bcsched-test-missing-oc\"\n").unwrap();
        }
        let mut cmd = bcsched();
        cmd.arg("-c").arg(config).args(["-n", "test"]);
        cmd
    }

    fn tag(name: &str) -> Value {
        json!({"kind": "ImageStreamTag", "name": name})
    }

    fn build_config(name: &str, from: &str, to: &str) -> Value {
        json!({
            "kind": "BuildConfig",
            "metadata": {"name": name},
            "spec": {
                "strategy": {"sourceStrategy": {"from": tag(from)}},
                "output": {"to": tag(to)}
            }
        })
    }

    fn image_stream(name: &str) -> Value {
        json!({"kind": "ImageStream", "metadata": {"name": name}})
    }

    fn write_batch(dir: &Path, items: Vec<Value>) -> PathBuf {
        let path = dir.join("batch.json");
        let list = json!({"kind": "List", "apiVersion": "v1", "items": items});
        std::fs::write(&path, list.to_string()).unwrap();
        path
    }

    fn pipeline_batch(dir: &Path) -> PathBuf {
        write_batch(
            dir,
            vec![
                build_config("app", "base:latest", "app:latest"),
                build_config("base", "ubi:9", "base:latest"),
                image_stream("ubi"),
                image_stream("base"),
                image_stream("app"),
            ],
        )
    }

    #[test]
    fn help_displays() {
        bcsched()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("OpenShift build dependency scheduler"));
    }

    #[test]
    fn version_displays() {
        bcsched()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("bcsched"));
    }

    #[test]
    fn config_path_honors_flag() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        bcsched()
            .arg("-c")
            .arg(&path)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("custom.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();
        bcsched()
            .arg("-c")
            .arg(temp.path().join("none.toml"))
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[build]"))
            .stdout(predicate::str::contains("fail-fast"));
    }

    #[test]
    fn config_init_writes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        bcsched()
            .arg("-c")
            .arg(&path)
            .args(["config", "init"])
            .assert()
            .success();
        assert!(path.exists());
    }

    #[test]
    fn invalid_config_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[build]\non_failure = \"sometimes\"\n").unwrap();
        bcsched()
            .arg("-c")
            .arg(&path)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn plan_orders_self_contained_batch() {
        let temp = TempDir::new().unwrap();
        let batch = pipeline_batch(temp.path());
        isolated(&temp)
            .args(["plan", "--format", "plain", "-f"])
            .arg(&batch)
            .assert()
            .success()
            .stdout("base\napp\n");
    }

    #[test]
    fn plan_json_lists_waves() {
        let temp = TempDir::new().unwrap();
        let batch = pipeline_batch(temp.path());
        let output = isolated(&temp)
            .args(["plan", "--format", "json", "-f"])
            .arg(&batch)
            .output()
            .unwrap();
        assert!(output.status.success());

        let waves: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(waves[0]["wave"], 1);
        assert_eq!(
            waves[0]["build_configs"][0],
            "test/buildconfig.build.openshift.io/base"
        );
        assert_eq!(
            waves[1]["build_configs"][0],
            "test/buildconfig.build.openshift.io/app"
        );
    }

    #[test]
    fn plan_named_subset() {
        let temp = TempDir::new().unwrap();
        let batch = pipeline_batch(temp.path());
        isolated(&temp)
            .args(["plan", "base", "--format", "plain", "-f"])
            .arg(&batch)
            .assert()
            .success()
            .stdout("base\n");
    }

    #[test]
    fn plan_rejects_cycle() {
        let temp = TempDir::new().unwrap();
        let batch = write_batch(
            temp.path(),
            vec![
                build_config("a", "b:latest", "a:latest"),
                build_config("b", "a:latest", "b:latest"),
                image_stream("a"),
                image_stream("b"),
            ],
        );
        isolated(&temp)
            .args(["plan", "-f"])
            .arg(&batch)
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("Cyclic dependency"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn plan_without_namespace_asks_oc() {
        let temp = TempDir::new().unwrap();
        let batch = pipeline_batch(temp.path());
        let config = temp.path().join("config.toml");
        std::fs::write(&config, "[cluster]\noc_binary = \"bcsched-test-missing-oc\"\n").unwrap();
        bcsched()
            .arg("-c")
            .arg(&config)
            .args(["plan", "-f"])
            .arg(&batch)
            .assert()
            .failure()
            .stderr(predicate::str::contains("OpenShift CLI not found"));
    }

    #[test]
    fn plan_with_configured_namespace_skips_oc() {
        let temp = TempDir::new().unwrap();
        let batch = pipeline_batch(temp.path());
        let config = temp.path().join("config.toml");
        std::fs::write(
            &config,
            "[cluster]\noc_binary = \"bcsched-test-missing-oc\"\nnamespace = \"test\"\n",
        )
        .unwrap();
        bcsched()
            .arg("-c")
            .arg(&config)
            .args(["plan", "--format", "plain", "-f"])
            .arg(&batch)
            .assert()
            .success()
            .stdout("base\napp\n");
    }

    #[test]
    fn plan_missing_input_needs_oc() {
        let temp = TempDir::new().unwrap();
        let batch = write_batch(temp.path(), vec![build_config("app", "ubi:9", "app:latest")]);
        isolated(&temp)
            .args(["plan", "-f"])
            .arg(&batch)
            .assert()
            .failure()
            .stderr(predicate::str::contains("OpenShift CLI not found"));
    }

    #[test]
    fn plan_rejects_docker_image_output() {
        let temp = TempDir::new().unwrap();
        let mut bc = build_config("app", "ubi:9", "app:latest");
        bc["spec"]["output"]["to"] = json!({"kind": "DockerImage", "name": "quay.io/x/app:1"});
        let batch = write_batch(temp.path(), vec![bc, image_stream("ubi")]);
        isolated(&temp)
            .args(["plan", "-f"])
            .arg(&batch)
            .assert()
            .failure()
            .stderr(predicate::str::contains("DockerImage"));
    }

    #[test]
    fn build_without_build_configs_fails() {
        let temp = TempDir::new().unwrap();
        isolated(&temp)
            .arg("build")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No build configs given"));
    }

    #[test]
    fn bare_slashless_kind_name_is_invalid() {
        let temp = TempDir::new().unwrap();
        let batch = pipeline_batch(temp.path());
        isolated(&temp)
            .args(["plan", "bc/", "-f"])
            .arg(&batch)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid resource name"));
    }
}
