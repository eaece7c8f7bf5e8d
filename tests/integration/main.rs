//! Integration tests for cache-pack

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use cache_pack::runner::find_on_path;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PIPELINE_VARS: [&str; 10] = [
    "CACHE_PATH",
    "CACHE_PATH_ORIGINAL",
    "CACHE_KEY",
    "CACHE_RESTORED",
    "CACHE_PACK_FORMAT",
    "CACHE_PACK_TEMP",
    "PIPELINE_WORKSPACE",
    "CACHE_PACK_CONFIG",
    "CACHE_PACK_LOG_FORMAT",
    "RUST_LOG",
];

/// The binary with no pipeline variables or user config inherited from the host
fn cache_pack() -> Command {
    let mut cmd = cargo_bin_cmd!("cache-pack");
    for name in PIPELINE_VARS {
        cmd.env_remove(name);
    }
    // Removed on drop, so no config file can exist under it
    let config_home = TempDir::new().unwrap().path().to_path_buf();
    cmd.env("XDG_CONFIG_HOME", &config_home)
        .env("HOME", &config_home);
    cmd
}

fn has_tool(tool: &str) -> bool {
    find_on_path(tool, std::env::var_os("PATH").as_deref()).is_some()
}

/// Write a small tree with nested directories
fn write_tree(root: &Path) {
    fs::create_dir_all(root.join("nested/deeper")).unwrap();
    fs::write(root.join("a.txt"), "alpha\n").unwrap();
    fs::write(root.join("nested/b.bin"), [0u8, 1, 2, 255]).unwrap();
    fs::write(root.join("nested/deeper/c.txt"), "gamma\n").unwrap();
}

fn assert_same_tree(expected: &Path, actual: &Path) {
    for file in ["a.txt", "nested/b.bin", "nested/deeper/c.txt"] {
        assert_eq!(
            fs::read(expected.join(file)).unwrap(),
            fs::read(actual.join(file)).unwrap(),
            "{file} differs after round trip"
        );
    }
}

mod cli_tests {
    use super::*;

    #[test]
    fn help_displays() {
        cache_pack()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Pack and unpack CI pipeline caches"));
    }

    #[test]
    fn version_displays() {
        cache_pack()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("cache-pack"));
    }

    #[test]
    fn missing_stage_is_usage_error() {
        cache_pack()
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Missing stage"))
            .stdout(predicate::str::contains("##vso").not());
    }

    #[test]
    fn missing_stage_ignores_broken_config() {
        let temp = TempDir::new().unwrap();
        cache_pack()
            .env("CACHE_PACK_CONFIG", temp.path().join("missing.toml"))
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Missing stage"));
    }

    #[test]
    fn unknown_stage_is_usage_error() {
        cache_pack()
            .arg("post-save")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Unknown stage 'post-save'"));
    }
}

mod stage_tests {
    use super::*;

    #[test]
    fn init_exports_markers() {
        cache_pack()
            .arg("init")
            .env("CACHE_PATH", "/tmp/cache")
            .env("CACHE_KEY", "npm | package-lock.json")
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "##vso[task.setvariable variable=CACHE_PACK_TOOLS_INIT]true",
            ))
            .stdout(predicate::str::contains(
                "##vso[task.setvariable variable=CACHE_PACK_TOOLS_DIR]",
            ));
    }

    #[test]
    fn init_without_inputs_succeeds_quietly() {
        cache_pack()
            .arg("init")
            .assert()
            .success()
            .stdout(predicate::str::contains("##vso").not());
    }

    #[test]
    fn pre_restore_requires_workspace() {
        cache_pack()
            .arg("pre-restore")
            .env("CACHE_PATH", "/tmp/cache")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Missing required variables: PIPELINE_WORKSPACE"))
            .stdout(predicate::str::contains("##vso").not());
    }

    #[test]
    fn pre_restore_exports_redirect() {
        let workspace = TempDir::new().unwrap();
        let output = cache_pack()
            .arg("pre-restore")
            .env("PIPELINE_WORKSPACE", workspace.path())
            .env("CACHE_PATH", "/home/agent/.cache/pip")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let stdout = String::from_utf8(output).unwrap();
        assert!(stdout.contains(
            "##vso[task.setvariable variable=CACHE_PATH_ORIGINAL]/home/agent/.cache/pip"
        ));
        assert!(stdout.contains("##vso[task.setvariable variable=CACHE_RESTORED]\n"));

        let staged: Vec<_> = fs::read_dir(workspace.path()).unwrap().collect();
        assert_eq!(staged.len(), 1, "exactly one staging directory");
    }

    #[test]
    fn post_restore_without_restore_is_noop() {
        let temp = TempDir::new().unwrap();
        cache_pack()
            .arg("post-restore")
            .env("CACHE_PATH", temp.path().join("staging"))
            .env("CACHE_PATH_ORIGINAL", temp.path().join("cache"))
            .env("CACHE_RESTORED", "false")
            .assert()
            .success()
            .stderr(predicate::str::contains("Cache was not restored"));
        assert!(!temp.path().join("cache").exists());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_environment_is_tolerated() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp = TempDir::new().unwrap();
        cache_pack()
            .arg("post-restore")
            .env("UNRELATED_AGENT_VAR", OsStr::from_bytes(b"caf\xe9"))
            .env("CACHE_PATH", temp.path().join("staging"))
            .env("CACHE_PATH_ORIGINAL", temp.path().join("cache"))
            .env("CACHE_RESTORED", "false")
            .assert()
            .success()
            .stderr(predicate::str::contains("Cache was not restored"));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn user_config_comes_from_config_home() {
        let temp = TempDir::new().unwrap();
        let config_home = temp.path().join("config-home");
        fs::create_dir_all(config_home.join("cache-pack")).unwrap();
        fs::write(
            config_home.join("cache-pack").join("config.toml"),
            "[pack]\nposix_default = \"rar\"\n",
        )
        .unwrap();

        cache_pack()
            .arg("pre-save")
            .env("XDG_CONFIG_HOME", &config_home)
            .env("CACHE_PATH", temp.path().join("staging"))
            .env("CACHE_PATH_ORIGINAL", temp.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Unknown pack format 'rar'"));
    }

    #[test]
    fn post_restore_missing_pack_file_fails() {
        let temp = TempDir::new().unwrap();
        cache_pack()
            .arg("post-restore")
            .env("CACHE_PATH", temp.path())
            .env("CACHE_PATH_ORIGINAL", temp.path().join("cache"))
            .env("CACHE_RESTORED", "true")
            .env("CACHE_PACK_FORMAT", "tar")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("cannot find pack file"));
    }

    #[test]
    fn unknown_format_fails() {
        let temp = TempDir::new().unwrap();
        cache_pack()
            .arg("pre-save")
            .env("CACHE_PATH", temp.path().join("staging"))
            .env("CACHE_PATH_ORIGINAL", temp.path())
            .env("CACHE_PACK_FORMAT", "rar")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Unknown pack format 'rar'"));
    }

    #[test]
    fn format_without_extension_is_rejected() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        fs::write(
            &config,
            "[formats.bare]\nextension = \"\"\npack = \"tar -cf $0 .\"\nunpack = \"tar -xf $0\"\n",
        )
        .unwrap();

        cache_pack()
            .arg("pre-save")
            .env("CACHE_PACK_CONFIG", &config)
            .env("CACHE_PATH", temp.path().join("staging"))
            .env("CACHE_PATH_ORIGINAL", temp.path())
            .env("CACHE_PACK_FORMAT", "bare")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("empty extension"));
        assert!(!temp.path().join("staging").exists());
    }

    #[cfg(unix)]
    #[test]
    fn pre_save_detects_noop_tool() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        fs::write(
            &config,
            "[formats.noop]\nextension = \"noop\"\npack = \"true $0\"\nunpack = \"true $0\"\n",
        )
        .unwrap();

        cache_pack()
            .arg("pre-save")
            .env("CACHE_PACK_CONFIG", &config)
            .env("CACHE_PATH", temp.path().join("staging"))
            .env("CACHE_PATH_ORIGINAL", temp.path())
            .env("CACHE_PACK_FORMAT", "noop")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Pack file not found after packing"));
    }

    #[cfg(unix)]
    #[test]
    fn pre_save_reports_failing_tool() {
        let temp = TempDir::new().unwrap();
        let config = temp.path().join("config.toml");
        fs::write(
            &config,
            "[formats.broken]\nextension = \"bin\"\npack = \"touch $0 && exit 7\"\nunpack = \"exit 7 $0\"\n",
        )
        .unwrap();
        let staging = temp.path().join("staging");

        cache_pack()
            .arg("pre-save")
            .env("CACHE_PACK_CONFIG", &config)
            .env("CACHE_PATH", &staging)
            .env("CACHE_PATH_ORIGINAL", temp.path())
            .env("CACHE_PACK_FORMAT", "broken")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("exit code 7"));
        assert!(!staging.join("_cache.bin").exists(), "partial output removed");
    }
}

mod round_trip_tests {
    use super::*;

    fn pre_save(format: &str, staging: &Path, source: &Path) {
        cache_pack()
            .arg("pre-save")
            .env("CACHE_PATH", staging)
            .env("CACHE_PATH_ORIGINAL", source)
            .env("CACHE_PACK_FORMAT", format)
            .assert()
            .success();
    }

    fn post_restore(format: &str, staging: &Path, target: &Path) {
        cache_pack()
            .arg("post-restore")
            .env("CACHE_PATH", staging)
            .env("CACHE_PATH_ORIGINAL", target)
            .env("CACHE_RESTORED", "true")
            .env("CACHE_PACK_FORMAT", format)
            .assert()
            .success();
    }

    /// pre-save then post-restore with the given format
    fn round_trip(format: &str, expected_artifact: &str) {
        round_trip_via(format, expected_artifact, "staging");
    }

    fn round_trip_via(format: &str, expected_artifact: &str, staging_name: &str) {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let staging = temp.path().join(staging_name);
        let restored = temp.path().join("restored");
        write_tree(&source);

        pre_save(format, &staging, &source);
        assert!(staging.join(expected_artifact).is_file());

        post_restore(format, &staging, &restored);
        assert_same_tree(&source, &restored);
    }

    /// Restore, delete a file, save into the same staging directory again
    fn repack_drops_deleted_file(format: &str) {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("source");
        let staging = temp.path().join("staging");
        let cache = temp.path().join("cache");
        let fresh = temp.path().join("fresh");
        write_tree(&source);

        pre_save(format, &staging, &source);
        post_restore(format, &staging, &cache);
        fs::remove_file(cache.join("a.txt")).unwrap();

        pre_save(format, &staging, &cache);
        post_restore(format, &staging, &fresh);

        assert!(!fresh.join("a.txt").exists(), "{format} kept a deleted entry");
        assert!(fresh.join("nested/deeper/c.txt").is_file());
    }

    #[test]
    fn tar_round_trip() {
        if !has_tool("tar") {
            eprintln!("tar not found, skipping");
            return;
        }
        round_trip("tar", "_cache.tar");
    }

    #[test]
    fn zip_round_trip() {
        if !has_tool("7z") {
            eprintln!("7z not found, skipping");
            return;
        }
        round_trip("zip", "_cache.zip");
    }

    #[test]
    fn seven_zip_round_trip() {
        if !has_tool("7z") {
            eprintln!("7z not found, skipping");
            return;
        }
        round_trip("7z", "_cache.7z");
    }

    #[test]
    fn split_round_trip() {
        if !has_tool("7z") {
            eprintln!("7z not found, skipping");
            return;
        }
        round_trip("7z-split", "_cache.7z.001");
    }

    #[cfg(unix)]
    #[test]
    fn tar_round_trip_with_shell_characters_in_path() {
        if !has_tool("tar") {
            eprintln!("tar not found, skipping");
            return;
        }
        round_trip_via("tar", "_cache.tar", "stage$HOME it's");
    }

    #[test]
    fn repack_replaces_restored_archive() {
        if !has_tool("tar") {
            eprintln!("tar not found, skipping");
            return;
        }
        repack_drops_deleted_file("tar");
        if !has_tool("7z") {
            eprintln!("7z not found, skipping 7z formats");
            return;
        }
        for format in ["zip", "7z", "7z-split"] {
            repack_drops_deleted_file(format);
        }
    }

    #[test]
    fn pre_save_writes_tar_with_source_files() {
        if !has_tool("tar") {
            eprintln!("tar not found, skipping");
            return;
        }
        let temp = TempDir::new().unwrap();
        let cache = temp.path().join("cache");
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.txt"), "hello").unwrap();

        cache_pack()
            .arg("pre-save")
            .env("CACHE_PATH", &cache)
            .env("CACHE_PATH_ORIGINAL", &src)
            .env("CACHE_PACK_FORMAT", "tar")
            .assert()
            .success();

        let pack_file = cache.join("_cache.tar");
        assert!(pack_file.is_file());

        let listing = std::process::Command::new("tar")
            .arg("-tf")
            .arg(&pack_file)
            .output()
            .unwrap();
        assert!(String::from_utf8_lossy(&listing.stdout).contains("a.txt"));
    }
}
