//! Integration tests for the matrix-tools CLI
//!
//! These tests run the built binary end-to-end.

use std::process::Command;

/// Get the path to the matrix-tools binary
fn matrix_tools_binary() -> std::path::PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // Remove test executable name
    path.pop(); // Remove deps directory

    path.push("matrix-tools");

    if cfg!(windows) {
        path.set_extension("exe");
    }

    path
}

/// Run matrix-tools without in-cluster Kubernetes variables and return output
fn run_matrix_tools(args: &[&str]) -> std::process::Output {
    Command::new(matrix_tools_binary())
        .args(args)
        .env_remove("KUBERNETES_SERVICE_HOST")
        .env_remove("KUBERNETES_SERVICE_PORT")
        .output()
        .expect("Failed to execute matrix-tools")
}

fn assert_no_panic(output: &std::process::Output, context: &str) {
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        !stderr.contains("panicked") && !stderr.contains("RUST_BACKTRACE"),
        "{} panicked.\nstderr: {}",
        context,
        stderr
    );
}

#[test]
fn test_version() {
    let output = run_matrix_tools(&["--version"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("matrix-tools"));
}

#[test]
fn test_help_lists_subcommands() {
    let output = run_matrix_tools(&["--help"]);

    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("render-config"));
    assert!(stdout.contains("generate-secrets"));
    assert!(stdout.contains("tcpwait"));
}

#[test]
fn test_render_config_requires_sources() {
    let output = run_matrix_tools(&["render-config"]);

    assert!(!output.status.success());
    assert_no_panic(&output, "render-config without sources");
}

#[test]
fn test_generate_secrets_requires_secrets_flag() {
    let output = run_matrix_tools(&["generate-secrets"]);

    assert!(!output.status.success());
    assert_no_panic(&output, "generate-secrets without --secrets");
}

#[test]
fn test_generate_secrets_rejects_unknown_type() {
    let output = run_matrix_tools(&[
        "generate-secrets",
        "--secrets",
        "synapse:MACAROON:dsa",
        "--namespace",
        "matrix",
    ]);

    assert!(!output.status.success());
    assert_no_panic(&output, "generate-secrets with unknown type");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown secret type 'dsa'"), "stderr: {}", stderr);
}

#[test]
fn test_generate_secrets_without_cluster_config_fails() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let kubeconfig = temp_dir.path().join("missing-kubeconfig");

    let output = Command::new(matrix_tools_binary())
        .args([
            "generate-secrets",
            "--secrets",
            "synapse:MACAROON:rand32",
            "--namespace",
            "matrix",
        ])
        .env_remove("KUBERNETES_SERVICE_HOST")
        .env_remove("KUBERNETES_SERVICE_PORT")
        .env("KUBECONFIG", &kubeconfig)
        .output()
        .expect("Failed to execute matrix-tools");

    assert!(!output.status.success());
    assert_no_panic(&output, "generate-secrets without cluster configuration");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to configure the Kubernetes client"),
        "stderr: {}",
        stderr
    );
}

#[test]
fn test_tcpwait_returns_when_port_is_open() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();

    let output = run_matrix_tools(&["tcpwait", "--address", &address]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(&format!("Waiting for TCP connection on {}", address)));
}

mod render_config {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, contents).expect("Failed to write source");
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn test_merges_sources_in_order() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let first = write(&temp_dir, "000.yaml", "overriddenKey: v0\nlist: [a, b]\n");
        let second = write(&temp_dir, "001.yaml", "overriddenKey: v1\n");
        let target = temp_dir.path().join("out").join("homeserver.yaml");

        let output = run_matrix_tools(&[
            "render-config",
            "--output",
            target.to_str().unwrap(),
            &first,
            &second,
        ]);

        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
        let rendered = fs::read_to_string(&target).expect("Output file missing");
        assert_eq!(rendered, "overriddenKey: v1\nlist:\n- a\n- b\n");
    }

    #[test]
    fn test_resolves_environment_and_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let secret = write(&temp_dir, "macaroon", "s3cret\n");
        let source = write(
            &temp_dir,
            "homeserver.yaml",
            "server_name: ${SERVER_NAME}\nmacaroon_secret_key: ${MACAROON_FILE}\n",
        );

        let output = Command::new(matrix_tools_binary())
            .args(["render-config", &source])
            .env("SERVER_NAME", "example.com")
            .env("MACAROON_FILE", format!("{{{{ readfile \"{}\" }}}}", secret))
            .output()
            .expect("Failed to execute matrix-tools");

        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("server_name: example.com"), "stdout: {}", stdout);
        assert!(stdout.contains("macaroon_secret_key: s3cret"), "stdout: {}", stdout);
    }

    #[test]
    fn test_missing_variable_writes_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let source = write(&temp_dir, "a.yaml", "key: ${MATRIX_TOOLS_TEST_UNSET}\n");
        let target = temp_dir.path().join("out.yaml");

        let output = Command::new(matrix_tools_binary())
            .args(["render-config", "--output", target.to_str().unwrap(), &source])
            .env_remove("MATRIX_TOOLS_TEST_UNSET")
            .output()
            .expect("Failed to execute matrix-tools");

        assert!(!output.status.success());
        assert_no_panic(&output, "render-config with a missing variable");
        assert!(!target.exists(), "No output may be written on failure");

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("MATRIX_TOOLS_TEST_UNSET"), "stderr: {}", stderr);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_unicode_variable_fails() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let source = write(&temp_dir, "a.yaml", "server_name: ${SERVER_NAME}\n");
        let target = temp_dir.path().join("out.yaml");

        let output = Command::new(matrix_tools_binary())
            .args(["render-config", "--output", target.to_str().unwrap(), &source])
            .env("SERVER_NAME", OsStr::from_bytes(b"bad\xffname"))
            .output()
            .expect("Failed to execute matrix-tools");

        assert!(!output.status.success());
        assert_no_panic(&output, "render-config with a non-unicode variable");
        assert!(!target.exists(), "No output may be written on failure");

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("not valid unicode"), "stderr: {}", stderr);
    }

    #[test]
    fn test_missing_source_is_reported() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let missing = temp_dir.path().join("absent.yaml");

        let output = run_matrix_tools(&["render-config", missing.to_str().unwrap()]);

        assert!(!output.status.success());
        assert_no_panic(&output, "render-config with a missing source");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("absent.yaml"), "stderr: {}", stderr);
    }

    #[test]
    fn test_directories_are_skipped() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let source = write(&temp_dir, "a.yaml", "key: value\n");

        let output = run_matrix_tools(&[
            "render-config",
            temp_dir.path().to_str().unwrap(),
            &source,
        ]);

        assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
        assert_eq!(String::from_utf8_lossy(&output.stdout), "key: value\n");
    }
}
