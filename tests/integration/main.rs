//! Integration tests for gr
//!
//! A shell script stands in for the Go toolchain: it logs every build and
//! writes a small shell program to the `-o` path.

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;

    fn gr() -> Command {
        cargo_bin_cmd!("gr")
    }

    #[test]
    fn help_displays() {
        gr().arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("run Go programs from source"));
    }

    #[test]
    fn version_displays() {
        gr().arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("gr"));
    }

    #[test]
    fn no_args_is_usage_error() {
        gr().assert().code(2).stderr(predicate::str::contains("Usage"));
    }
}

#[cfg(unix)]
mod run_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;
    use walkdir::WalkDir;

    const FAKE_GO: &str = r#"#!/bin/sh
# usage: go build -o OUT [flags...] .
echo "$*" >> "$GR_FAKE_GO_LOG"
out="$3"
if grep -q Printz *.go; then
    echo "./main.go:6:2: undefined: fmt.Printz" >&2
    exit 1
fi
if grep -q '^package lib' *.go; then
    exit 0
fi
if [ -f go.sum ]; then
    echo "go: downloading github.com/dottedmag/must v1.0.0" >&2
fi
code=$(sed -n 's/.*os\.Exit(\([0-9]*\)).*/\1/p' main.go)
{
    echo '#!/bin/sh'
    echo 'echo "Hello world!"'
    echo 'for a in "$@"; do echo "arg: $a"; done'
    echo "exit ${code:-0}"
} > "$out"
chmod +x "$out"
"#;

    const HELLO: &str = "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println(\"Hello world!\")\n}\n";

    struct Sandbox {
        dir: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let go = dir.path().join("bin").join("go");
            fs::create_dir_all(go.parent().unwrap()).unwrap();
            fs::write(&go, FAKE_GO).unwrap();
            fs::set_permissions(&go, fs::Permissions::from_mode(0o755)).unwrap();
            Self { dir }
        }

        fn path(&self) -> &Path {
            self.dir.path()
        }

        fn cache_dir(&self) -> PathBuf {
            self.path().join("cache")
        }

        fn log(&self) -> PathBuf {
            self.path().join("builds.log")
        }

        fn builds(&self) -> Vec<String> {
            fs::read_to_string(self.log())
                .map(|s| s.lines().map(str::to_string).collect())
                .unwrap_or_default()
        }

        fn write(&self, rel: &str, content: &str) -> PathBuf {
            let path = self.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, content).unwrap();
            path
        }

        fn module(&self, name: &str, main: &str) -> PathBuf {
            self.write(&format!("{}/go.mod", name), &format!("module {}\n\ngo 1.22\n", name));
            self.write(&format!("{}/main.go", name), main);
            self.path().join(name)
        }

        fn gr(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("gr");
            cmd.env("GR_CACHE_DIR", self.cache_dir())
                .env("GR_GO", self.path().join("bin").join("go"))
                .env("GR_CONFIG", self.path().join("config.toml"))
                .env("GR_FAKE_GO_LOG", self.log());
            cmd
        }
    }

    #[test]
    fn builds_once_then_runs_from_cache() {
        let sb = Sandbox::new();
        let pkg = sb.module("basic", HELLO);

        sb.gr().arg(&pkg).assert().success().stdout("Hello world!\n");
        sb.gr().arg(&pkg).assert().success().stdout("Hello world!\n");

        assert_eq!(sb.builds().len(), 1);
    }

    #[test]
    fn source_change_triggers_rebuild() {
        let sb = Sandbox::new();
        let pkg = sb.module("basic", HELLO);

        sb.gr().arg(&pkg).assert().success();
        sb.write("basic/util.go", "package main\n\nconst answer = 42\n");
        sb.gr().arg(&pkg).assert().success();
        sb.gr().arg(&pkg).assert().success();

        assert_eq!(sb.builds().len(), 2);
    }

    #[test]
    fn external_dependency_fetch_is_shown_on_first_build() {
        let sb = Sandbox::new();
        let pkg = sb.module("ext", HELLO);
        sb.write("ext/go.sum", "github.com/dottedmag/must v1.0.0 h1:abc=\n");

        sb.gr()
            .arg(&pkg)
            .assert()
            .success()
            .stdout("Hello world!\n")
            .stderr(predicate::str::contains(
                "go: downloading github.com/dottedmag/must v1.0.0",
            ));
        sb.gr()
            .arg(&pkg)
            .assert()
            .success()
            .stderr(predicate::str::contains("downloading").not());
    }

    #[test]
    fn program_exit_code_is_propagated() {
        let sb = Sandbox::new();
        let pkg = sb.module("exit3", "package main\n\nimport \"os\"\n\nfunc main() { os.Exit(3) }\n");

        sb.gr().arg(&pkg).assert().code(3);
        sb.gr().arg(&pkg).assert().code(3);
    }

    #[test]
    fn compile_error_is_reported_and_not_cached() {
        let sb = Sandbox::new();
        let pkg = sb.module(
            "syntax-error",
            "package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Printz(\"x\")\n}\n",
        );

        sb.gr()
            .arg(&pkg)
            .assert()
            .code(255)
            .stderr(predicate::str::contains("undefined: fmt.Printz"))
            .stderr(predicate::str::contains("failed to build program"));

        let installed: Vec<PathBuf> = WalkDir::new(sb.cache_dir())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .collect();
        assert!(installed.is_empty(), "unexpected cache files: {:?}", installed);
    }

    #[test]
    fn relative_cache_dir_is_rejected_before_building() {
        let sb = Sandbox::new();
        let pkg = sb.module("basic", HELLO);

        sb.gr()
            .env("GR_CACHE_DIR", "relative/cache")
            .arg(&pkg)
            .assert()
            .code(255)
            .stderr(predicate::str::contains("is not absolute"));

        assert!(sb.builds().is_empty());
    }

    #[test]
    fn arguments_are_forwarded() {
        let sb = Sandbox::new();
        let pkg = sb.module("basic", HELLO);

        sb.gr()
            .arg(&pkg)
            .args(["one", "--two", "-3"])
            .assert()
            .success()
            .stdout("Hello world!\narg: one\narg: --two\narg: -3\n");
    }

    #[test]
    fn own_options_after_package_reach_the_program() {
        let sb = Sandbox::new();
        let pkg = sb.module("basic", HELLO);

        sb.gr()
            .arg(&pkg)
            .args(["-v", "--help", "-f", "x"])
            .assert()
            .success()
            .stdout("Hello world!\narg: -v\narg: --help\narg: -f\narg: x\n");

        let builds = sb.builds();
        assert_eq!(builds.len(), 1);
        assert!(!builds[0].contains(" x "));
    }

    #[test]
    fn workspace_change_triggers_rebuild() {
        let sb = Sandbox::new();
        sb.write("go.work", "go 1.22\n\nuse ./app\n");
        let pkg = sb.module("app", HELLO);

        sb.gr().arg(&pkg).assert().success();
        sb.write("go.work", "go 1.22\n\nuse (\n\t./app\n)\n");
        sb.gr().arg(&pkg).assert().success();
        sb.gr().arg(&pkg).assert().success();

        assert_eq!(sb.builds().len(), 2);
    }

    #[test]
    fn build_flags_reach_the_toolchain_and_the_cache_key() {
        let sb = Sandbox::new();
        let pkg = sb.module("basic", HELLO);

        sb.gr().args(["-f", "-trimpath"]).arg(&pkg).assert().success();
        sb.gr().arg(&pkg).assert().success();
        sb.gr().args(["-f", "-trimpath"]).arg(&pkg).assert().success();

        let builds = sb.builds();
        assert_eq!(builds.len(), 2);
        assert!(builds[0].contains("-trimpath"));
        assert!(!builds[1].contains("-trimpath"));
    }

    #[test]
    fn local_replacement_change_triggers_rebuild() {
        let sb = Sandbox::new();
        sb.write(
            "app/go.mod",
            "module app\n\nrequire example.com/lib v0.0.0\n\nreplace example.com/lib => ../lib\n",
        );
        sb.write("app/main.go", HELLO);
        sb.write("lib/go.mod", "module example.com/lib\n");
        sb.write("lib/lib.go", "package lib\n");
        let pkg = sb.path().join("app");

        sb.gr().arg(&pkg).assert().success();
        sb.write("lib/lib.go", "package lib\n\nconst Version = 2\n");
        sb.gr().arg(&pkg).assert().success();

        assert_eq!(sb.builds().len(), 2);
    }

    #[test]
    fn missing_replacement_target_fails() {
        let sb = Sandbox::new();
        sb.write("app/go.mod", "module app\n\nreplace example.com/gone => ../gone\n");
        sb.write("app/main.go", HELLO);

        sb.gr()
            .arg(sb.path().join("app"))
            .assert()
            .code(255)
            .stderr(predicate::str::contains("malformed dependency reference"));
        assert!(sb.builds().is_empty());
    }

    #[test]
    fn package_without_program_runs_nothing() {
        let sb = Sandbox::new();
        sb.write("lib/go.mod", "module lib\n");
        sb.write("lib/lib.go", "package lib\n");

        sb.gr()
            .arg(sb.path().join("lib"))
            .assert()
            .success()
            .stdout("");
        assert_eq!(sb.builds().len(), 1);
    }
}
