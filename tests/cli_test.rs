use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use git2::Repository;
use tempfile::TempDir;

// Helper function to setup a temporary git repo with a committed version file
fn setup_test_repo(content: &str) -> TempDir {
    let temp_dir = TempDir::new().expect("Could not create temp dir");
    let repo = Repository::init(temp_dir.path()).expect("Could not init git repo");

    {
        let mut config = repo.config().expect("Could not get config");
        config
            .set_str("user.name", "Test User")
            .expect("Could not set user.name");
        config
            .set_str("user.email", "test@example.com")
            .expect("Could not set user.email");
    }

    fs::write(temp_dir.path().join("version.py"), content).expect("Could not write version file");

    let mut index = repo.index().expect("Could not get index");
    index
        .add_path(Path::new("version.py"))
        .expect("Could not add file to index");
    index.write().expect("Could not write index");

    let tree_id = index.write_tree().expect("Could not write tree");
    let tree = repo.find_tree(tree_id).expect("Could not find tree");
    let sig = repo.signature().expect("Could not get sig");
    repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])
        .expect("Could not create commit");

    temp_dir
}

fn version_machine(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_version-machine"))
        .args(args)
        .current_dir(dir)
        .env_remove("VERSION_MACHINE_LOG")
        .output()
        .expect("Failed to execute command")
}

fn read_version_file(dir: &TempDir) -> String {
    fs::read_to_string(dir.path().join("version.py")).unwrap()
}

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();
    let output = version_machine(dir.path(), &["--help"]);

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("version-machine"));
    assert!(stdout.contains("--increment"));
}

#[test]
fn test_unknown_increment_is_usage_error() {
    let dir = TempDir::new().unwrap();
    let output = version_machine(dir.path(), &["--path", "version.py", "-i", "WRONG"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("WRONG"));
}

#[test]
fn test_override_and_phase_require_path() {
    let dir = TempDir::new().unwrap();

    let output = version_machine(dir.path(), &["--override", "9.9.9"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8(output.stderr).unwrap().contains("--path"));

    let output = version_machine(dir.path(), &["--phase", "-rc1"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_quoted_phase_is_usage_error() {
    let dir = setup_test_repo("__version__ = \"1.2.3\"\n");
    let output = version_machine(
        dir.path(),
        &["--path", "version.py", "--increment", "phase", "--phase", "\" + evil"],
    );

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(read_version_file(&dir), "__version__ = \"1.2.3\"\n");
}

#[test]
fn test_phase_flag_sets_suffix() {
    let dir = setup_test_repo("__version__ = \"1.2.3\"\n");
    let output = version_machine(
        dir.path(),
        &["--path", "version.py", "--increment", "phase", "--phase", "-rc.1"],
    );

    assert!(output.status.success(), "{:?}", output);
    assert_eq!(read_version_file(&dir), "__version__ = \"1.2.3-rc.1\"\n");
}

#[test]
fn test_bump_with_path() {
    let dir = setup_test_repo("__version__ = '0.0.1'\n");
    let output = version_machine(dir.path(), &["--path", "version.py", "--increment", "MAJOR"]);

    assert!(output.status.success(), "{:?}", output);
    assert_eq!(read_version_file(&dir), "__version__ = \"1.0.0\"\n");
}

#[test]
fn test_missing_configuration_fails() {
    let dir = setup_test_repo("__version__ = '0.0.1'\n");
    let output = version_machine(dir.path(), &[]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Missing configuration"));
}

#[test]
fn test_pyproject_configuration() {
    let dir = setup_test_repo("__version__ = \"2.3.4\"\n");
    fs::write(
        dir.path().join("pyproject.toml"),
        "[tool.version_machine]\npath = \"version.py\"\nincrement = \"minor\"\n",
    )
    .unwrap();

    // pyproject.toml is untracked, so the tree still counts as clean.
    let output = version_machine(dir.path(), &[]);
    assert!(output.status.success(), "{:?}", output);
    assert_eq!(read_version_file(&dir), "__version__ = \"2.4.0\"\n");
}

#[test]
fn test_dirty_tree_requires_force() {
    let dir = setup_test_repo("__version__ = \"0.0.1\"\n");
    fs::write(dir.path().join("version.py"), "__version__ = \"0.0.10\"\n").unwrap();

    let refused = version_machine(dir.path(), &["--path", "version.py"]);
    assert_eq!(refused.status.code(), Some(1));
    assert!(String::from_utf8(refused.stderr).unwrap().contains("--force"));
    assert_eq!(read_version_file(&dir), "__version__ = \"0.0.10\"\n");

    let forced = version_machine(dir.path(), &["--path", "version.py", "--force"]);
    assert!(forced.status.success(), "{:?}", forced);
    assert!(String::from_utf8(forced.stderr).unwrap().contains("not clean"));
    assert_eq!(read_version_file(&dir), "__version__ = \"0.0.11\"\n");
}

#[test]
fn test_lock_prevents_second_bump() {
    let dir = setup_test_repo("__version__ = \"0.0.1\"\n");

    let first = version_machine(dir.path(), &["--path", "version.py", "--lock"]);
    assert!(first.status.success(), "{:?}", first);
    assert_eq!(read_version_file(&dir), "__version__ = \"0.0.2\"\n");
    let lock_after_first = fs::read_to_string(dir.path().join(".version_machine.lock")).unwrap();
    assert!(lock_after_first.contains("0.0.2"));

    // The first bump dirtied the tree, so force past the dirty check.
    let second = version_machine(dir.path(), &["--path", "version.py", "--lock", "--force"]);
    assert!(second.status.success(), "{:?}", second);
    assert!(String::from_utf8(second.stderr).unwrap().contains("is locked to version 0.0.2"));
    assert_eq!(read_version_file(&dir), "__version__ = \"0.0.2\"\n");
    assert_eq!(
        fs::read_to_string(dir.path().join(".version_machine.lock")).unwrap(),
        lock_after_first
    );
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = setup_test_repo("__version__ = \"0.0.1\"\n");
    let output = version_machine(dir.path(), &["--path", "version.py", "--dry-run", "--lock"]);

    assert!(output.status.success(), "{:?}", output);
    assert!(String::from_utf8(output.stdout).unwrap().contains("0.0.2"));
    assert_eq!(read_version_file(&dir), "__version__ = \"0.0.1\"\n");
    assert!(!dir.path().join(".version_machine.lock").exists());
}
