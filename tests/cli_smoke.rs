use std::path::PathBuf;
use std::process::Command;

fn bin() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_courtside")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "courtside.exe"
            } else {
                "courtside"
            });
            p
        })
}

#[test]
fn cli_help_lists_subcommands() {
    let out = Command::new(bin()).arg("--help").output().unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8(out.stdout).unwrap();
    for cmd in ["generate", "settings", "credits", "checkout"] {
        assert!(stdout.contains(cmd), "help missing subcommand {cmd}");
    }
}

#[test]
fn cli_generate_requires_photo_and_out() {
    let out = Command::new(bin())
        .args(["generate", "--sport", "soccer", "--name", "Jane", "--number", "7"])
        .output()
        .unwrap();
    assert!(!out.status.success());

    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("--photo"));
    assert!(stderr.contains("--out"));
}

#[test]
fn cli_rejects_unknown_sport_before_touching_the_photo() {
    let out = Command::new(bin())
        .args([
            "generate",
            "--photo",
            "does-not-exist.jpg",
            "--sport",
            "curling",
            "--name",
            "Jane",
            "--number",
            "7",
            "--out",
            "never-written.png",
        ])
        .output()
        .unwrap();
    assert!(!out.status.success());

    let stderr = String::from_utf8(out.stderr).unwrap();
    assert!(stderr.contains("unknown sport 'curling'"), "stderr: {stderr}");
}
