use std::{
    env,
    fs::File,
    io::{self, Write},
    path::PathBuf,
    process::Command,
};

fn main() {
    println!("cargo:rerun-if-env-changed=REPOSEED_GIT_REVISION");
    if let Err(e) = write_version_files() {
        panic!("Failed to create the version files: {:?}", e);
    }
}

fn out_file(name: &str) -> io::Result<File> {
    let out_dir = env::var("OUT_DIR").map_err(|e| io::Error::new(io::ErrorKind::NotFound, e))?;
    File::create(PathBuf::from(out_dir).join(name))
}

fn write_version_files() -> io::Result<()> {
    let version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| String::from("0.0.0"));
    let target = env::var("TARGET").unwrap_or_else(|_| String::from("unknown"));
    let rev = git_rev().unwrap_or_else(|| String::from("unknown"));

    let mut simple = out_file("simple_version_string")?;
    write!(&mut simple, "\"{}\"", version)?;

    let mut full = out_file("version_string")?;
    write!(
        &mut full,
        "r#\"{} ({})\nrev {}\"#",
        version,
        target,
        rev.trim()
    )?;
    Ok(())
}

fn git_rev() -> Option<String> {
    if let Ok(rev) = env::var("REPOSEED_GIT_REVISION") {
        return Some(rev);
    }
    let out = Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    String::from_utf8(out.stdout).ok()
}
