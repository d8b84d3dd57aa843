// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The shell environment `reduce` runs in.
//!
//! Rather than inheriting the caller's environment, `reduce` gets a fresh one
//! containing only `PATH` and the variables the AMI software needs. This keeps
//! conflicting variables from leaking in.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use thiserror::Error;

/// The AMI installation directory, from `AMI_DIR` if set.
pub fn default_ami_dir() -> PathBuf {
    match std::env::var_os("AMI_DIR") {
        Some(d) => PathBuf::from(d),
        None => expand_tilde(Path::new("~/ami")),
    }
}

/// Where reduced data is written, from `AMI_RESULTS` if set.
pub fn default_output_dir() -> PathBuf {
    match std::env::var_os("AMI_RESULTS") {
        Some(d) => PathBuf::from(d),
        None => expand_tilde(Path::new("~/ami_results")),
    }
}

/// Replace a leading "~" with the user's home directory. Paths without a
/// leading "~" (or when `HOME` isn't set) are returned unchanged.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), std::env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

/// Prepend a directory to a colon-separated path variable.
fn prepend_to_path(env: &mut IndexMap<String, String>, var: &str, dir: &Path) {
    let dir = dir.display().to_string();
    let value = match env.get(var) {
        Some(existing) if !existing.is_empty() => format!("{dir}:{existing}"),
        _ => dir,
    };
    env.insert(var.to_string(), value);
}

/// Check that the `reduce` binary is where we expect it.
pub fn check_reduce_binary(ami_dir: &Path) -> Result<(), EnvironmentError> {
    let binary = ami_dir.join("bin").join("reduce");
    if binary.is_file() {
        Ok(())
    } else {
        Err(EnvironmentError::MissingBinary(binary))
    }
}

/// Get the environment variables to run `reduce` with. `ami_dir` should be
/// the top directory of the AMI `reduce` installation.
pub fn init_ami_env(ami_dir: &Path) -> Result<IndexMap<String, String>, EnvironmentError> {
    let ami_dir_str = ami_dir
        .to_str()
        .ok_or_else(|| EnvironmentError::NonUtf8Path(ami_dir.to_path_buf()))?;

    let mut env = IndexMap::new();
    env.insert(
        "PATH".to_string(),
        std::env::var("PATH").unwrap_or_default(),
    );
    env.insert("AMI_DIR".to_string(), ami_dir_str.to_string());
    prepend_to_path(&mut env, "PATH", &ami_dir.join("bin"));
    prepend_to_path(&mut env, "LD_LIBRARY_PATH", &ami_dir.join("lib"));

    let pgplot = ami_dir.join("lib").join("pgplot");
    env.insert("PGPLOT_DIR".to_string(), pgplot.display().to_string());
    env.insert(
        "PGPLOT_FONT".to_string(),
        pgplot.join("grfont.dat").display().to_string(),
    );
    env.insert(
        "PGPLOT_RGB".to_string(),
        pgplot.join("rgb.txt").display().to_string(),
    );
    env.insert("PGPLOT_DEV".to_string(), "/xwin".to_string());
    Ok(env)
}

#[derive(Error, Debug)]
pub enum EnvironmentError {
    #[error("Cannot access the AMI reduce binary at {}", .0.display())]
    MissingBinary(PathBuf),

    #[error("The AMI directory {} isn't valid UTF-8", .0.display())]
    NonUtf8Path(PathBuf),
}

#[cfg(test)]
mod tests {
    use serial_test::serial;
    use tempfile::TempDir;

    use super::*;

    #[test]
    #[serial]
    fn test_init_ami_env() {
        let env = init_ami_env(Path::new("/ami")).unwrap();
        assert_eq!(env["AMI_DIR"], "/ami");
        assert!(env["PATH"].starts_with("/ami/bin"));
        assert_eq!(env["LD_LIBRARY_PATH"], "/ami/lib");
        assert_eq!(env["PGPLOT_DIR"], "/ami/lib/pgplot");
        assert_eq!(env["PGPLOT_FONT"], "/ami/lib/pgplot/grfont.dat");
        assert_eq!(env["PGPLOT_RGB"], "/ami/lib/pgplot/rgb.txt");
        assert_eq!(env["PGPLOT_DEV"], "/xwin");
        // Nothing else from the calling environment leaks in.
        assert_eq!(env.len(), 7);
    }

    #[test]
    fn test_check_reduce_binary() {
        let tmp_dir = TempDir::new().expect("couldn't make tmp dir");
        let result = check_reduce_binary(tmp_dir.path());
        assert!(matches!(result, Err(EnvironmentError::MissingBinary(_))));

        std::fs::create_dir(tmp_dir.path().join("bin")).unwrap();
        std::fs::write(tmp_dir.path().join("bin").join("reduce"), "").unwrap();
        assert!(check_reduce_binary(tmp_dir.path()).is_ok());
    }

    #[test]
    #[serial]
    fn test_expand_tilde() {
        let home = std::env::var_os("HOME");
        std::env::set_var("HOME", "/home/ami");
        assert_eq!(
            expand_tilde(Path::new("~/ami_results")),
            PathBuf::from("/home/ami/ami_results")
        );
        assert_eq!(expand_tilde(Path::new("/data")), PathBuf::from("/data"));
        match home {
            Some(home) => std::env::set_var("HOME", home),
            None => std::env::remove_var("HOME"),
        }
    }

    #[test]
    #[serial]
    fn test_default_dirs_from_env() {
        std::env::set_var("AMI_DIR", "/opt/ami");
        std::env::set_var("AMI_RESULTS", "/data/results");
        assert_eq!(default_ami_dir(), PathBuf::from("/opt/ami"));
        assert_eq!(default_output_dir(), PathBuf::from("/data/results"));
        std::env::remove_var("AMI_DIR");
        std::env::remove_var("AMI_RESULTS");
    }
}
