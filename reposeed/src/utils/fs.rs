use std::borrow::Cow;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::Path;

/// Returns the path as a string, replacing anything that isn't valid UTF-8
pub fn path_lossy(path: &Path) -> Cow<'_, str> {
    path.to_string_lossy()
}

pub fn open_file(path: &Path) -> crate::Result<File> {
    match File::open(path) {
        Ok(v) => Ok(v),
        Err(e) => match e.kind() {
            ErrorKind::NotFound => Err(crate::Error::MissingFile(path_lossy(path).into())),
            _ => Err(e.into()),
        },
    }
}

pub fn read_file(path: &Path) -> crate::Result<String> {
    match fs::read_to_string(path) {
        Ok(v) => Ok(v),
        Err(e) => match e.kind() {
            ErrorKind::NotFound => Err(crate::Error::MissingFile(path_lossy(path).into())),
            _ => Err(e.into()),
        },
    }
}

#[cfg(test)]
mod test {
    use crate::testing::{tmp_dir, TmpDir};
    use rstest::*;

    use super::*;

    #[rstest]
    fn test_missing_file(tmp_dir: TmpDir) {
        let path = tmp_dir.get_path().join("nope.xml");
        match open_file(&path) {
            Err(crate::Error::MissingFile(name)) => assert!(name.ends_with("nope.xml")),
            Err(e) => panic!("unexpected error {}", e),
            Ok(_) => panic!("opened a file that doesn't exist"),
        }
        assert!(matches!(read_file(&path), Err(crate::Error::MissingFile(_))));
    }

    #[rstest]
    fn test_read_file(tmp_dir: TmpDir) {
        let path = tmp_dir.create_file("some/dir/file.txt", "contents");
        assert_eq!(read_file(&path).expect("reading file"), "contents");
    }
}
