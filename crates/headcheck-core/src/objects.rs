//! Content identifiers and the sharded local object store.
//!
//! An object lives at `<root>/<first two hex chars>/<full id>`. Validation
//! never fails loudly: malformed input yields `false` or `None`.

use std::fmt;
use std::path::Path;

/// Length of a content identifier in hex characters.
pub const HASH_LEN: usize = 32;

/// Returns true if `s` is exactly 32 lowercase hex characters.
pub fn is_valid_hash(s: &str) -> bool {
    s.len() == HASH_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Validated 32-character lowercase hex identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(String);

impl ContentId {
    /// Validate `s` as an identifier. No normalization is applied.
    pub fn parse(s: &str) -> Option<Self> {
        is_valid_hash(s).then(|| ContentId(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Shard directory name (first two characters).
    pub fn shard(&self) -> &str {
        &self.0[..2]
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extract an identifier from an ETag value.
///
/// Lowercases, trims surrounding double quotes, drops everything from the
/// first hyphen (e.g. `-gzip` suffixes) and validates the rest.
pub fn hash_from_etag(etag: &str) -> Option<ContentId> {
    let lower = etag.to_ascii_lowercase();
    let mut hash = lower.trim_matches('"');
    if let Some(i) = hash.find('-') {
        hash = &hash[..i];
    }
    ContentId::parse(hash)
}

/// Filesystem access used by [`object_exists_in`].
pub trait ObjectFs {
    /// True if `path` exists without following a final symlink.
    fn lstat_exists(&self, path: &Path) -> bool;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl ObjectFs for LocalFs {
    fn lstat_exists(&self, path: &Path) -> bool {
        std::fs::symlink_metadata(path).is_ok()
    }
}

/// Whether an object for `hash` exists under `root`. The hash must be lower case.
pub fn object_exists(root: impl AsRef<Path>, hash: &str) -> bool {
    object_exists_in(&LocalFs, root.as_ref(), hash)
}

/// Like [`object_exists`] with an explicit filesystem. Invalid hashes never reach `fs`.
pub fn object_exists_in<F: ObjectFs + ?Sized>(fs: &F, root: &Path, hash: &str) -> bool {
    if !is_valid_hash(hash) {
        return false;
    }
    fs.lstat_exists(&root.join(&hash[..2]).join(hash))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "a1b2c3d4e5f60718293a4b5c6d7e8f90";

    #[test]
    fn valid_hash_accepts_lowercase_hex() {
        assert!(is_valid_hash(VALID));
        assert!(is_valid_hash(&"0".repeat(32)));
        assert!(is_valid_hash(&"f".repeat(32)));
    }

    #[test]
    fn valid_hash_rejects_bad_shape() {
        assert!(!is_valid_hash(&VALID.to_uppercase()));
        assert!(!is_valid_hash(&VALID[..31]));
        assert!(!is_valid_hash(&format!("{VALID}0")));
        assert!(!is_valid_hash(""));
        assert!(!is_valid_hash("g1b2c3d4e5f60718293a4b5c6d7e8f90"));
        // 32 bytes but not 32 hex chars
        assert!(!is_valid_hash("é1b2c3d4e5f60718293a4b5c6d7e8f9"));
    }

    #[test]
    fn etag_with_quotes_and_suffix() {
        let id = hash_from_etag("\"a1b2c3d4e5f60718293a4b5c6d7e8f90-gzip\"").unwrap();
        assert_eq!(id.as_str(), VALID);
    }

    #[test]
    fn etag_not_a_hash() {
        assert!(hash_from_etag("\"not-a-hash\"").is_none());
        assert!(hash_from_etag("").is_none());
        assert!(hash_from_etag("W/\"a1b2c3d4e5f60718293a4b5c6d7e8f90\"").is_none());
    }

    #[test]
    fn etag_uppercase_is_normalized() {
        let id = hash_from_etag("\"A1B2C3D4E5F60718293A4B5C6D7E8F90\"").unwrap();
        assert_eq!(id.as_str(), VALID);
        assert_eq!(hash_from_etag(VALID).unwrap().as_str(), VALID);
    }

    #[test]
    fn content_id_parse_and_shard() {
        let id = ContentId::parse(VALID).unwrap();
        assert_eq!(id.shard(), "a1");
        assert_eq!(id.to_string(), VALID);
        assert!(ContentId::parse("A1B2C3D4E5F60718293A4B5C6D7E8F90").is_none());
    }

    #[test]
    fn exists_for_sharded_object() {
        let root = tempfile::tempdir().unwrap();
        let hash = format!("ab{}", "0".repeat(30));
        std::fs::create_dir_all(root.path().join("ab")).unwrap();
        std::fs::write(root.path().join("ab").join(&hash), b"x").unwrap();
        assert!(object_exists(root.path(), &hash));

        let missing = format!("ab{}", "1".repeat(30));
        assert!(!object_exists(root.path(), &missing));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_counts_as_existing() {
        let root = tempfile::tempdir().unwrap();
        let hash = format!("cd{}", "2".repeat(30));
        std::fs::create_dir_all(root.path().join("cd")).unwrap();
        std::os::unix::fs::symlink(
            root.path().join("nowhere"),
            root.path().join("cd").join(&hash),
        )
        .unwrap();
        assert!(object_exists(root.path(), &hash));
    }

    struct UntouchableFs;

    impl ObjectFs for UntouchableFs {
        fn lstat_exists(&self, path: &Path) -> bool {
            panic!("filesystem touched for {}", path.display());
        }
    }

    #[test]
    fn invalid_hash_never_touches_filesystem() {
        let root = Path::new("/nonexistent");
        assert!(!object_exists_in(&UntouchableFs, root, "ab"));
        assert!(!object_exists_in(&UntouchableFs, root, &VALID.to_uppercase()));
        assert!(!object_exists_in(&UntouchableFs, root, "../../etc/passwd"));
    }
}
