// Sled-backed persistence for the session record.
use crate::store::KeyValueStore;
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use sled::{
    CompareAndSwapError,
    Config,
    Db,
    IVec,
    Tree,
};
use std::path::Path;

const TREE_NAME: &str = "session_record";

#[derive(Clone, Debug)]
pub struct SledStore {
    tree: Tree,
}

impl SledStore {
    pub fn new(db: &Db) -> Result<Self> {
        let tree = db
            .open_tree(TREE_NAME)
            .wrap_err("open session_record tree")?;
        Ok(Self { tree })
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = Config::default()
            .path(path)
            .open()
            .wrap_err_with(|| format!("open sled database at {}", path.display()))?;
        Self::new(&db)
    }

    fn decode(key: &str, bytes: &IVec) -> Result<String> {
        String::from_utf8(bytes.to_vec())
            .wrap_err_with(|| format!("value for {key} is not valid UTF-8"))
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .tree
            .get(key)
            .wrap_err_with(|| format!("read {key}"))?;
        value.map(|bytes| Self::decode(key, &bytes)).transpose()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.tree
            .insert(key, value.as_bytes())
            .wrap_err_with(|| format!("persist {key}"))?;
        self.tree.flush().wrap_err("flush session record")?;
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool> {
        self.tree
            .contains_key(key)
            .wrap_err_with(|| format!("lookup {key}"))
    }

    fn set_if_absent(&mut self, key: &str, value: &str) -> Result<String> {
        let swap = self
            .tree
            .compare_and_swap(key, None::<&[u8]>, Some(value.as_bytes()))
            .wrap_err_with(|| format!("assign {key}"))?;
        match swap {
            Ok(()) => {
                self.tree.flush().wrap_err("flush session record")?;
                Ok(value.to_string())
            }
            Err(CompareAndSwapError {
                current: Some(current),
                ..
            }) => Self::decode(key, &current),
            Err(CompareAndSwapError { current: None, .. }) => {
                Err(eyre!("compare-and-swap on {key} lost against an absent value"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use tempdir::TempDir;

    fn sled_db(temp_dir: &TempDir) -> Db {
        Config::default()
            .path(temp_dir.path())
            .open()
            .expect("open sled db")
    }

    #[test]
    fn sut__when_setting_value_then_get_returns_it() {
        // given
        let temp_dir = TempDir::new("sled_store_set").unwrap();
        let db = sled_db(&temp_dir);
        let mut store = SledStore::new(&db).unwrap();
        assert!(!store.has("k").unwrap());

        // when
        store.set("k", "attempted").unwrap();

        // then
        assert!(store.has("k").unwrap());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("attempted"));
    }

    #[test]
    fn set_if_absent__second_writer_sees_first_value() {
        // given
        let temp_dir = TempDir::new("sled_store_cas").unwrap();
        let db = sled_db(&temp_dir);
        let mut first = SledStore::new(&db).unwrap();
        let mut second = first.clone();

        // when
        let a = first.set_if_absent("winner", "left").unwrap();
        let b = second.set_if_absent("winner", "right").unwrap();

        // then
        assert_eq!(a, "left");
        assert_eq!(b, "left");
    }
}
