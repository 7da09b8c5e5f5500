#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use orm_driver::prelude::*;
use orm_driver::NativeError;

/// Backend that records every statement and fails on request.
#[derive(Debug, Default, Clone)]
pub struct FakeBackend {
    pub fail_open: bool,
    pub fail_close: bool,
    /// Fail the first batch whose text contains this fragment.
    pub fail_on: Option<&'static str>,
    /// Behave like plain SQLite: `PRAGMA cipher_version` yields no row.
    pub plain_sqlite: bool,
    pub log: Arc<Mutex<Vec<String>>>,
}

impl FakeBackend {
    pub fn failing_on(fragment: &'static str) -> Self {
        Self {
            fail_on: Some(fragment),
            ..Self::default()
        }
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn registry(&self) -> BackendRegistry {
        let mut registry = BackendRegistry::new();
        registry.register(Arc::new(self.clone()));
        registry
    }
}

#[async_trait]
impl NativeBackend for FakeBackend {
    fn package(&self) -> &str {
        "rusqlite"
    }

    async fn open(&self, locator: &str) -> Result<Arc<dyn NativeConnection>, NativeError> {
        self.log.lock().unwrap().push(format!("OPEN {locator}"));
        if self.fail_open {
            return Err("unable to open database file".into());
        }
        Ok(Arc::new(FakeConnection {
            backend: self.clone(),
        }))
    }
}

#[derive(Debug)]
struct FakeConnection {
    backend: FakeBackend,
}

#[async_trait]
impl NativeConnection for FakeConnection {
    async fn execute_batch(&self, sql: &str) -> Result<(), NativeError> {
        self.backend.log.lock().unwrap().push(sql.to_string());
        match self.backend.fail_on {
            Some(fragment) if sql.contains(fragment) => Err("file is not a database".into()),
            _ => Ok(()),
        }
    }

    async fn query(&self, sql: &str, _params: &[RowValues]) -> Result<ResultSet, NativeError> {
        self.backend.log.lock().unwrap().push(sql.to_string());
        if sql.contains("cipher_version") && !self.backend.plain_sqlite {
            let mut result = ResultSet::with_capacity(1);
            result.set_column_names(Arc::new(vec!["cipher_version".to_string()]));
            result.add_row_values(vec![RowValues::Text("4.5.6 community".to_string())]);
            return Ok(result);
        }
        Ok(ResultSet::affected(0))
    }

    async fn close(&self) -> Result<(), NativeError> {
        self.backend.log.lock().unwrap().push("CLOSE".to_string());
        if self.backend.fail_close {
            return Err("unable to close due to unfinalized statements".into());
        }
        Ok(())
    }
}

pub fn db_path(dir: &tempfile::TempDir, relative: &str) -> String {
    dir.path().join(relative).to_string_lossy().into_owned()
}
