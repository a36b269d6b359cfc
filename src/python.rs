//! PyO3 bindings exposing [`Tokenizer`] to Python.

use std::path::PathBuf;

use pyo3::{exceptions::PyValueError, prelude::*};

use crate::{tokenizer::Tokenizer, types::TokenId};

/// Python wrapper for the BPE tokenizer.
#[pyclass(name = "Tokenizer", module = "bpetok")]
pub struct PyTokenizer {
    inner: Tokenizer,
}

#[pymethods]
impl PyTokenizer {
    /// Builds a tokenizer from `vocab.json` and `merges.txt` contents.
    #[new]
    fn new(vocab_json: &str, merges_txt: &str) -> PyResult<Self> {
        Tokenizer::from_resources(vocab_json, merges_txt)
            .map(|inner| Self { inner })
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    /// Builds a tokenizer from files on disk.
    #[staticmethod]
    fn from_files(vocab_path: PathBuf, merges_path: PathBuf) -> PyResult<Self> {
        Tokenizer::from_files(vocab_path, merges_path)
            .map(|inner| Self { inner })
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[pyo3(signature = (text, add_bos = true))]
    fn encode(&self, py: Python<'_>, text: &str, add_bos: bool) -> Vec<TokenId> {
        py.allow_threads(|| self.inner.encode(text, add_bos))
    }

    fn decode(&self, ids: Vec<TokenId>) -> String {
        self.inner.decode(&ids)
    }

    #[pyo3(signature = (texts, add_bos = true, show_progress = false))]
    fn encode_batch(
        &self,
        py: Python<'_>,
        texts: Vec<String>,
        add_bos: bool,
        show_progress: bool,
    ) -> PyResult<Vec<Vec<TokenId>>> {
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        py.allow_threads(|| self.inner.encode_batch(&refs, add_bos, show_progress))
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[pyo3(signature = (id_seqs, show_progress = false))]
    fn decode_batch(
        &self,
        py: Python<'_>,
        id_seqs: Vec<Vec<TokenId>>,
        show_progress: bool,
    ) -> PyResult<Vec<String>> {
        let refs: Vec<&[TokenId]> = id_seqs.iter().map(Vec::as_slice).collect();
        py.allow_threads(|| self.inner.decode_batch(&refs, show_progress))
            .map_err(|e| PyValueError::new_err(e.to_string()))
    }

    #[getter]
    fn bos_token_id(&self) -> TokenId {
        self.inner.bos_token_id()
    }

    #[getter]
    fn eos_token_id(&self) -> TokenId {
        self.inner.eos_token_id()
    }

    #[getter]
    fn vocab_size(&self) -> usize {
        self.inner.vocab_size()
    }
}

#[pymodule]
fn _bpetok(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTokenizer>()?;
    Ok(())
}
