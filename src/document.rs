//! # Document loading
//!
//! A [`Document`] is the single PDF a session answers questions about. It is built once at
//! startup: the file is read, its page text extracted with `pdf-extract` and concatenated,
//! then split into [`Fragment`]s by the configured [splitter](crate::splitter). After that
//! it never changes.
//!
//! Fragments are exactly the splitter's windows, whitespace-only ones included, so
//! neighbours keep their overlap and `index` is the window position. A document always holds
//! at least one non-blank fragment; a PDF with no extractable text is a
//! [`LoadError::NoText`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{error::LoadError, splitter::SplitterConfig};

/// A bounded, contiguous slice of the document text; the unit of retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Position in the document, starting at 0.
    pub index: usize,
    /// The fragment text.
    pub text: String,
}

/// A loaded document and its fragments.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    fragments: Vec<Fragment>,
}

impl Document {
    /// Reads and splits the PDF at `path`.
    ///
    /// # Errors
    /// - [`LoadError::Io`] if the file cannot be read,
    /// - [`LoadError::Parse`] if it is not a PDF `pdf-extract` understands,
    /// - [`LoadError::Splitter`] for unusable splitter settings,
    /// - [`LoadError::NoText`] if nothing but whitespace was extracted.
    pub fn load(path: &Path, splitter: &SplitterConfig) -> Result<Self, LoadError> {
        info!("Loading PDF: {}", path.display());
        let bytes = fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| LoadError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        debug!("Extracted {} characters", text.chars().count());

        Self::from_text(path, &text, splitter)
    }

    /// Builds a document from already extracted text.
    pub fn from_text(
        path: impl Into<PathBuf>,
        text: &str,
        splitter: &SplitterConfig,
    ) -> Result<Self, LoadError> {
        let path = path.into();
        let pieces = splitter.split(text)?;
        if pieces.iter().all(|piece| piece.trim().is_empty()) {
            return Err(LoadError::NoText { path });
        }

        let fragments: Vec<Fragment> = pieces
            .into_iter()
            .enumerate()
            .map(|(index, text)| Fragment { index, text })
            .collect();

        info!("Split {} into {} fragments", path.display(), fragments.len());
        Ok(Self { path, fragments })
    }

    /// Source file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fragments in document order. Never empty.
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}
