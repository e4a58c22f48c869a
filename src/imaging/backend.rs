//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the single operation the variant cache
//! needs: turn a source byte stream into an encoded, exactly-sized JPEG.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, built on the
//! `image` crate. Tests swap in a recording mock so resolver logic can be
//! exercised without decoding pixels.

use super::params::FitParams;
use std::io::Read;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Trait for image processing backends.
pub trait ImageBackend: Sync {
    /// Decode `source`, orient it, fit-crop it to the target box and encode
    /// the result as JPEG bytes.
    ///
    /// Unreadable or corrupt input must surface as an error; backends never
    /// substitute a placeholder image.
    fn fit(&self, source: &mut dyn Read, params: &FitParams) -> Result<Vec<u8>, BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::params::{CropFocus, Quality};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Mock backend that records operations and returns canned bytes.
    /// Uses Mutex (not RefCell) so it is Sync like the real backend.
    #[derive(Default)]
    pub struct MockBackend {
        pub operations: Mutex<Vec<RecordedOp>>,
        fail: AtomicBool,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Fit {
            source_len: usize,
            width: u32,
            height: u32,
            focus: (u8, u8),
            quality: u32,
        },
    }

    /// Bytes every successful mock fit returns.
    pub const MOCK_OUTPUT: &[u8] = b"mock-jpeg";

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// A backend whose every fit fails with a decode error.
        pub fn failing() -> Self {
            let backend = Self::default();
            backend.fail.store(true, Ordering::SeqCst);
            backend
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageBackend for MockBackend {
        fn fit(&self, source: &mut dyn Read, params: &FitParams) -> Result<Vec<u8>, BackendError> {
            let mut bytes = Vec::new();
            source.read_to_end(&mut bytes)?;
            self.operations.lock().unwrap().push(RecordedOp::Fit {
                source_len: bytes.len(),
                width: params.width,
                height: params.height,
                focus: (params.focus.x, params.focus.y),
                quality: params.quality.value(),
            });
            if self.fail.load(Ordering::SeqCst) {
                return Err(BackendError::Decode("mock decode failure".to_string()));
            }
            Ok(MOCK_OUTPUT.to_vec())
        }
    }

    #[test]
    fn mock_records_fit() {
        let backend = MockBackend::new();
        let out = backend
            .fit(
                &mut &b"source"[..],
                &FitParams {
                    width: 800,
                    height: 450,
                    focus: CropFocus::new(30, 60),
                    quality: Quality::new(88),
                },
            )
            .unwrap();
        assert_eq!(out, MOCK_OUTPUT);

        let ops = backend.get_operations();
        assert_eq!(
            ops,
            vec![RecordedOp::Fit {
                source_len: 6,
                width: 800,
                height: 450,
                focus: (30, 60),
                quality: 88,
            }]
        );
    }

    #[test]
    fn failing_mock_still_records() {
        let backend = MockBackend::failing();
        let result = backend.fit(
            &mut &b""[..],
            &FitParams {
                width: 10,
                height: 10,
                focus: CropFocus::CENTER,
                quality: Quality::default(),
            },
        );
        assert!(matches!(result, Err(BackendError::Decode(_))));
        assert_eq!(backend.get_operations().len(), 1);
    }
}
