// Python bindings
//
// Exposes the muxing session and the normalization entry point to Python
// via maturin. Frames go in as bytes, the finished stream comes back as
// bytes.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyBytes;

use crate::error::MuxerError;
use crate::muxer::{MuxerSession, DEFAULT_FRAME_SAMPLES, OGG_OPUS_MIME_TYPE};

fn to_py_err(e: MuxerError) -> PyErr {
    PyValueError::new_err(e.to_string())
}

/// Incremental Ogg/Opus muxer
#[pyclass]
pub struct OpusMuxer {
    session: MuxerSession,
}

#[pymethods]
impl OpusMuxer {
    /// Create a muxing session
    ///
    /// Omitting `serial_number` draws a random stream serial.
    #[new]
    #[pyo3(signature = (sample_rate, channels, serial_number=None))]
    fn new(sample_rate: u32, channels: u8, serial_number: Option<u32>) -> Self {
        let session = match serial_number {
            Some(serial) => MuxerSession::with_serial(sample_rate, channels, serial),
            None => MuxerSession::new(sample_rate, channels),
        };
        OpusMuxer { session }
    }

    /// Append one Opus frame as one page
    #[pyo3(signature = (frame, samples=DEFAULT_FRAME_SAMPLES))]
    fn write_frame(&mut self, frame: Vec<u8>, samples: u64) -> PyResult<()> {
        self.session.write_frame(&frame, samples).map_err(to_py_err)
    }

    /// Append a batch of frames sharing one duration
    #[pyo3(signature = (frames, samples_per_frame=DEFAULT_FRAME_SAMPLES))]
    fn write_frames(&mut self, frames: Vec<Vec<u8>>, samples_per_frame: u64) -> PyResult<()> {
        self.session
            .write_frames(&frames, samples_per_frame)
            .map_err(to_py_err)
    }

    /// Finalize the stream and return its bytes
    fn finish(&mut self, py: Python<'_>) -> PyResult<Py<PyBytes>> {
        let stream = self.session.finish().map_err(to_py_err)?;
        Ok(PyBytes::new(py, &stream).into())
    }

    /// Re-stamp an externally produced page sequence
    fn normalize(&mut self, py: Python<'_>, pages: Vec<Vec<u8>>) -> PyResult<Vec<Py<PyBytes>>> {
        let restamped = self.session.normalize(&pages).map_err(to_py_err)?;
        Ok(restamped
            .iter()
            .map(|page| PyBytes::new(py, page).into())
            .collect())
    }

    #[getter]
    fn serial_number(&self) -> u32 {
        self.session.serial_number()
    }

    #[getter]
    fn granule_position(&self) -> u64 {
        self.session.granule_position()
    }

    #[getter]
    fn finished(&self) -> bool {
        self.session.is_finished()
    }

    fn __repr__(&self) -> String {
        format!(
            "OpusMuxer(serial_number={:#010x}, granule_position={}, finished={})",
            self.session.serial_number(),
            self.session.granule_position(),
            self.session.is_finished()
        )
    }
}

/// opusmux - Ogg/Opus streaming muxer
#[pymodule]
fn opusmux(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<OpusMuxer>()?;
    m.add("OGG_OPUS_MIME_TYPE", OGG_OPUS_MIME_TYPE)?;
    Ok(())
}
