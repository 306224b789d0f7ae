//! In-memory stand-ins for hardware and host capabilities used by tests.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use super::capture::{CaptureError, InputStream, Microphone};
use super::clip_store::{ClipStore, PlayableUrl};
use super::encoder::EncodedClip;
use super::visualizations::Surface;

const CHUNK_LEN: usize = 441;

#[derive(Default)]
struct MicLog {
    acquisitions: usize,
    paused: bool,
    stopped: bool,
}

/// Microphone producing a fixed chunk of tone per read.
#[derive(Clone)]
pub struct FakeMicrophone {
    sample_rate: u32,
    fail: bool,
    log: Rc<RefCell<MicLog>>,
}

impl FakeMicrophone {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            fail: false,
            log: Rc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(44_100)
        }
    }

    pub fn acquisitions(&self) -> usize {
        self.log.borrow().acquisitions
    }

    pub fn is_paused(&self) -> bool {
        self.log.borrow().paused
    }

    pub fn is_stopped(&self) -> bool {
        self.log.borrow().stopped
    }

    pub fn chunk_len(&self) -> usize {
        CHUNK_LEN
    }
}

impl Microphone for FakeMicrophone {
    fn acquire(&mut self, _requested_sample_rate: u32) -> Result<Box<dyn InputStream>, CaptureError> {
        if self.fail {
            return Err(CaptureError::PermissionDenied);
        }
        let mut log = self.log.borrow_mut();
        log.acquisitions += 1;
        log.paused = false;
        log.stopped = false;
        Ok(Box::new(FakeStream {
            sample_rate: self.sample_rate,
            log: Rc::clone(&self.log),
        }))
    }
}

struct FakeStream {
    sample_rate: u32,
    log: Rc<RefCell<MicLog>>,
}

impl InputStream for FakeStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self) -> Vec<i16> {
        let log = self.log.borrow();
        if log.paused || log.stopped {
            return Vec::new();
        }
        (0..CHUNK_LEN)
            .map(|i| if i % 2 == 0 { 8_000 } else { -8_000 })
            .collect()
    }

    fn set_paused(&mut self, paused: bool) {
        self.log.borrow_mut().paused = paused;
    }

    fn stop(&mut self) {
        self.log.borrow_mut().stopped = true;
    }
}

#[derive(Default)]
struct StoreLog {
    fail: bool,
    minted: usize,
    live: Vec<String>,
}

/// Clip store that only tracks which URLs are outstanding.
#[derive(Clone, Default)]
pub struct FakeStore {
    log: Rc<RefCell<StoreLog>>,
}

impl FakeStore {
    /// Store whose `mint` always fails.
    pub fn failing() -> Self {
        let store = Self::default();
        store.log.borrow_mut().fail = true;
        store
    }

    pub fn minted(&self) -> usize {
        self.log.borrow().minted
    }

    pub fn live(&self) -> usize {
        self.log.borrow().live.len()
    }
}

impl ClipStore for FakeStore {
    fn mint(&mut self, clip: &EncodedClip) -> anyhow::Result<PlayableUrl> {
        let mut log = self.log.borrow_mut();
        if log.fail {
            anyhow::bail!("clip store unavailable");
        }
        log.minted += 1;
        let url = format!("memory://clip-{}.{}", log.minted, clip.format.extension());
        log.live.push(url.clone());
        Ok(PlayableUrl {
            url,
            path: PathBuf::new(),
        })
    }

    fn release(&mut self, url: &PlayableUrl) {
        self.log.borrow_mut().live.retain(|u| u != &url.url);
    }
}

/// Surface remembering what was drawn on it.
#[derive(Default)]
pub struct RecordingSurface {
    pub clears: usize,
    pub strokes: Vec<Vec<(f64, f64)>>,
    pub line_width: f64,
}

impl RecordingSurface {
    pub fn last_points(&self) -> &[(f64, f64)] {
        self.strokes.last().map(Vec::as_slice).unwrap_or(&[])
    }
}

impl Surface for RecordingSurface {
    fn width(&self) -> f64 {
        300.0
    }

    fn height(&self) -> f64 {
        100.0
    }

    fn clear(&mut self) {
        self.clears += 1;
    }

    fn stroke_polyline(&mut self, points: &[(f64, f64)], line_width: f64) {
        self.strokes.push(points.to_vec());
        self.line_width = line_width;
    }
}
