//! Per-source read cursor over one open store.
//!
//! Positions the store on the request window, then pulls whole records with
//! [`Store::next`] as the buffer drains, clipping everything to the window.
//! Records are always consumed whole, so lines the engine later discards
//! (species filter, replacement override) never cost lines behind them.
//! Energies are normalized to cm⁻¹ as lines enter the buffer.

use std::collections::VecDeque;

use crate::codec::LineRecord;
use crate::config::{EnergyUnit, ExtractionRequest, LinelistSource};
use crate::error::StoreError;
use crate::format::units::EV_TO_INV_CM;
use crate::store::Store;

pub struct SourceCursor {
    store: Option<Store>,
    source: LinelistSource,
    index: usize,
    buf: VecDeque<LineRecord>,
    wl_min: f64,
    wl_max: f64,
    exhausted: bool,
}

impl SourceCursor {
    /// Open the source's store and position it on the request window.
    ///
    /// A window entirely outside the store's span yields an already
    /// exhausted cursor, not an error; the source simply contributes
    /// nothing.
    pub fn open(
        source: LinelistSource,
        index: usize,
        request: &ExtractionRequest,
    ) -> Result<Self, StoreError> {
        let mut store = Store::open(&source.data_path, &source.descriptor_path)?;
        match store.seek_range(request.wl_start, request.wl_end) {
            Ok(()) => Ok(SourceCursor {
                store: Some(store),
                source,
                index,
                buf: VecDeque::new(),
                wl_min: request.wl_start,
                wl_max: request.wl_end,
                exhausted: false,
            }),
            Err(StoreError::OutOfRange { .. }) => {
                tracing::debug!(source = %source.name, "request window outside store span");
                store.close();
                Ok(SourceCursor {
                    store: None,
                    source,
                    index,
                    buf: VecDeque::new(),
                    wl_min: request.wl_start,
                    wl_max: request.wl_end,
                    exhausted: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Next unconsumed line, refilling from the store as needed
    pub fn peek(&mut self) -> Result<Option<&LineRecord>, StoreError> {
        while self.buf.is_empty() && !self.exhausted {
            self.refill()?;
        }
        Ok(self.buf.front())
    }

    /// Consume the line [`SourceCursor::peek`] would return
    pub fn pop(&mut self) -> Result<Option<LineRecord>, StoreError> {
        while self.buf.is_empty() && !self.exhausted {
            self.refill()?;
        }
        Ok(self.buf.pop_front())
    }

    pub fn source(&self) -> &LinelistSource {
        &self.source
    }

    /// Position of this source in the request's source list
    pub fn index(&self) -> usize {
        self.index
    }

    fn refill(&mut self) -> Result<(), StoreError> {
        let store = match self.store.as_mut() {
            Some(s) => s,
            None => {
                self.exhausted = true;
                return Ok(());
            }
        };
        match store.next()? {
            None => self.finish(),
            Some(lines) => {
                // Sorted data: a record opening past the window ends the source
                if lines.first().map_or(true, |l| l.wavelength > self.wl_max) {
                    self.finish();
                } else {
                    self.absorb(lines);
                }
            }
        }
        Ok(())
    }

    fn absorb(&mut self, lines: Vec<LineRecord>) {
        let from_ev = self.source.energy_unit == EnergyUnit::ElectronVolt;
        for mut line in lines {
            if line.wavelength > self.wl_max {
                self.finish();
                break;
            }
            if line.wavelength < self.wl_min {
                continue;
            }
            if from_ev {
                line.e_lower *= EV_TO_INV_CM;
                line.e_upper *= EV_TO_INV_CM;
            }
            self.buf.push_back(line);
        }
    }

    fn finish(&mut self) {
        self.exhausted = true;
        if let Some(mut store) = self.store.take() {
            store.close();
        }
    }
}
