use std::collections::BTreeMap;
use std::io::{Read, Write};

use gridcalc_core::Position;

use crate::error::StoreError;
use crate::sheet::Sheet;

/// Separator between cell records (ASCII unit separator).
const CELL_SEP: u8 = 0x1F;
/// Separator between the fields of one record (ASCII record separator).
const FIELD_SEP: u8 = 0x1E;

impl Sheet {
    /// Serialize the sheet to the framed record stream. Returns false on
    /// any I/O failure.
    pub fn save(&self, sink: &mut impl Write) -> bool {
        match self.try_save(sink) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(error = %err, "sheet save failed");
                false
            }
        }
    }

    /// Parse a framed record stream, replacing the current contents.
    /// Returns false on I/O failure, framing mismatch or a rejected
    /// record, in which case the sheet is left unchanged.
    pub fn load(&mut self, source: &mut impl Read) -> bool {
        match self.try_load(source) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(error = %err, "sheet load failed");
                false
            }
        }
    }

    /// `save` with the failure preserved.
    ///
    /// The stream is `{`, a cell separator, one record per cell with
    /// contents in table order (`<A1-address> <FS> : <FS> <contents>
    /// <CS>`), then `}`. Cells that exist only because something referenced
    /// them have no contents and are skipped.
    pub fn try_save(&self, sink: &mut impl Write) -> Result<(), StoreError> {
        sink.write_all(&[b'{', CELL_SEP])?;

        for (pos, root) in self.table().iter() {
            if root.is_empty() {
                continue;
            }
            sink.write_all(pos.to_a1().as_bytes())?;
            sink.write_all(&[FIELD_SEP, b':', FIELD_SEP])?;
            sink.write_all(root.to_string().as_bytes())?;
            sink.write_all(&[CELL_SEP])?;
        }

        sink.write_all(&[b'}'])?;
        Ok(())
    }

    /// `load` with the failure preserved.
    pub fn try_load(&mut self, source: &mut impl Read) -> Result<(), StoreError> {
        let mut bytes = Vec::new();
        source.read_to_end(&mut bytes)?;

        let mut at = 0usize;
        expect_byte(&bytes, &mut at, b'{', "missing opening brace")?;
        expect_byte(&bytes, &mut at, CELL_SEP, "missing leading cell separator")?;

        let mut parsed = Sheet::new();
        loop {
            match bytes.get(at) {
                Some(&b'}') => break,
                Some(_) => {}
                None => return Err(StoreError::Framing("missing closing brace")),
            }

            let address = take_until(&bytes, &mut at, FIELD_SEP, "unterminated cell address")?;
            expect_byte(&bytes, &mut at, b':', "missing record marker")?;
            expect_byte(&bytes, &mut at, FIELD_SEP, "missing field separator")?;
            let contents = take_until(&bytes, &mut at, CELL_SEP, "unterminated cell record")?;

            let pos = Position::parse(&address)
                .map_err(|err| StoreError::Record(err.to_string()))?;
            if !parsed.set_cell(pos, &contents) {
                return Err(StoreError::Record(format!("cell {} rejected", pos)));
            }
        }

        *self = parsed;
        Ok(())
    }

    /// JSON snapshot: an object mapping A1 addresses to canonical cell
    /// text, e.g. `{"A1":"10","B2":"=(A1+5)"}`.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.snapshot())
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.snapshot())
    }

    /// Rebuild a sheet from a JSON snapshot, re-parsing every cell.
    pub fn from_json(json: &str) -> Result<Sheet, StoreError> {
        let cells: BTreeMap<String, String> = serde_json::from_str(json)?;

        let mut sheet = Sheet::new();
        for (address, contents) in cells {
            let pos = Position::parse(&address)
                .map_err(|err| StoreError::Record(err.to_string()))?;
            if !sheet.set_cell(pos, &contents) {
                return Err(StoreError::Record(format!("cell {} rejected", pos)));
            }
        }
        Ok(sheet)
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        self.table()
            .iter()
            .filter(|(_, root)| !root.is_empty())
            .map(|(pos, root)| (pos.to_a1(), root.to_string()))
            .collect()
    }
}

fn expect_byte(
    bytes: &[u8],
    at: &mut usize,
    want: u8,
    what: &'static str,
) -> Result<(), StoreError> {
    match bytes.get(*at) {
        Some(&b) if b == want => {
            *at += 1;
            Ok(())
        }
        _ => Err(StoreError::Framing(what)),
    }
}

fn take_until(
    bytes: &[u8],
    at: &mut usize,
    stop: u8,
    what: &'static str,
) -> Result<String, StoreError> {
    let start = *at;
    while let Some(&b) = bytes.get(*at) {
        if b == stop {
            let text = std::str::from_utf8(&bytes[start..*at])
                .map_err(|_| StoreError::Framing(what))?
                .to_string();
            *at += 1;
            return Ok(text);
        }
        *at += 1;
    }
    Err(StoreError::Framing(what))
}
