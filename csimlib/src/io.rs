use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use crate::trace::TraceError;

const BUFFER_SIZE: usize = 64 * 1024;

/// Opens a trace file for sequential reading
///
/// On unix the file is memory mapped and the OS told reads will be sequential; elsewhere, or
/// for an empty file, it's read through a large buffer
pub fn open_trace(path: &Path) -> Result<Box<dyn BufRead>, TraceError> {
    let open_error = |source| TraceError::Open { path: path.to_path_buf(), source };
    let file = File::open(path).map_err(open_error)?;
    // Zero length mappings are rejected by some platforms
    let is_empty = file.metadata().map_err(open_error)?.len() == 0;
    // Memory map the file for speed on unix systems
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        if !is_empty {
            // The trace is only read, and the mapping lives no longer than the reader
            let mapped = unsafe { Mmap::map(&file) }.map_err(open_error)?;
            mapped.advise(Advice::Sequential).map_err(open_error)?;
            return Ok(Box::new(Cursor::new(mapped)));
        }
    }
    #[cfg(not(unix))]
    let _ = is_empty;
    Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
}
