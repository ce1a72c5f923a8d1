//! Visualization trace sink.
//!
//! A tree with a sink attached writes one line per page a search visits,
//! and page dumps on request:
//!
//! ```text
//! VISIT node 4
//! INDEX CHILDREN 4 nodes
//!  2   5   9
//! LEAF CHILDREN 5 nodes
//!    10 [1,0]   11 [1,1]
//! ```
//!
//! This is separate from `tracing` logging: the format is fixed so external
//! visualizers can parse it.

use std::fmt;
use std::io::{self, Write};

use crate::common::PageId;

use super::key::{Key, RecordId};

/// An append-only destination for trace lines.
pub struct TraceSink {
    out: Box<dyn Write>,
}

impl TraceSink {
    pub fn new(out: Box<dyn Write>) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> Box<dyn Write> {
        self.out
    }

    pub fn visit(&mut self, page_id: PageId) -> io::Result<()> {
        writeln!(self.out, "VISIT node {}", page_id.0)?;
        self.out.flush()
    }

    /// Dump an index node: its leftmost child, then each entry's child.
    pub fn index_children(
        &mut self,
        page_id: PageId,
        leftmost: PageId,
        children: impl IntoIterator<Item = PageId>,
    ) -> io::Result<()> {
        writeln!(self.out, "INDEX CHILDREN {} nodes", page_id.0)?;
        write!(self.out, " {}", leftmost.0)?;
        for child in children {
            write!(self.out, "   {}", child.0)?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }

    pub fn leaf_children<'k>(
        &mut self,
        page_id: PageId,
        entries: impl IntoIterator<Item = &'k (Key, RecordId)>,
    ) -> io::Result<()> {
        writeln!(self.out, "LEAF CHILDREN {} nodes", page_id.0)?;
        for (key, rid) in entries {
            write!(self.out, "   {key} {rid}")?;
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}

impl fmt::Debug for TraceSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceSink").finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::io::{self, Write};
    use std::sync::Arc;

    use parking_lot::Mutex;

    /// A cloneable in-memory writer, so a test can keep reading what a
    /// tree's sink received.
    #[derive(Clone, Default)]
    pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
