use std::sync::Arc;

use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};

use crate::{Buffer, SLAB_OVERHEAD};

/// A sealed, ordered group of buffers with a fixed byte footprint.
///
/// Slabs are the leaf unit of the log's tree. They are created whole - by
/// sealing a full tail or by wrapping an oversized buffer - and never grow
/// or shrink afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Slab {
    buffers: Arc<NonEmpty<Buffer>>,
    length: u64,
    byte_count: u64,
}

impl Slab {
    /// Seal the given buffers into a new [`Slab`].
    pub fn new(buffers: NonEmpty<Buffer>) -> Self {
        let length = buffers.iter().map(|buffer| buffer.length()).sum();
        let byte_count = SLAB_OVERHEAD
            + buffers
                .iter()
                .map(|buffer| buffer.byte_count())
                .sum::<u64>();
        Slab {
            buffers: Arc::new(buffers),
            length,
            byte_count,
        }
    }

    /// Seal a single buffer into a [`Slab`] of its own.
    pub fn singleton(buffer: Buffer) -> Self {
        Slab::new(NonEmpty::singleton(buffer))
    }

    /// The buffers in this slab, in logical order.
    pub fn buffers(&self) -> &NonEmpty<Buffer> {
        &self.buffers
    }

    /// The number of messages in this slab.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// The serialized size of this slab, framing included.
    pub fn byte_count(&self) -> u64 {
        self.byte_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BUFFER_OVERHEAD, Buffer};

    #[test]
    fn it_aggregates_over_its_buffers() {
        let slab = Slab::new(NonEmpty::from((
            Buffer::bytes(vec![0; 10]),
            vec![Buffer::bytes(vec![0; 20]), Buffer::text("abc")],
        )));

        assert_eq!(slab.length(), 3);
        assert_eq!(slab.byte_count(), SLAB_OVERHEAD + 3 * BUFFER_OVERHEAD + 33);
    }

    #[test]
    fn it_seals_a_singleton() {
        let slab = Slab::singleton(Buffer::text("only"));

        assert_eq!(slab.length(), 1);
        assert_eq!(slab.buffers().len(), 1);
    }
}
