//! Thin façade over intra-process (threads) or inter-process (MPI) message passing.
//!
//! Messages are *contiguous byte slices*. Sends are fire-and-forget from the
//! caller's point of view; receives return a handle whose `.wait()` blocks
//! until the message has arrived. Messages between the same pair of ranks with
//! the same tag are delivered in the order they were sent.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::{Condvar, Mutex};

use crate::mesh_error::MeshError;

/// Typed message tag, so independent protocols cannot be confused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommTag(u16);

impl CommTag {
    pub const fn new(tag: u16) -> Self {
        Self(tag)
    }

    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// The tag `k` steps after this one.
    #[inline]
    pub const fn offset(self, k: u16) -> Self {
        Self(self.0.wrapping_add(k))
    }
}

/// Tags used by the two stages of a section completion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionCommTags {
    pub sizes: CommTag,
    pub data: CommTag,
}

impl SectionCommTags {
    /// `sizes = base`, `data = base + 1`.
    pub const fn from_base(base: CommTag) -> Self {
        Self {
            sizes: base,
            data: base.offset(1),
        }
    }
}

/// Tag reserved for [`Communicator::barrier`].
pub const BARRIER_TAG: CommTag = CommTag::new(0xFFF0);

/// Anything that can be waited on.
pub trait Wait {
    /// Wait for completion and return the received data (if any).
    fn wait(self) -> Option<Vec<u8>>;
}

impl Wait for () {
    fn wait(self) -> Option<Vec<u8>> {
        None
    }
}

/// Non-blocking point-to-point communication plus the few collectives the
/// crate needs, expressed on top of it by default.
pub trait Communicator: Send + Sync + 'static {
    /// Handle returned by `isend`.
    type SendHandle: Wait;
    /// Handle returned by `irecv`.
    type RecvHandle: Wait;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> Self::SendHandle;
    fn irecv(&self, peer: usize, tag: u16) -> Self::RecvHandle;

    /// Rank of this process in the group.
    fn rank(&self) -> usize;
    /// Number of processes in the group.
    fn size(&self) -> usize;

    /// Root sends `data` to every other rank; every rank returns the root's bytes.
    fn broadcast(&self, root: usize, tag: CommTag, data: &[u8]) -> Result<Vec<u8>, MeshError> {
        if self.rank() == root {
            let sends: Vec<_> = (0..self.size())
                .filter(|&r| r != root)
                .map(|r| self.isend(r, tag.as_u16(), data))
                .collect();
            for s in sends {
                let _ = s.wait();
            }
            Ok(data.to_vec())
        } else {
            self.irecv(root, tag.as_u16())
                .wait()
                .ok_or_else(|| MeshError::CommError {
                    neighbor: root,
                    message: format!("broadcast from rank {root} was not delivered"),
                })
        }
    }

    /// Every rank contributes `data`; returns all contributions indexed by rank.
    fn allgather(&self, tag: CommTag, data: &[u8]) -> Result<Vec<Vec<u8>>, MeshError> {
        let me = self.rank();
        let peers: Vec<usize> = (0..self.size()).filter(|&r| r != me).collect();
        let recvs: Vec<_> = peers
            .iter()
            .map(|&r| (r, self.irecv(r, tag.as_u16())))
            .collect();
        let sends: Vec<_> = peers
            .iter()
            .map(|&r| self.isend(r, tag.as_u16(), data))
            .collect();
        let mut out = vec![Vec::new(); self.size()];
        out[me] = data.to_vec();
        let mut maybe_err = None;
        for (r, h) in recvs {
            match h.wait() {
                Some(bytes) => out[r] = bytes,
                None if maybe_err.is_none() => {
                    maybe_err = Some(MeshError::CommError {
                        neighbor: r,
                        message: format!("allgather contribution from rank {r} was not delivered"),
                    });
                }
                None => {}
            }
        }
        for s in sends {
            let _ = s.wait();
        }
        maybe_err.map_or(Ok(out), Err)
    }

    /// Block until every rank has reached the barrier.
    fn barrier(&self) {
        if self.size() > 1 {
            let _ = self.allgather(BARRIER_TAG, &[]);
        }
    }
}

/// Compile-time no-op comm for serial runs: rank 0 of 1.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    type SendHandle = ();
    type RecvHandle = ();

    fn isend(&self, _peer: usize, _tag: u16, _buf: &[u8]) {}
    fn irecv(&self, _peer: usize, _tag: u16) {}

    fn rank(&self) -> usize {
        0
    }
    fn size(&self) -> usize {
        1
    }
}

// --- ThreadComm: a group of ranks inside one process ---

type Key = (usize, usize, u16); // (src, dst, tag)

#[derive(Default)]
struct Mailbox {
    queues: Mutex<HashMap<Key, VecDeque<Bytes>>>,
    arrived: Condvar,
}

/// In-process communicator: each rank is a thread holding one handle of a
/// group created by [`ThreadComm::world`]. Groups never see each other's messages.
#[derive(Clone)]
pub struct ThreadComm {
    rank: usize,
    size: usize,
    timeout: Duration,
    mailbox: Arc<Mailbox>,
}

impl std::fmt::Debug for ThreadComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadComm")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .finish()
    }
}

impl ThreadComm {
    /// Receives give up (returning `None`) after this long without a matching message.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    /// One handle per rank of a fresh group of `size` ranks.
    pub fn world(size: usize) -> Vec<ThreadComm> {
        let mailbox = Arc::new(Mailbox::default());
        (0..size)
            .map(|rank| ThreadComm {
                rank,
                size,
                timeout: Self::DEFAULT_TIMEOUT,
                mailbox: Arc::clone(&mailbox),
            })
            .collect()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Pending receive on a [`ThreadComm`].
pub struct ThreadRecv {
    mailbox: Arc<Mailbox>,
    key: Key,
    timeout: Duration,
}

impl Wait for ThreadRecv {
    fn wait(self) -> Option<Vec<u8>> {
        let mut queues = self.mailbox.queues.lock();
        loop {
            if let Some(bytes) = queues.get_mut(&self.key).and_then(VecDeque::pop_front) {
                return Some(bytes.to_vec());
            }
            if self
                .mailbox
                .arrived
                .wait_for(&mut queues, self.timeout)
                .timed_out()
            {
                return queues
                    .get_mut(&self.key)
                    .and_then(VecDeque::pop_front)
                    .map(|b| b.to_vec());
            }
        }
    }
}

impl Communicator for ThreadComm {
    type SendHandle = ();
    type RecvHandle = ThreadRecv;

    fn isend(&self, peer: usize, tag: u16, buf: &[u8]) {
        let key = (self.rank, peer, tag);
        self.mailbox
            .queues
            .lock()
            .entry(key)
            .or_default()
            .push_back(Bytes::copy_from_slice(buf));
        self.mailbox.arrived.notify_all();
    }

    fn irecv(&self, peer: usize, tag: u16) -> ThreadRecv {
        ThreadRecv {
            mailbox: Arc::clone(&self.mailbox),
            key: (peer, self.rank, tag),
            timeout: self.timeout,
        }
    }

    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::*;
    use mpi::environment::Universe;
    use mpi::request::{Request, StaticScope};
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// MPI world communicator. Owns the MPI environment; dropping it finalizes MPI.
    pub struct MpiComm {
        pub world: SimpleCommunicator,
        rank: usize,
        size: usize,
        _universe: Universe,
    }

    // One MPI rank per process; the communicator is only driven from the thread
    // that owns the mesh.
    unsafe impl Send for MpiComm {}
    unsafe impl Sync for MpiComm {}

    impl MpiComm {
        /// Initialise MPI. Fails if MPI was already initialised.
        pub fn new() -> Result<Self, MeshError> {
            let universe = mpi::initialize().ok_or_else(|| MeshError::CommError {
                neighbor: 0,
                message: "MPI is already initialised".to_string(),
            })?;
            let world = universe.world();
            let rank = world.rank() as usize;
            let size = world.size() as usize;
            Ok(Self {
                world,
                rank,
                size,
                _universe: universe,
            })
        }
    }

    /// In-flight send; owns the buffer until the request completes.
    pub struct MpiSend {
        req: Option<Request<'static, [u8], StaticScope>>,
        buf: *mut [u8],
    }

    unsafe impl Send for MpiSend {}

    impl Wait for MpiSend {
        fn wait(mut self) -> Option<Vec<u8>> {
            if let Some(req) = self.req.take() {
                req.wait();
            }
            // SAFETY: `buf` came from `Box::leak` in `isend` and the request using it is complete.
            unsafe { drop(Box::from_raw(self.buf)) };
            None
        }
    }

    /// Deferred receive: the blocking matched receive happens in `wait`, so
    /// posting receives before sends cannot deadlock.
    pub struct MpiRecv {
        world: *const SimpleCommunicator,
        peer: i32,
        tag: i32,
    }

    unsafe impl Send for MpiRecv {}

    impl Wait for MpiRecv {
        fn wait(self) -> Option<Vec<u8>> {
            // SAFETY: receive handles are waited on before the `MpiComm` that created them is dropped.
            let world = unsafe { &*self.world };
            let (data, _status) = world
                .process_at_rank(self.peer)
                .receive_vec_with_tag::<u8>(self.tag);
            Some(data)
        }
    }

    impl Communicator for MpiComm {
        type SendHandle = MpiSend;
        type RecvHandle = MpiRecv;

        fn isend(&self, peer: usize, tag: u16, buf: &[u8]) -> MpiSend {
            let leaked: &'static mut [u8] = Box::leak(buf.to_vec().into_boxed_slice());
            let raw: *mut [u8] = leaked;
            // SAFETY: the buffer stays alive until `MpiSend::wait` reclaims it.
            let data: &'static [u8] = unsafe { &*raw };
            let req = self.world.process_at_rank(peer as i32).immediate_send_with_tag(
                StaticScope,
                data,
                tag as i32,
            );
            MpiSend {
                req: Some(req),
                buf: raw,
            }
        }

        fn irecv(&self, peer: usize, tag: u16) -> MpiRecv {
            MpiRecv {
                world: &self.world,
                peer: peer as i32,
                tag: tag as i32,
            }
        }

        fn rank(&self) -> usize {
            self.rank
        }
        fn size(&self) -> usize {
            self.size
        }

        fn barrier(&self) {
            self.world.barrier();
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
