//! Backend selection and batch scheduling.
//!
//! The kernels only need one thing from a scheduler: split the output into
//! contiguous runs of batch elements, hand each run to a task together with
//! the matching slice of the output, and return once every task has finished.
//! [`BatchScheduler`] is that interface; [`Serial`] and [`Rayon`] implement it.
//!
//! The process-wide [`Backend`] picks the scheduler used by
//! [`crate::backprop::forward`] and [`crate::backprop::backward`]. It is
//! stored in an `AtomicU8`, so switching is cheap and thread-safe.
//!
//! # Pool size
//!
//! [`Rayon`] runs on whichever rayon pool is current: the global pool (sized
//! to the host's available parallelism) or a pool the caller enters with
//! [`rayon::ThreadPool::install`].

use core::convert::TryFrom;
use core::ops::Range;
use core::sync::atomic::{AtomicU8, Ordering};

use rayon::prelude::*;

/// Enumeration of supported scheduling backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Backend {
    /// Batch elements fanned out over the current rayon pool (default).
    #[default]
    Cpu = 0,
    /// Every batch element processed on the calling thread.
    Serial = 1,
}

impl TryFrom<u8> for Backend {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Cpu),
            1 => Ok(Self::Serial),
            _ => Err(()),
        }
    }
}

static GLOBAL_DEFAULT_BACKEND: AtomicU8 = AtomicU8::new(Backend::Cpu as u8);

/// Sets the backend used by the implicit-scheduler entry points.
///
/// # Example
/// ```
/// use active_shift::backend::{get_backend, set_backend, Backend};
/// set_backend(Backend::Serial);
/// assert_eq!(get_backend(), Backend::Serial);
/// set_backend(Backend::Cpu);
/// ```
pub fn set_backend(b: Backend) {
    GLOBAL_DEFAULT_BACKEND.store(b as u8, Ordering::Relaxed);
}

/// Returns the active backend, defaulting to [`Backend::Cpu`].
pub fn get_backend() -> Backend {
    Backend::try_from(GLOBAL_DEFAULT_BACKEND.load(Ordering::Relaxed)).unwrap_or_default()
}

/// "Submit independent batch ranges, join on completion."
///
/// `out` holds `out.len() / batch_len` batch elements laid out back to back.
/// `task` receives a range of batch indices and the sub-slice of `out` that
/// belongs to exactly those indices; ranges never overlap and together cover
/// every batch element. Implementations return only after all tasks ran.
pub trait BatchScheduler: Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &'static str;

    /// Runs `task` over disjoint batch ranges covering `out`.
    fn for_each_batch<T, F>(&self, out: &mut [T], batch_len: usize, task: F)
    where
        T: Send,
        F: Fn(Range<usize>, &mut [T]) + Sync + Send;
}

/// Single-threaded scheduler: one task covering every batch element.
#[derive(Debug, Clone, Copy, Default)]
pub struct Serial;

impl BatchScheduler for Serial {
    fn name(&self) -> &'static str {
        "serial"
    }

    fn for_each_batch<T, F>(&self, out: &mut [T], batch_len: usize, task: F)
    where
        T: Send,
        F: Fn(Range<usize>, &mut [T]) + Sync + Send,
    {
        if batch_len == 0 || out.is_empty() {
            return;
        }
        task(0..out.len() / batch_len, out);
    }
}

/// Fans batch ranges out over the current rayon pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rayon;

impl BatchScheduler for Rayon {
    fn name(&self) -> &'static str {
        "rayon"
    }

    fn for_each_batch<T, F>(&self, out: &mut [T], batch_len: usize, task: F)
    where
        T: Send,
        F: Fn(Range<usize>, &mut [T]) + Sync + Send,
    {
        if batch_len == 0 || out.is_empty() {
            return;
        }
        let batches = out.len() / batch_len;
        let per_task = batches.div_ceil(rayon::current_num_threads()).max(1);

        out.par_chunks_mut(per_task * batch_len)
            .enumerate()
            .for_each(|(i, chunk)| {
                let start = i * per_task;
                task(start..start + chunk.len() / batch_len, chunk);
            });
    }
}
