//! Generational handles and the pool that hands them out
//!
//! A handle packs a 22-bit slot index and a 10-bit generation into a single
//! `u32`. The pool bumps a slot's generation every time the slot is freed,
//! so a handle held across a free/reuse cycle stops validating instead of
//! silently aliasing the new occupant.
//!
//! Freed slots are not recycled immediately: the pool keeps appending fresh
//! slots until `reuse_delay` freed indices are queued, then recycles the
//! oldest one. Ten generation bits give 1024 reuses per slot before the
//! counter wraps; that wrap is a known limit and is reported, not prevented.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;
use std::collections::VecDeque;

use crate::error::{HandleError, Result};

/// Number of bits used for the slot index
pub const INDEX_BITS: u32 = 22;
/// Number of bits used for the generation counter
pub const GENERATION_BITS: u32 = 10;

const INDEX_MASK: u32 = (1 << INDEX_BITS) - 1;
const GENERATION_MASK: u32 = (1 << GENERATION_BITS) - 1;

/// Default number of freed slots that must be pending before one is reused
pub const DEFAULT_REUSE_DELAY: usize = 1024;

/// A type-safe generational handle to a slot owned by an [`IdPool<T>`]
#[repr(transparent)]
pub struct Handle<T> {
    /// Lower 22 bits: index, upper 10 bits: generation
    bits: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// Largest index a pool may hand out. The all-ones index is reserved for
    /// [`Handle::INVALID`].
    pub const MAX_INDEX: u32 = INDEX_MASK - 1;
    /// Largest generation value before the counter wraps to zero
    pub const MAX_GENERATION: u16 = GENERATION_MASK as u16;

    /// The sentinel "no handle" value (all bits set). Never valid in any pool.
    pub const INVALID: Self = Self {
        bits: u32::MAX,
        _marker: PhantomData,
    };

    /// Pack an index and generation. Only pools construct live handles.
    #[inline]
    pub(crate) const fn pack(index: u32, generation: u16) -> Self {
        Self {
            bits: ((generation as u32 & GENERATION_MASK) << INDEX_BITS) | (index & INDEX_MASK),
            _marker: PhantomData,
        }
    }

    /// Slot index
    #[inline]
    pub const fn index(&self) -> u32 {
        self.bits & INDEX_MASK
    }

    /// Generation the slot had when this handle was produced
    #[inline]
    pub const fn generation(&self) -> u16 {
        ((self.bits >> INDEX_BITS) & GENERATION_MASK) as u16
    }

    /// Check for the sentinel value
    #[inline]
    pub const fn is_invalid(&self) -> bool {
        self.bits == u32::MAX
    }

    /// Opaque 32-bit representation, stable within one process
    #[inline]
    pub const fn to_bits(&self) -> u32 {
        self.bits
    }

    /// Rebuild a handle previously obtained from [`Handle::to_bits`]
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self {
            bits,
            _marker: PhantomData,
        }
    }
}

// Manual trait implementations to avoid T bounds
impl<T> Clone for Handle<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bits.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = core::any::type_name::<T>().rsplit("::").next().unwrap_or("?");
        if self.is_invalid() {
            write!(f, "Handle<{}>(invalid)", name)
        } else {
            write!(f, "Handle<{}>({}v{})", name, self.index(), self.generation())
        }
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::INVALID
    }
}

/// Allocates and reclaims [`Handle<T>`]s with delayed slot reuse
pub struct IdPool<T> {
    /// Current generation for every slot ever created
    generations: Vec<u16>,
    /// Freed indices, oldest first
    free: VecDeque<u32>,
    /// Freed slots that must be pending before the oldest is recycled
    reuse_delay: usize,
    /// Log when a slot's generation is about to wrap
    warn_on_wrap: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> IdPool<T> {
    /// Create a pool with the default reuse delay
    pub fn new() -> Self {
        Self::with_reuse_delay(DEFAULT_REUSE_DELAY)
    }

    /// Create a pool that recycles a slot only once `reuse_delay` freed
    /// slots are pending
    pub fn with_reuse_delay(reuse_delay: usize) -> Self {
        Self {
            generations: Vec::with_capacity(1024),
            free: VecDeque::new(),
            reuse_delay,
            warn_on_wrap: cfg!(debug_assertions),
            _marker: PhantomData,
        }
    }

    /// Enable or disable the generation wraparound warning
    pub fn set_wrap_warnings(&mut self, enabled: bool) {
        self.warn_on_wrap = enabled;
    }

    /// Allocate a handle. The flag is `true` when a previously freed slot
    /// was recycled, `false` when a fresh slot was appended.
    pub fn allocate(&mut self) -> Result<(Handle<T>, bool)> {
        if self.free.len() >= self.reuse_delay {
            if let Some(index) = self.free.pop_front() {
                let generation = self.generations[index as usize];
                return Ok((Handle::pack(index, generation), true));
            }
        }

        let index = self.generations.len() as u32;
        if index > Handle::<T>::MAX_INDEX {
            return Err(HandleError::Exhausted {
                limit: Handle::<T>::MAX_INDEX,
            });
        }
        self.generations.push(0);
        Ok((Handle::pack(index, 0), false))
    }

    /// Free a live handle, queueing its slot and bumping the generation
    pub fn deallocate(&mut self, handle: Handle<T>) -> Result<()> {
        if !self.is_valid(handle) {
            return Err(HandleError::Invalid {
                bits: handle.to_bits(),
            });
        }

        let index = handle.index();
        let generation = &mut self.generations[index as usize];
        if self.warn_on_wrap && *generation + 1 >= Handle::<T>::MAX_GENERATION {
            log::warn!(
                "{} slot {} is at generation {} of {}; stale handles may alias after wraparound",
                core::any::type_name::<T>(),
                index,
                *generation,
                Handle::<T>::MAX_GENERATION
            );
        }
        *generation = (*generation + 1) & GENERATION_MASK as u16;
        self.free.push_back(index);
        Ok(())
    }

    /// Check that the index is in range and the generation is current
    #[inline]
    pub fn is_valid(&self, handle: Handle<T>) -> bool {
        self.generations
            .get(handle.index() as usize)
            .map_or(false, |&generation| generation == handle.generation())
    }

    /// Current handle for a slot, whatever state the slot is in
    pub fn handle_at(&self, index: u32) -> Option<Handle<T>> {
        self.generations
            .get(index as usize)
            .map(|&generation| Handle::pack(index, generation))
    }

    /// Current generation of a slot
    pub fn generation_of(&self, index: u32) -> Option<u16> {
        self.generations.get(index as usize).copied()
    }

    /// Number of live handles
    pub fn len(&self) -> usize {
        self.generations.len() - self.free.len()
    }

    /// Check if no handles are live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of slots ever created
    pub fn capacity(&self) -> usize {
        self.generations.len()
    }

    /// Number of freed slots waiting for reuse
    pub fn pending_free(&self) -> usize {
        self.free.len()
    }

    /// Configured reuse delay
    pub fn reuse_delay(&self) -> usize {
        self.reuse_delay
    }
}

impl<T> Default for IdPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for IdPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdPool")
            .field("live", &self.len())
            .field("capacity", &self.capacity())
            .field("pending_free", &self.pending_free())
            .field("reuse_delay", &self.reuse_delay)
            .finish()
    }
}
