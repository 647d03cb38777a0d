//! # Symbol Table Lifecycle
//!
//! One table per process, built on first use and kept until explicit cleanup.
//!
//! ```text
//!                 initialize()
//! Uninitialized ──────────────► Initializing ──┬──► Ready
//!       ▲                                      └──► Failed
//!       │            cleanup()                        │
//!       └─────────────────────────────────────────────┘
//! ```
//!
//! - The build runs under a mutex, so exactly one caller parses the image;
//!   callers arriving meanwhile block on the mutex and then see the outcome.
//! - `Ready` and `Failed` are sticky. A failed build is not retried until
//!   `cleanup()` resets the registry.
//! - Lookups never take the mutex. They load the published table pointer,
//!   which is only written before `Ready` is stored and only cleared by
//!   `cleanup()`; hence the quiescence requirement on `cleanup()`.
//! - The building thread is recorded. If the source calls back into the same
//!   registry (a hook that symbolizes a stack while the table loads), the
//!   nested call reports the table as unavailable instead of deadlocking.

#![allow(unsafe_code)] // Publishing the table through a raw pointer

use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};
use thiserror::Error;

use crate::domain::SymbolError;
use crate::provider::{DefaultSource, SymbolSource};
use crate::symbolization::{SymbolMatch, SymbolTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RegistryState {
    Uninitialized = 0,
    Initializing = 1,
    Ready = 2,
    Failed = 3,
}

impl RegistryState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Initializing,
            2 => Self::Ready,
            3 => Self::Failed,
            _ => Self::Uninitialized,
        }
    }
}

/// Outcome of a lookup against the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    Symbol(SymbolMatch<'a>),
    /// Table is ready but no symbol covers the address
    Miss,
    /// No table: not yet built, being built, failed, or cleaned up
    Unavailable,
}

/// The failure recorded by the build, shared by every caller that observes it
#[derive(Error, Debug, Clone)]
#[error("Symbol table initialization failed: {0}")]
pub struct InitError(Arc<SymbolError>);

impl InitError {
    #[must_use]
    pub fn cause(&self) -> &SymbolError {
        &self.0
    }
}

/// Guards a single [`SymbolTable`] built from `S`
pub struct SymbolRegistry<S> {
    source: S,
    state: AtomicU8,
    table: AtomicPtr<SymbolTable>,
    /// Held for the duration of a build; stores the failure once `Failed`
    init: Mutex<Option<InitError>>,
    builds: AtomicUsize,
    /// Token of the thread running the source, 0 when no build is in flight
    builder: AtomicUsize,
}

thread_local! {
    static THREAD_TOKEN: u8 = const { 0 };
}

/// Nonzero and unique among live threads: the address of a thread-local
fn thread_token() -> usize {
    THREAD_TOKEN.try_with(|slot| ptr::from_ref(slot) as usize).unwrap_or(0)
}

/// Marks the current thread as the builder until dropped, even on unwind
struct BuilderMark<'a>(&'a AtomicUsize);

impl<'a> BuilderMark<'a> {
    fn set(builder: &'a AtomicUsize, token: usize) -> Self {
        builder.store(token, Ordering::Relaxed);
        Self(builder)
    }
}

impl Drop for BuilderMark<'_> {
    fn drop(&mut self) {
        self.0.store(0, Ordering::Relaxed);
    }
}

impl<S: SymbolSource> SymbolRegistry<S> {
    #[must_use]
    pub const fn new(source: S) -> Self {
        Self {
            source,
            state: AtomicU8::new(RegistryState::Uninitialized as u8),
            table: AtomicPtr::new(ptr::null_mut()),
            init: Mutex::new(None),
            builds: AtomicUsize::new(0),
            builder: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn state(&self) -> RegistryState {
        RegistryState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: RegistryState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Build the table if no build has happened since the last cleanup
    ///
    /// Safe to call from any number of threads; exactly one of them runs the
    /// source and all of them return the same outcome.
    ///
    /// # Errors
    /// Returns the recorded [`InitError`] when the build failed, now or on an
    /// earlier call. A call made by the source itself, on the building
    /// thread, returns [`SymbolError::Reentrant`] without recording it.
    pub fn initialize(&self) -> Result<(), InitError> {
        if self.state() == RegistryState::Ready {
            return Ok(());
        }
        if self.is_building_thread() {
            return Err(InitError(Arc::new(SymbolError::Reentrant)));
        }

        let outcome = {
            let mut failure = self.init.lock().unwrap_or_else(PoisonError::into_inner);

            if let Some(err) = failure.as_ref() {
                return Err(err.clone());
            }
            if self.state() == RegistryState::Ready {
                return Ok(());
            }

            self.set_state(RegistryState::Initializing);
            self.builds.fetch_add(1, Ordering::Relaxed);

            let loaded = {
                let _mark = BuilderMark::set(&self.builder, thread_token());
                self.source.load()
            };

            match loaded {
                Ok(table) => {
                    let entries = table.len();
                    let published = Box::into_raw(Box::new(table));
                    self.table.store(published, Ordering::Release);
                    self.set_state(RegistryState::Ready);
                    Ok(entries)
                }
                Err(err) => {
                    let err = InitError(Arc::new(err));
                    *failure = Some(err.clone());
                    self.set_state(RegistryState::Failed);
                    Err(err)
                }
            }
        };

        // Logged with the lock released; a logger may symbolize a backtrace
        match outcome {
            Ok(entries) => {
                info!("Symbol table ready: {entries} entries");
                Ok(())
            }
            Err(err) => {
                warn!("{err}");
                Err(err)
            }
        }
    }

    /// True once the table is ready, building it on first use
    ///
    /// A recorded failure is reported without taking the lock, as is a call
    /// from the thread currently running the source.
    #[must_use]
    pub fn ensure_ready(&self) -> bool {
        match self.state() {
            RegistryState::Ready => true,
            RegistryState::Failed => false,
            RegistryState::Initializing if self.is_building_thread() => false,
            RegistryState::Uninitialized | RegistryState::Initializing => {
                self.initialize().is_ok()
            }
        }
    }

    fn is_building_thread(&self) -> bool {
        let token = thread_token();
        token != 0 && self.builder.load(Ordering::Relaxed) == token
    }

    /// The published table, if any
    #[must_use]
    pub fn table(&self) -> Option<&SymbolTable> {
        if self.state() != RegistryState::Ready {
            return None;
        }
        let table = self.table.load(Ordering::Acquire);
        // SAFETY: a non-null pointer was produced by Box::into_raw in
        // initialize() and is only freed by cleanup(), whose caller guarantees
        // no reference obtained here is still alive.
        unsafe { table.as_ref() }
    }

    /// Look up `address` without building the table
    #[must_use]
    pub fn resolve(&self, address: u64) -> Resolution<'_> {
        match self.table() {
            None => Resolution::Unavailable,
            Some(table) => table.lookup(address).map_or(Resolution::Miss, Resolution::Symbol),
        }
    }

    /// Number of builds started since construction
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    /// Free the table and return to `Uninitialized`
    ///
    /// Idempotent. Also clears a recorded failure, so the next
    /// [`initialize`](Self::initialize) tries again.
    ///
    /// # Safety
    /// No thread may be inside [`resolve`](Self::resolve) or holding a
    /// reference from [`table`](Self::table) while this runs. Call it only
    /// once lookups have quiesced, typically at shutdown.
    pub unsafe fn cleanup(&self) {
        let mut failure = self.init.lock().unwrap_or_else(PoisonError::into_inner);

        self.set_state(RegistryState::Uninitialized);
        let table = self.table.swap(ptr::null_mut(), Ordering::AcqRel);
        if !table.is_null() {
            // SAFETY: produced by Box::into_raw and unreachable now that the
            // pointer is cleared; the caller guarantees no live borrows.
            drop(unsafe { Box::from_raw(table) });
        }
        *failure = None;
    }
}

impl<S> Drop for SymbolRegistry<S> {
    fn drop(&mut self) {
        let table = *self.table.get_mut();
        if !table.is_null() {
            // SAFETY: &mut self rules out outstanding borrows of the table
            drop(unsafe { Box::from_raw(table) });
        }
    }
}

static GLOBAL: SymbolRegistry<DefaultSource> = SymbolRegistry::new(DefaultSource {});

/// The process-wide registry used by the exported C functions
#[must_use]
pub fn global() -> &'static SymbolRegistry<DefaultSource> {
    &GLOBAL
}
