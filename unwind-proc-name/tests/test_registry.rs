#![allow(unsafe_code)] // cleanup() is unsafe

mod common;

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Barrier};
use std::thread;
use std::time::Duration;

use common::{sample_image, PeBuilder, TEXT};
use unwind_proc_name::domain::{SymbolError, SymbolName};
use unwind_proc_name::provider::ImageFile;
use unwind_proc_name::registry::{RegistryState, Resolution, SymbolRegistry};
use unwind_proc_name::symbolization::{SymbolEntry, SymbolTable};

const THREADS: usize = 16;

fn table_address(registry: &SymbolRegistry<impl unwind_proc_name::provider::SymbolSource>) -> usize {
    registry.table().map_or(0, |table| std::ptr::from_ref(table) as usize)
}

#[test]
fn test_concurrent_initialize_builds_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let registry = SymbolRegistry::new(move || -> Result<SymbolTable, SymbolError> {
        counter.fetch_add(1, Ordering::SeqCst);
        // Widen the window for racing callers
        thread::sleep(Duration::from_millis(20));
        Ok(SymbolTable::from_entries(vec![SymbolEntry {
            address: 0x1000,
            name: SymbolName::from("only"),
        }]))
    });
    let barrier = Barrier::new(THREADS);

    let tables: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    registry.initialize().unwrap();
                    table_address(&registry)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(registry.build_count(), 1);
    assert_ne!(tables[0], 0);
    assert!(tables.iter().all(|&t| t == tables[0]));
}

#[test]
fn test_concurrent_failure_observed_by_all() {
    let registry = SymbolRegistry::new(ImageFile::new("/nonexistent/app.exe", None));
    let barrier = Barrier::new(THREADS);

    let outcomes: Vec<bool> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    registry.initialize().is_err()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(outcomes.into_iter().all(|failed| failed));
    assert_eq!(registry.build_count(), 1);
    assert_eq!(registry.state(), RegistryState::Failed);
}

#[test]
fn test_resolve_from_synthetic_image() {
    let file = sample_image().write_temp();
    let registry = SymbolRegistry::new(ImageFile::new(file.path(), Some(0x7ff6_0000_0000)));

    assert_eq!(registry.resolve(0x7ff6_0000_1000), Resolution::Unavailable);
    registry.initialize().unwrap();

    let Resolution::Symbol(found) = registry.resolve(0x7ff6_0000_1120) else {
        panic!("expected a symbol");
    };
    assert_eq!(found.name.to_string(), "worker_loop_with_a_long_name");
    assert_eq!(found.offset, 0);

    assert_eq!(registry.resolve(0x7ff6_0000_0fff), Resolution::Miss);
}

#[test]
fn test_failure_is_not_retried() {
    let registry = SymbolRegistry::new(ImageFile::new("/nonexistent/app.exe", None));

    let err = registry.initialize().unwrap_err();
    assert!(err.cause().is_image_access());
    assert!(registry.initialize().is_err());
    assert!(!registry.ensure_ready());

    assert_eq!(registry.build_count(), 1);
    assert_eq!(registry.resolve(0x1000), Resolution::Unavailable);
}

#[test]
fn test_malformed_image_fails_initialization() {
    let mut image = sample_image().build();
    image[0] = 0;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, &image).unwrap();

    let registry = SymbolRegistry::new(ImageFile::new(file.path(), None));
    let err = registry.initialize().unwrap_err();
    assert!(matches!(err.cause(), SymbolError::Format(_)));
    assert_eq!(registry.state(), RegistryState::Failed);
}

#[test]
fn test_cleanup_never_serves_stale_names() {
    let file = sample_image().write_temp();
    let registry = SymbolRegistry::new(ImageFile::new(file.path(), None));
    registry.initialize().unwrap();
    assert!(matches!(registry.resolve(0x1_4000_1000), Resolution::Symbol(_)));

    // SAFETY: no lookups in flight on this registry
    unsafe { registry.cleanup() };
    assert_eq!(registry.state(), RegistryState::Uninitialized);
    assert_eq!(registry.resolve(0x1_4000_1000), Resolution::Unavailable);
    assert!(registry.table().is_none());

    registry.initialize().unwrap();
    assert_eq!(registry.build_count(), 2);
    assert!(matches!(registry.resolve(0x1_4000_1000), Resolution::Symbol(_)));
}

#[test]
fn test_empty_symbol_table_initializes() {
    let file = PeBuilder::new().section(".text", 0x1000, TEXT).stripped().write_temp();
    let registry = SymbolRegistry::new(ImageFile::new(file.path(), None));

    registry.initialize().unwrap();
    assert_eq!(registry.state(), RegistryState::Ready);
    assert_eq!(registry.table().map(SymbolTable::len), Some(0));
    assert_eq!(registry.resolve(0x1_4000_1000), Resolution::Miss);
}

#[test]
fn test_concurrent_resolve_after_initialize() {
    let file = sample_image().write_temp();
    let registry = SymbolRegistry::new(ImageFile::new(file.path(), None));
    registry.initialize().unwrap();

    thread::scope(|s| {
        for offset in 0..THREADS as u64 {
            let registry = &registry;
            s.spawn(move || {
                let address = 0x1_4000_1000 + offset;
                let Resolution::Symbol(found) = registry.resolve(address) else {
                    panic!("expected a symbol at 0x{address:x}");
                };
                assert_eq!(found.name.to_string(), "main");
                assert_eq!(found.offset, offset);
            });
        }
    });
}

type SourceFn = fn() -> Result<SymbolTable, SymbolError>;

static CALLS_BACK: SymbolRegistry<SourceFn> = SymbolRegistry::new(load_calling_back as SourceFn);
static NESTED_READY: AtomicBool = AtomicBool::new(true);
static NESTED_INIT_OK: AtomicBool = AtomicBool::new(true);
static NESTED_UNAVAILABLE: AtomicBool = AtomicBool::new(false);

/// A source that symbolizes through its own registry mid-build, the way a
/// logging or allocation hook might
fn load_calling_back() -> Result<SymbolTable, SymbolError> {
    NESTED_READY.store(CALLS_BACK.ensure_ready(), Ordering::SeqCst);
    NESTED_INIT_OK.store(CALLS_BACK.initialize().is_ok(), Ordering::SeqCst);
    NESTED_UNAVAILABLE.store(CALLS_BACK.resolve(0x1000) == Resolution::Unavailable, Ordering::SeqCst);
    Ok(SymbolTable::from_entries(vec![SymbolEntry {
        address: 0x1000,
        name: SymbolName::from("outer"),
    }]))
}

#[test]
fn test_source_calling_back_does_not_deadlock() {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(CALLS_BACK.initialize().is_ok());
    });

    let initialized = rx
        .recv_timeout(Duration::from_secs(5))
        .expect("initialize() hung on a nested call from its source");
    assert!(initialized);

    assert!(!NESTED_READY.load(Ordering::SeqCst));
    assert!(!NESTED_INIT_OK.load(Ordering::SeqCst));
    assert!(NESTED_UNAVAILABLE.load(Ordering::SeqCst));

    // The nested calls neither recorded a failure nor started a second build
    assert_eq!(CALLS_BACK.state(), RegistryState::Ready);
    assert_eq!(CALLS_BACK.build_count(), 1);
    let Resolution::Symbol(found) = CALLS_BACK.resolve(0x1004) else {
        panic!("expected a symbol");
    };
    assert_eq!(found.name.to_string(), "outer");
}
