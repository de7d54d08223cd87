//! Chaos tests for rotation racing with readers
//!
//! Readers must always observe a whole ring state: a contiguous run of
//! sequence numbers, newest first, never longer than the capacity.

use secret_ring::KeyringError;
use secret_ring_test_utils::{test_ring, test_service, TestPayloadBuilder};
use std::sync::atomic::{AtomicBool, Ordering};

const CAPACITY: usize = 3;
const ROTATIONS: usize = 500;
const READERS: usize = 4;

#[test]
fn test_snapshots_are_never_torn() -> Result<(), anyhow::Error> {
    let ring = test_ring(CAPACITY);
    ring.rotate()?;
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| -> Result<(), anyhow::Error> {
        let mut readers = Vec::new();
        for _ in 0..READERS {
            readers.push(scope.spawn(|| {
                let mut last_newest = 0;
                while !done.load(Ordering::SeqCst) {
                    let snapshot = ring.active_secrets();
                    assert!(!snapshot.is_empty() && snapshot.len() <= CAPACITY);

                    let sequences: Vec<u64> = snapshot.iter().map(|s| s.sequence()).collect();
                    for pair in sequences.windows(2) {
                        assert_eq!(pair[0], pair[1] + 1, "torn snapshot: {sequences:?}");
                    }

                    let newest = sequences[0];
                    assert!(newest >= last_newest, "newest secret went backwards");
                    last_newest = newest;
                }
            }));
        }

        for _ in 0..ROTATIONS {
            ring.rotate()?;
        }
        done.store(true, Ordering::SeqCst);

        for reader in readers {
            reader
                .join()
                .map_err(|_| anyhow::anyhow!("reader thread panicked"))?;
        }
        Ok(())
    })?;

    assert_eq!(ring.len(), CAPACITY);
    assert_eq!(ring.current()?.sequence(), (ROTATIONS + 1) as u64);

    Ok(())
}

#[test]
fn test_verification_during_rotation_never_errors_unexpectedly() -> Result<(), anyhow::Error> {
    let service = test_service(CAPACITY, 300);
    service.ring().rotate()?;
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| -> Result<(), anyhow::Error> {
        let mut workers = Vec::new();
        for user in 0..READERS {
            let service = &service;
            let done = &done;
            workers.push(scope.spawn(move || {
                let payload = TestPayloadBuilder::new().for_user(user as u64).build();
                while !done.load(Ordering::SeqCst) {
                    let token = service.sign(&payload).expect("ring is never empty");
                    match service.verify(&token) {
                        Ok(claims) => assert_eq!(claims.payload, payload),
                        // Enough rotations may land between sign and verify
                        // to evict the signing secret.
                        Err(e) => assert_eq!(e, KeyringError::TokenInvalid),
                    }
                }
            }));
        }

        for _ in 0..ROTATIONS {
            service.ring().rotate()?;
        }
        done.store(true, Ordering::SeqCst);

        for worker in workers {
            worker
                .join()
                .map_err(|_| anyhow::anyhow!("worker thread panicked"))?;
        }
        Ok(())
    })?;

    Ok(())
}

#[test]
fn test_concurrent_rotations_assign_unique_sequences() -> Result<(), anyhow::Error> {
    let ring = test_ring(CAPACITY);
    let ring = &ring;
    let per_thread = ROTATIONS / READERS;

    let mut sequences: Vec<u64> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..READERS)
            .map(|_| {
                scope.spawn(move || {
                    (0..per_thread)
                        .map(|_| ring.rotate().map(|s| s.sequence()))
                        .collect::<Result<Vec<_>, KeyringError>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().map_err(|_| anyhow::anyhow!("rotator panicked")))
            .collect::<Result<Vec<_>, _>>()
    })?
    .into_iter()
    .collect::<Result<Vec<_>, _>>()?
    .into_iter()
    .flatten()
    .collect();

    sequences.sort_unstable();
    let expected: Vec<u64> = (1..=(per_thread * READERS) as u64).collect();
    assert_eq!(sequences, expected);

    Ok(())
}
