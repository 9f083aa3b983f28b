//! Lock, interrupt and busy-poll handling around a started transform.

mod common;

use std::time::{Duration, Instant};

use common::*;
use shveu::regs::{Register, VEVTR_ACK};
use shveu::{BackendEvent, HardwareVariant, Rotation, VeuConfig};

use BackendEvent::{Lock, Sleep, Unlock};

#[test]
fn test_wait_releases_lock_after_interrupt() {
    let mut veu = open_file_backed(FileBackend::new(HardwareVariant::Veu3f), &VeuConfig::default());

    let started = veu
        .program_transform(&nv12(720, 480), &nv12(360, 240), Rotation::None)
        .unwrap();
    started.wait_for_completion().unwrap();

    assert_eq!(veu.backend().events(), &[Lock, Sleep, Unlock]);
    assert_eq!(veu.window().read(Register::Vevtr).unwrap(), VEVTR_ACK);
    assert_eq!(veu.window().read(Register::Vstar).unwrap(), 0);
}

#[test]
fn test_consecutive_transforms_pair_lock_and_unlock() {
    let mut veu = open_file_backed(FileBackend::new(HardwareVariant::Veu2h), &VeuConfig::default());

    for _ in 0..3 {
        veu.rescale(&nv12(720, 480), &nv12(360, 240)).unwrap();
    }

    let events = veu.backend().events();
    assert_eq!(events.len(), 9);
    for triple in events.chunks(3) {
        assert_eq!(triple, &[Lock, Sleep, Unlock]);
    }
}

#[test]
fn test_dropping_transform_waits_and_unlocks() {
    let mut veu = open_file_backed(FileBackend::new(HardwareVariant::Veu3f), &VeuConfig::default());

    drop(
        veu.program_transform(&nv12(720, 480), &nv12(720, 480), Rotation::None)
            .unwrap(),
    );

    assert_eq!(veu.backend().events(), &[Lock, Sleep, Unlock]);
    assert_eq!(veu.window().read(Register::Vstar).unwrap(), 0);
}

#[test]
fn test_stuck_engine_times_out_and_unlocks() {
    let config = VeuConfig::default().with_hang_timeout(Duration::from_millis(20));
    let mut veu = open_file_backed(FileBackend::stuck(HardwareVariant::Veu3f), &config);

    let begin = Instant::now();
    let err = veu.rescale(&nv12(720, 480), &nv12(360, 240)).unwrap_err();

    assert_eq!(err.category(), "hang");
    assert!(begin.elapsed() >= Duration::from_millis(20));
    assert_eq!(veu.backend().events(), &[Lock, Sleep, Unlock]);
}

#[test]
fn test_engine_usable_after_timeout() {
    let config = VeuConfig::default().with_hang_timeout(Duration::from_millis(5));
    let mut veu = open_file_backed(FileBackend::stuck(HardwareVariant::Veu3f), &config);

    assert!(veu.rescale(&nv12(720, 480), &nv12(360, 240)).is_err());
    assert!(veu.rescale(&nv12(720, 480), &nv12(360, 240)).is_err());
    assert_eq!(
        veu.backend().events(),
        &[Lock, Sleep, Unlock, Lock, Sleep, Unlock]
    );
}

#[test]
fn test_validation_error_takes_no_lock() {
    let mut veu = open_file_backed(FileBackend::new(HardwareVariant::Veu3f), &VeuConfig::default());

    assert!(veu.rescale(&nv12(8, 8), &nv12(8, 8)).is_err());
    assert!(veu.backend().events().is_empty());
    assert!(untouched(&veu));
}

#[test]
fn test_close_after_transform() {
    let mut veu = open_file_backed(FileBackend::new(HardwareVariant::Veu), &VeuConfig::default());
    veu.rescale(&nv12(720, 480), &nv12(720, 480)).unwrap();
    assert_eq!(veu.variant(), HardwareVariant::Veu);
    veu.close();
}
