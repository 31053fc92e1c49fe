use dive_rs::*;

use timer::{ManualClock, StepTimer, TICKS_PER_SECOND};

fn create_timer() -> (StepTimer<ManualClock>, ManualClock) {
    let clock = ManualClock::new(TICKS_PER_SECOND);
    (StepTimer::with_clock(clock.clone()), clock)
}

fn count_updates(timer: &mut StepTimer<ManualClock>) -> u32 {
    let mut updates = 0;
    timer.tick(|_| updates += 1);
    updates
}

#[test]
fn conversions() {
    assert_eq!(timer::ticks_to_seconds(TICKS_PER_SECOND), 1.0);
    assert_eq!(timer::ticks_to_seconds(TICKS_PER_SECOND / 2), 0.5);
    assert_eq!(timer::seconds_to_ticks(0.25), TICKS_PER_SECOND / 4);
}

#[test]
fn variable_step_updates_once_per_tick() {
    let (mut timer, clock) = create_timer();
    assert_eq!(timer.get_frame_count(), 0);

    clock.advance_seconds(0.02);
    assert_eq!(count_updates(&mut timer), 1);
    assert_eq!(timer.get_elapsed_ticks(), 200_000);
    assert_eq!(timer.get_total_ticks(), 200_000);
    assert_eq!(timer.get_frame_count(), 1);

    // a tick with no time passed still updates
    assert_eq!(count_updates(&mut timer), 1);
    assert_eq!(timer.get_elapsed_ticks(), 0);
    assert_eq!(timer.get_total_ticks(), 200_000);
    assert_eq!(timer.get_frame_count(), 2);
}

#[test]
fn large_deltas_are_clamped() {
    let (mut timer, clock) = create_timer();
    clock.advance_seconds(5.0);
    timer.tick(|_| ());
    assert_eq!(timer.get_elapsed_ticks(), TICKS_PER_SECOND / 10);
    assert_eq!(timer.get_elapsed_seconds(), 0.1);
}

#[test]
fn clock_frequency_is_converted_to_ticks() {
    let clock = ManualClock::new(1000);
    let mut timer = StepTimer::with_clock(clock.clone());
    clock.advance(50);
    timer.tick(|_| ());
    assert_eq!(timer.get_elapsed_ticks(), TICKS_PER_SECOND / 20);
}

#[test]
fn fixed_step_snaps_to_target() {
    let (mut timer, clock) = create_timer();
    timer.set_fixed_time_step(true);
    timer.set_target_elapsed_seconds(1.0 / 60.0);
    assert!(timer.is_fixed_time_step());
    assert_eq!(timer.get_target_elapsed_ticks(), TICKS_PER_SECOND / 60);

    // 16.7ms is within a quarter millisecond of the target
    clock.advance_seconds(0.0167);
    assert_eq!(count_updates(&mut timer), 1);
    assert_eq!(timer.get_elapsed_ticks(), TICKS_PER_SECOND / 60);
    assert_eq!(timer.get_total_ticks(), TICKS_PER_SECOND / 60);

    // nothing left over after the snap
    assert_eq!(count_updates(&mut timer), 0);
    assert_eq!(timer.get_frame_count(), 1);
}

#[test]
fn fixed_step_waits_for_a_whole_step() {
    let (mut timer, clock) = create_timer();
    timer.set_fixed_time_step(true);
    timer.set_target_elapsed_seconds(1.0 / 60.0);

    clock.advance_seconds(0.01);
    assert_eq!(count_updates(&mut timer), 0);
    assert_eq!(timer.get_frame_count(), 0);

    clock.advance_seconds(0.01);
    assert_eq!(count_updates(&mut timer), 1);
    assert_eq!(timer.get_frame_count(), 1);
}

#[test]
fn fixed_step_catches_up() {
    let (mut timer, clock) = create_timer();
    timer.set_fixed_time_step(true);
    timer.set_target_elapsed_seconds(1.0 / 60.0);

    clock.advance_seconds(0.05);
    let mut totals = Vec::new();
    timer.tick(|t| totals.push(t.get_total_ticks()));

    let step = TICKS_PER_SECOND / 60;
    assert_eq!(totals, vec![step, step * 2, step * 3]);
    assert_eq!(timer.get_elapsed_ticks(), step);
    assert_eq!(timer.get_frame_count(), 3);
}

#[test]
fn reset_elapsed_time_drops_left_over() {
    let (mut timer, clock) = create_timer();
    timer.set_fixed_time_step(true);
    timer.set_target_elapsed_seconds(1.0 / 60.0);

    clock.advance_seconds(0.01);
    assert_eq!(count_updates(&mut timer), 0);

    // a long blocking load, none of it is simulated
    clock.advance_seconds(2.0);
    timer.reset_elapsed_time();

    clock.advance_seconds(0.01);
    assert_eq!(count_updates(&mut timer), 0);
    assert_eq!(timer.get_total_ticks(), 0);
}

#[test]
fn frames_per_second() {
    let (mut timer, clock) = create_timer();
    for _ in 0..4 {
        assert_eq!(timer.get_frames_per_second(), 0);
        clock.advance_seconds(0.25);
        timer.tick(|_| ());
    }
    assert_eq!(timer.get_frames_per_second(), 4);
}

#[test]
fn update_sees_current_values() {
    let (mut timer, clock) = create_timer();
    clock.advance_seconds(0.05);
    let mut seen = None;
    timer.tick(|t| seen = Some((t.get_frame_count(), t.get_elapsed_ticks(), t.get_total_seconds())));
    assert_eq!(seen, Some((1, 500_000, 0.05)));
}
