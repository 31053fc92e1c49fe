use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// Integer format represents time using 10,000,000 ticks per second.
pub const TICKS_PER_SECOND: u64 = 10_000_000;

pub fn ticks_to_seconds(ticks: u64) -> f64 {
    ticks as f64 / TICKS_PER_SECOND as f64
}

pub fn seconds_to_ticks(seconds: f64) -> u64 {
    (seconds * TICKS_PER_SECOND as f64) as u64
}

/// Monotonic high resolution counter the `StepTimer` samples
pub trait Clock {
    /// Counts per second
    fn get_frequency(&self) -> u64;
    fn get_counter(&self) -> u64;
}

/// Reads `std::time::Instant` as a nanosecond counter
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn get_frequency(&self) -> u64 {
        1_000_000_000
    }

    fn get_counter(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
}

/// Clock advanced by hand, clones share the same counter
#[derive(Clone)]
pub struct ManualClock {
    frequency: u64,
    counter: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(frequency: u64) -> Self {
        ManualClock {
            frequency,
            counter: Rc::new(Cell::new(0)),
        }
    }

    pub fn advance(&self, counts: u64) {
        self.counter.set(self.counter.get() + counts);
    }

    pub fn advance_seconds(&self, seconds: f64) {
        self.advance((seconds * self.frequency as f64).round() as u64);
    }
}

impl Clock for ManualClock {
    fn get_frequency(&self) -> u64 {
        self.frequency
    }

    fn get_counter(&self) -> u64 {
        self.counter.get()
    }
}

/// Animation and simulation timing, runs updates either once per tick with the
/// measured delta or a whole number of times with a fixed delta
pub struct StepTimer<C: Clock = SystemClock> {
    clock: C,
    // source timing data uses clock counts
    qpc_frequency: u64,
    qpc_last_time: u64,
    qpc_max_delta: u64,
    // derived timing data uses a canonical tick format
    elapsed_ticks: u64,
    total_ticks: u64,
    left_over_ticks: u64,
    // tracking the framerate
    frame_count: u32,
    frames_per_second: u32,
    frames_this_second: u32,
    qpc_second_counter: u64,
    // configuring fixed timestep mode
    is_fixed_time_step: bool,
    target_elapsed_ticks: u64,
}

impl StepTimer<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock::new())
    }
}

impl Default for StepTimer<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> StepTimer<C> {
    pub fn with_clock(clock: C) -> Self {
        let qpc_frequency = clock.get_frequency().max(1);
        let qpc_last_time = clock.get_counter();
        StepTimer {
            clock,
            qpc_frequency,
            qpc_last_time,
            // max delta is 1/10 of a second
            qpc_max_delta: qpc_frequency / 10,
            elapsed_ticks: 0,
            total_ticks: 0,
            left_over_ticks: 0,
            frame_count: 0,
            frames_per_second: 0,
            frames_this_second: 0,
            qpc_second_counter: 0,
            is_fixed_time_step: false,
            target_elapsed_ticks: TICKS_PER_SECOND / 60,
        }
    }

    /// Elapsed time since the previous update
    pub fn get_elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }

    pub fn get_elapsed_seconds(&self) -> f64 {
        ticks_to_seconds(self.elapsed_ticks)
    }

    /// Total time since the start of the program
    pub fn get_total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn get_total_seconds(&self) -> f64 {
        ticks_to_seconds(self.total_ticks)
    }

    /// Total number of updates since start of the program
    pub fn get_frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Current framerate, counted over the last whole second
    pub fn get_frames_per_second(&self) -> u32 {
        self.frames_per_second
    }

    pub fn is_fixed_time_step(&self) -> bool {
        self.is_fixed_time_step
    }

    pub fn set_fixed_time_step(&mut self, is_fixed_timestep: bool) {
        self.is_fixed_time_step = is_fixed_timestep;
    }

    /// How often to call update when in fixed timestep mode
    pub fn set_target_elapsed_ticks(&mut self, target_elapsed: u64) {
        self.target_elapsed_ticks = target_elapsed;
    }

    pub fn set_target_elapsed_seconds(&mut self, target_elapsed: f64) {
        self.target_elapsed_ticks = seconds_to_ticks(target_elapsed);
    }

    pub fn get_target_elapsed_ticks(&self) -> u64 {
        self.target_elapsed_ticks
    }

    /// Call after an intentional timing discontinuity (eg. a blocking io operation)
    /// to avoid having the fixed timestep logic attempt a set of catch-up updates
    pub fn reset_elapsed_time(&mut self) {
        self.qpc_last_time = self.clock.get_counter();
        self.left_over_ticks = 0;
        self.frames_per_second = 0;
        self.frames_this_second = 0;
        self.qpc_second_counter = 0;
    }

    /// Samples the clock and runs `update` the appropriate number of times.
    /// The timer is fully updated before each call so `update` can read the current values.
    pub fn tick<F: FnMut(&Self)>(&mut self, mut update: F) {
        let current_time = self.clock.get_counter();
        let mut time_delta = current_time.saturating_sub(self.qpc_last_time);

        self.qpc_last_time = current_time;
        self.qpc_second_counter += time_delta;

        // clamp excessively large time deltas (eg. after paused in the debugger)
        if time_delta > self.qpc_max_delta {
            time_delta = self.qpc_max_delta;
        }

        // convert counts to the canonical tick format, cannot overflow due to the clamp above
        time_delta = time_delta * TICKS_PER_SECOND / self.qpc_frequency;

        let last_frame_count = self.frame_count;

        if self.is_fixed_time_step {
            // if the app is running very close to the target elapsed time (within 1/4 of a millisecond)
            // just clamp the clock to exactly match the target value. prevents tiny and irrelevant
            // errors from accumulating over time, eg. a 59.94 NTSC display with vsync at 60 fps
            // would otherwise accumulate enough error to drop a frame
            if time_delta.abs_diff(self.target_elapsed_ticks) < TICKS_PER_SECOND / 4000 {
                time_delta = self.target_elapsed_ticks;
            }

            self.left_over_ticks += time_delta;

            if self.target_elapsed_ticks > 0 {
                while self.left_over_ticks >= self.target_elapsed_ticks {
                    self.elapsed_ticks = self.target_elapsed_ticks;
                    self.total_ticks += self.target_elapsed_ticks;
                    self.left_over_ticks -= self.target_elapsed_ticks;
                    self.frame_count += 1;

                    update(self);
                }
            }
        }
        else {
            // variable timestep update logic
            self.elapsed_ticks = time_delta;
            self.total_ticks += time_delta;
            self.left_over_ticks = 0;
            self.frame_count += 1;

            update(self);
        }

        // track the current framerate
        if self.frame_count != last_frame_count {
            self.frames_this_second += 1;
        }

        if self.qpc_second_counter >= self.qpc_frequency {
            self.frames_per_second = self.frames_this_second;
            self.frames_this_second = 0;
            self.qpc_second_counter %= self.qpc_frequency;
        }
    }
}
