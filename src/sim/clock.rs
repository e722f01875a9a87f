/// Fixed-resolution simulation clock over a horizon of ticks.
///
/// Each tick stands for `tick_minutes` of simulated time.
///
/// # Examples
///
/// ```
/// use swap_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new(3, 5);
/// let mut ticks = Vec::new();
///
/// clock.run(|tick| ticks.push(tick));
/// assert_eq!(ticks, vec![0, 1, 2]);
/// assert_eq!(clock.elapsed_minutes(), 15);
/// ```
#[derive(Debug, Clone)]
pub struct Clock {
    /// Next tick to be processed
    current: usize,
    /// Horizon in ticks
    total: usize,
    tick_minutes: u32,
}

impl Clock {
    /// Creates a clock for `total` ticks of `tick_minutes` each.
    pub fn new(total: usize, tick_minutes: u32) -> Self {
        Self {
            current: 0,
            total,
            tick_minutes,
        }
    }

    /// Index of the next tick to be processed.
    pub fn now(&self) -> usize {
        self.current
    }

    pub fn horizon(&self) -> usize {
        self.total
    }

    pub fn is_finished(&self) -> bool {
        self.current >= self.total
    }

    /// Simulated minutes covered by the ticks already processed.
    pub fn elapsed_minutes(&self) -> u64 {
        self.current as u64 * u64::from(self.tick_minutes)
    }

    /// Advances the clock by one tick.
    ///
    /// # Returns
    ///
    /// * `Some(tick)` - The tick being processed (starting from 0)
    /// * `None` - If the horizon has been reached
    pub fn tick(&mut self) -> Option<usize> {
        if self.current < self.total {
            let tick = self.current;
            self.current += 1;
            Some(tick)
        } else {
            None
        }
    }

    /// Runs a function for each remaining tick.
    pub fn run(&mut self, mut f: impl FnMut(usize)) {
        while let Some(tick) = self.tick() {
            f(tick);
        }
    }
}
