// Cost simulation hooks. The harness plugs one in to make a worker look
// slower or burstier than it is; the ring itself never depends on it.

/// Work a producer or consumer performs before each write / read cycle.
pub trait CostModel: Send + Sync {
    fn spend(&self);
}

/// No simulated cost.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCost;

impl CostModel for NoCost {
    #[inline]
    fn spend(&self) {}
}

/// A fixed number of busy-wait iterations.
#[derive(Debug, Clone, Copy)]
pub struct Spin(pub u32);

impl CostModel for Spin {
    #[inline]
    fn spend(&self) {
        spin_for(self.0);
    }
}

/// A uniformly random number of busy-wait iterations in `0..=max`.
#[derive(Debug, Clone, Copy)]
pub struct Jitter {
    pub max: u32,
}

impl Jitter {
    pub fn new(max: u32) -> Self {
        Self { max }
    }
}

impl CostModel for Jitter {
    fn spend(&self) {
        spin_for(fastrand::u32(0..=self.max));
    }
}

impl<F> CostModel for F
where
    F: Fn() + Send + Sync,
{
    #[inline]
    fn spend(&self) {
        self()
    }
}

#[inline]
fn spin_for(iterations: u32) {
    for _ in 0..iterations {
        std::hint::spin_loop();
    }
}
