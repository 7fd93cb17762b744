//! Test utilities for the port layer

#[cfg(feature = "test-utils")]
pub mod bench {
    //! Event-driven test bench running the simulated back-end in virtual time

    use crate::hal::mock::{earliest, SimClock, SimHal};
    use crate::peripherals::Peripherals;
    use crate::ports::PortMap;
    use crate::settings::PortSettings;
    use crate::types::AxisMask;
    use std::cell::{Cell, RefCell};
    use std::vec::Vec;

    pub type SimPeripherals = Peripherals<SimHal<'static>>;

    /// Interrupt sources of the simulated back-end, in vector priority order
    #[derive(Copy, Clone, PartialEq, Eq, Debug)]
    pub enum Vector {
        Pulse,
        Reset,
        Debounce,
    }

    /// A change of the STEP group's pin levels
    #[derive(Copy, Clone, PartialEq, Eq, Debug)]
    pub struct StepEdge {
        pub at: u64,
        pub levels: u8,
    }

    /// Simulated machine: clock, peripherals, wiring and settings
    pub struct Bench {
        pub clock: &'static SimClock,
        pub p: SimPeripherals,
        pub map: PortMap,
        pub settings: PortSettings,
        /// Axes stepped on each pulse
        pub axes: Cell<AxisMask>,
        edges: RefCell<Vec<StepEdge>>,
        last_levels: Cell<u8>,
    }

    std::thread_local! {
        static CURRENT: Cell<Option<&'static Bench>> = const { Cell::new(None) };
    }

    impl Bench {
        /// Build and initialise a bench, make it current for this thread.
        ///
        /// The bench is leaked so interrupt callbacks, which are plain
        /// `fn()`, can reach it through [`Bench::current`].
        pub fn install(map: PortMap, settings: PortSettings) -> &'static Bench {
            let clock: &'static SimClock = Box::leak(Box::new(SimClock::new()));
            let p = Peripherals::new(SimHal::new(clock));
            p.init(&map, &settings).expect("bench settings must be valid");
            let idle = p.gpio.read(&map.step);
            let bench: &'static Bench = Box::leak(Box::new(Bench {
                clock,
                p,
                map,
                settings,
                axes: Cell::new(AxisMask::NONE),
                edges: RefCell::new(Vec::new()),
                last_levels: Cell::new(idle),
            }));
            CURRENT.with(|c| c.set(Some(bench)));
            bench
        }

        /// The bench installed on this thread
        pub fn current() -> &'static Bench {
            CURRENT.with(|c| c.get()).expect("no bench installed on this thread")
        }

        /// Wire the step-generator stand-in: pulse asserts STEP and arms the
        /// reset, reset deasserts STEP
        pub fn attach_step_generator(&self) {
            self.p.pulse.register_callback(step_pulse);
            self.p.reset.register_callback(step_reset);
        }

        /// The next vector to run and when
        pub fn next_vector(&self) -> Option<(Vector, u64)> {
            let deadlines = [
                self.p.pulse.hardware().next_expiry(),
                self.p.reset.hardware().next_expiry(),
                self.p.debounce.hardware().next_expiry(),
            ];
            earliest(&deadlines).map(|(i, at)| {
                let vector = match i {
                    0 => Vector::Pulse,
                    1 => Vector::Reset,
                    _ => Vector::Debounce,
                };
                (vector, at)
            })
        }

        /// Move the clock to `at` and run `vector`
        pub fn dispatch(&self, vector: Vector, at: u64) {
            self.clock.set(at);
            match vector {
                Vector::Pulse => self.p.pulse.on_interrupt(),
                Vector::Reset => self.p.reset.on_interrupt(),
                Vector::Debounce => self.p.debounce.on_interrupt(),
            }
            self.record_step_levels();
        }

        /// Run every vector due up to `until`, then park the clock there.
        /// Returns the number of vectors run.
        pub fn run_until(&self, until: u64) -> usize {
            let mut count = 0;
            while let Some((vector, at)) = self.next_vector() {
                if at > until {
                    break;
                }
                self.dispatch(vector, at);
                count += 1;
            }
            self.clock.set(until.max(self.clock.now()));
            count
        }

        /// Run the next `count` vectors
        pub fn run_vectors(&self, count: usize) -> usize {
            let mut ran = 0;
            while ran < count {
                match self.next_vector() {
                    Some((vector, at)) => self.dispatch(vector, at),
                    None => break,
                }
                ran += 1;
            }
            ran
        }

        fn record_step_levels(&self) {
            let levels = self.p.gpio.read(&self.map.step);
            if levels != self.last_levels.get() {
                self.last_levels.set(levels);
                self.edges.borrow_mut().push(StepEdge { at: self.clock.now(), levels });
            }
        }

        /// STEP level changes seen so far
        pub fn step_edges(&self) -> Vec<StepEdge> {
            self.edges.borrow().clone()
        }
    }

    fn step_pulse() {
        let bench = Bench::current();
        let invert = bench.settings.step_invert_bits(&bench.map);
        let bits = bench.map.step.spread(bench.axes.get());
        bench.p.gpio.write_logical(&bench.map.step, bits, invert);
        bench.p.reset.arm(bench.settings.reset_ticks());
    }

    fn step_reset() {
        let bench = Bench::current();
        let invert = bench.settings.step_invert_bits(&bench.map);
        bench.p.gpio.write_logical(&bench.map.step, 0, invert);
    }
}
