//! Step pulse cycles driven through the pulse and reset vectors

use heapless::Vec;

use grbl_port_core::board::ARDUINO_UNO;
use grbl_port_core::clock::{cycles_for_step_rate, TICKS_PER_MILLISECOND};
use grbl_port_core::machine::{bobs_cnc_e4, pocket_nc_fr4, zen_toolworks_7x7, MachineProfile};
use grbl_port_core::test_utils::bench::{Bench, StepEdge, Vector};
use grbl_port_core::{Axis, AxisMask, PortSettings};

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Rising edge times, in cycles
    fn rising_edges(bench: &Bench) -> Vec<u64, 16> {
        bench.step_edges().iter().filter(|e| e.levels != 0).map(|e| e.at).collect()
    }

    fn running_bench(profile: &MachineProfile, axes: &[Axis], period: u32) -> &'static Bench {
        let bench = Bench::install(ARDUINO_UNO, PortSettings::from_profile(profile));
        bench.attach_step_generator();
        bench.axes.set(AxisMask::of(axes));
        bench.p.pulse.configure(period).unwrap();
        bench.p.pulse.start().unwrap();
        bench
    }

    #[test]
    fn test_step_edges_follow_pulse_and_reset() {
        let bench = running_bench(&bobs_cnc_e4::PROFILE, &[Axis::X, Axis::Z], 1200);
        bench.run_until(6100);

        let edges = bench.step_edges();
        assert_eq!(edges.len(), 10);
        // X on D2, Z on D4; 5 us pulse is 6 reset ticks of 8 cycles
        assert_eq!(edges[0], StepEdge { at: 1200, levels: 0b0001_0100 });
        assert_eq!(edges[1], StepEdge { at: 1248, levels: 0 });
        for pair in edges.chunks(2) {
            assert_ne!(pair[0].levels, 0);
            assert_eq!(pair[1].levels, 0);
            assert_eq!(pair[1].at - pair[0].at, 48);
        }
        assert_eq!(bench.p.pulse.fire_count(), 5);
        assert_eq!(bench.p.reset.fire_count(), 5);
    }

    #[rstest]
    #[case(&bobs_cnc_e4::PROFILE, 48)]
    #[case(&pocket_nc_fr4::PROFILE, 128)]
    #[case(&zen_toolworks_7x7::PROFILE, 128)]
    fn test_pulse_width_per_profile(#[case] profile: &'static MachineProfile, #[case] width: u64) {
        let bench = running_bench(profile, &[Axis::Y], 4000);
        bench.run_until(20_000);

        let edges = bench.step_edges();
        assert_eq!(edges.len(), 10);
        for pair in edges.chunks(2) {
            assert_eq!(pair[1].at - pair[0].at, width, "{}", profile.name);
        }
    }

    #[rstest]
    #[case(1_000)]
    #[case(65_536)]
    #[case(100_000)]
    #[case(1_000_000)]
    fn test_pulse_spacing_matches_period(#[case] period: u32) {
        let bench = running_bench(&bobs_cnc_e4::PROFILE, &[Axis::X], period);
        let actual = bench.p.pulse.period().unwrap().cycles() as u64;
        bench.run_until(actual * 4 + 100);

        let rising = rising_edges(bench);
        assert_eq!(rising.len(), 4);
        for pair in rising.windows(2) {
            assert_eq!(pair[1] - pair[0], actual);
        }
        // Prescaled periods lose less than one prescaler tick
        assert!(period as u64 - actual < 64);
    }

    #[test]
    fn test_inverted_step_pulses_low() {
        let mut settings = PortSettings::from_profile(&bobs_cnc_e4::PROFILE);
        settings.step_invert = AxisMask::of(&[Axis::X]);
        let bench = Bench::install(ARDUINO_UNO, settings);
        bench.attach_step_generator();
        bench.axes.set(AxisMask::of(&[Axis::X]));

        // Idle level of an inverted step pin is high
        assert_eq!(bench.p.gpio.read(&ARDUINO_UNO.step), 0b0000_0100);

        bench.p.pulse.configure(2000).unwrap();
        bench.p.pulse.start().unwrap();
        bench.run_until(2100);
        assert_eq!(
            bench.step_edges(),
            vec![StepEdge { at: 2000, levels: 0 }, StepEdge { at: 2048, levels: 0b0000_0100 }]
        );
    }

    #[test]
    fn test_reconfigure_takes_effect_after_cycle_in_flight() {
        let bench = running_bench(&bobs_cnc_e4::PROFILE, &[Axis::X], 1200);
        bench.run_until(1300);
        bench.p.pulse.configure(2400).unwrap();
        bench.run_until(7300);

        assert_eq!(rising_edges(bench).as_slice(), &[1200, 2400, 4800, 7200]);
    }

    #[test]
    fn test_vectors_run_in_priority_order() {
        let bench = running_bench(&bobs_cnc_e4::PROFILE, &[Axis::X], 1200);
        bench.p.debounce.arm();

        assert_eq!(bench.next_vector(), Some((Vector::Pulse, 1200)));
        bench.run_vectors(1);
        assert_eq!(bench.next_vector(), Some((Vector::Reset, 1248)));
        bench.run_vectors(1);
        assert_eq!(bench.next_vector(), Some((Vector::Pulse, 2400)));
    }

    #[test]
    fn test_bobs_cnc_full_feed_for_ten_milliseconds() {
        println!("\n=== Bob's CNC E4, X at 10000 mm/min ===");
        let profile = &bobs_cnc_e4::PROFILE;
        let period = cycles_for_step_rate(profile.steps_per_mm[0] * profile.max_rate[0] / 60.0);
        assert_eq!(period, 1200);

        let bench = running_bench(profile, &[Axis::X], period);
        bench.run_until(10 * TICKS_PER_MILLISECOND as u64);

        // 160000 cycles / 1200 per step
        assert_eq!(bench.p.pulse.fire_count(), 133);
        assert_eq!(bench.p.reset.fire_count(), 133);
        assert_eq!(bench.step_edges().len(), 266);
        println!("✓ {} steps, last edge at cycle {}", bench.p.pulse.fire_count(), bench.step_edges()[265].at);
    }

    #[test]
    fn test_stop_lets_last_pulse_finish() {
        let bench = running_bench(&bobs_cnc_e4::PROFILE, &[Axis::Z], 1200);
        bench.run_vectors(1);
        bench.p.pulse.stop();

        // The reset still ends the pulse in flight
        bench.run_until(5000);
        let edges = bench.step_edges();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[1].levels, 0);
        assert_eq!(bench.p.pulse.fire_count(), 1);
    }
}
