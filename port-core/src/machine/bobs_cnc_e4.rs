//! Bob's CNC E4 router

use super::MachineProfile;
use crate::board::ARDUINO_UNO;
use crate::types::{Axis, AxisMask};

pub const PROFILE: MachineProfile = MachineProfile {
    name: "bobs-cnc-e4",
    board: ARDUINO_UNO,
    steps_per_mm: [80.0, 80.0, 2267.717],
    max_rate: [10000.0, 10000.0, 500.0],
    acceleration: [500.0 * 60.0 * 60.0, 500.0 * 60.0 * 60.0, 300.0 * 60.0 * 60.0],
    max_travel: [610.0, 610.0, 85.0],
    spindle_rpm_max: 1000.0,
    spindle_rpm_min: 0.0,
    step_pulse_us: 5,
    step_invert_mask: AxisMask::NONE,
    dir_invert_mask: AxisMask::NONE,
    stepper_idle_lock_ms: 25,
    // MPos
    status_report_mask: 1,
    junction_deviation: 0.01,
    arc_tolerance: 0.002,
    report_inches: true,
    invert_st_enable: false,
    invert_limit_pins: true,
    soft_limit_enable: true,
    hard_limit_enable: false,
    invert_probe_pin: false,
    laser_mode: false,
    homing_enable: true,
    // X and Y home towards negative
    homing_dir_mask: AxisMask::of(&[Axis::X, Axis::Y]),
    homing_feed_rate: 500.0,
    homing_seek_rate: 4000.0,
    homing_debounce_delay_ms: 250,
    homing_pulloff: 5.0,
};
